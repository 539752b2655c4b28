//! Exhaustive scans over a [`MetadataIndex`].
//!
//! `scan_pages` walks the store page by page, `scan` flattens that into a
//! lazy record stream, and `scan_all` drains the stream into a `Vec`. All
//! three stop only when the store reports no further page, and a failed
//! page ends the scan with that error.

use std::collections::HashSet;

use futures::stream::{self, Stream, TryStreamExt};

use super::{IndexError, IndexRecord, MetadataIndex, Result, ScanCursor};

#[derive(Default)]
struct ScanState {
    start: Option<ScanCursor>,
    /// Every cursor handed out so far in this scan.
    seen: HashSet<String>,
    done: bool,
}

/// Lazily fetch every page of the index, in store order.
///
/// Fails with [`IndexError::ScanStalled`] as soon as the store returns a
/// cursor it already returned earlier in the same scan.
pub fn scan_pages<'a>(
    index: &'a dyn MetadataIndex,
) -> impl Stream<Item = Result<Vec<IndexRecord>>> + Send + 'a {
    stream::try_unfold(ScanState::default(), move |mut state| async move {
        if state.done {
            return Ok(None);
        }

        let page = index.scan_page(state.start.take()).await?;

        match page.next {
            Some(next) => {
                if !state.seen.insert(next.0.clone()) {
                    return Err(IndexError::ScanStalled(next.0));
                }
                state.start = Some(next);
            }
            None => state.done = true,
        }

        Ok(Some((page.records, state)))
    })
}

/// Lazily yield every record in the index. Finite; not restartable.
pub fn scan<'a>(
    index: &'a dyn MetadataIndex,
) -> impl Stream<Item = Result<IndexRecord>> + Send + 'a {
    scan_pages(index)
        .map_ok(|records| stream::iter(records.into_iter().map(Ok)))
        .try_flatten()
}

/// Read every record in the index, concatenating pages in order.
pub async fn scan_all(index: &dyn MetadataIndex) -> Result<Vec<IndexRecord>> {
    scan(index).try_collect().await
}

/// Count the records in the index without holding them all.
pub async fn count(index: &dyn MetadataIndex) -> Result<usize> {
    scan_pages(index)
        .try_fold(0, |total, page| async move { Ok::<_, IndexError>(total + page.len()) })
        .await
}
