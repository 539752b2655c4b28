//! Filesystem-based object archive.
//!
//! Stores objects as files directly under a base directory:
//! ```text
//! {base_path}/
//!   {encoded key}
//! ```
//!
//! Keys are arbitrary strings. Each key is percent-encoded into a single
//! file name, so `/`, `..` and NUL never reach the filesystem as path
//! syntax. Bytes outside `[A-Za-z0-9._-]` become `%XX`, as does a leading
//! `.`. Typical keys such as `imp-1.json` are stored unchanged.
//!
//! Encoded names longer than one path component allows are split into
//! directories whose names end in `~`. Encoded names never contain `~`, so
//! split directories cannot collide with stored files.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use super::{ArchiveError, ArchiveType, ObjectArchive, Result};

/// Longest encoded name written as a single component. Leaves room under
/// the usual 255-byte component limit for the temp-file suffix.
const MAX_NAME_BYTES: usize = 200;
/// Length of each directory component when a name has to be split.
const SPLIT_NAME_BYTES: usize = 150;
/// Marks split directories and temp files; never produced by encoding.
const MARKER: char = '~';

/// Filesystem-based object archive.
pub struct FilesystemObjectArchive {
    base_path: PathBuf,
    temp_counter: AtomicU64,
}

impl FilesystemObjectArchive {
    /// Create a new filesystem archive.
    ///
    /// Creates the base directory if it doesn't exist.
    pub async fn new(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).await?;
        Ok(Self {
            base_path,
            temp_counter: AtomicU64::new(0),
        })
    }

    /// Path under the base directory where `key` is stored.
    pub fn path_for_key(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() {
            return Err(ArchiveError::InvalidKey("empty key".to_string()));
        }
        Ok(self.base_path.join(relative_path(&encode_key(key))))
    }

    fn temp_path_for(&self, path: &Path) -> PathBuf {
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!(
            ".{}{}{}.{}.tmp",
            name,
            MARKER,
            std::process::id(),
            n
        ))
    }
}

fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for (i, byte) in key.bytes().enumerate() {
        let keep = byte.is_ascii_alphanumeric()
            || byte == b'-'
            || byte == b'_'
            || (byte == b'.' && i > 0);
        if keep {
            encoded.push(byte as char);
        } else {
            let _ = write!(encoded, "%{:02X}", byte);
        }
    }
    encoded
}

/// Split an encoded name into path components of bounded length.
///
/// The final component is always longer than `MAX_NAME_BYTES -
/// SPLIT_NAME_BYTES`, so it can never be `.` or `..`.
fn relative_path(encoded: &str) -> PathBuf {
    let mut path = PathBuf::new();
    let mut rest = encoded;
    while rest.len() > MAX_NAME_BYTES {
        let bytes = rest.as_bytes();
        let mut split = SPLIT_NAME_BYTES;
        // Keep `%XX` escapes whole.
        while bytes[split - 1] == b'%' || bytes[split - 2] == b'%' {
            split -= 1;
        }
        path.push(format!("{}{}", &rest[..split], MARKER));
        rest = &rest[split..];
    }
    path.push(rest);
    path
}

#[async_trait]
impl ObjectArchive for FilesystemObjectArchive {
    async fn put(&self, key: &str, payload: Vec<u8>) -> Result<()> {
        let path = self.path_for_key(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write atomically using temp file + rename
        let temp_path = self.temp_path_for(&path);
        let size = payload.len();
        let written = match fs::write(&temp_path, payload).await {
            Ok(()) => fs::rename(&temp_path, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        debug!(key = %key, size, path = %path.display(), "Stored object");
        Ok(())
    }

    fn archive_type(&self) -> ArchiveType {
        ArchiveType::Filesystem
    }
}
