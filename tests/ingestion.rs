//! End-to-end ingestion tests against locally constructed backends.
//!
//! Run with: cargo test --test ingestion
//!
//! Uses a filesystem archive under a temp directory and the in-memory
//! index, both built through the configuration factories.

use std::path::Path;

use tempfile::TempDir;

use impressions::archive::{init_archive, ArchiveConfig, ArchiveType, FilesystemArchiveConfig};
use impressions::config::Config;
use impressions::index::{init_index, IndexConfig, IndexType, MemoryIndexConfig};
use impressions::model::DEFAULT_LOCATION;
use impressions::{ImpressionRequest, ImpressionService, IngestError};

async fn service_in(dir: &Path, page_size: usize) -> ImpressionService {
    let config = Config {
        archive: ArchiveConfig {
            archive_type: ArchiveType::Filesystem,
            filesystem: FilesystemArchiveConfig {
                base_path: dir.to_path_buf(),
            },
            ..Default::default()
        },
        index: IndexConfig {
            index_type: IndexType::Memory,
            memory: MemoryIndexConfig { page_size },
            ..Default::default()
        },
        ..Default::default()
    };

    let archive = init_archive(&config.archive).await.unwrap();
    let index = init_index(&config.index).await.unwrap();
    ImpressionService::new(archive, index)
}

fn request(id: &str, location: Option<&str>) -> ImpressionRequest {
    ImpressionRequest {
        impression_id: Some(id.to_string()),
        campaign_id: Some("camp-9".to_string()),
        timestamp: Some("2024-01-01T00:00:00Z".to_string()),
        location: location.map(String::from),
    }
}

#[tokio::test]
async fn test_recorded_impression_is_archived_and_listed() {
    let dir = TempDir::new().unwrap();
    let service = service_in(dir.path(), 100).await;

    service.record(request("imp-1", Some(""))).await.unwrap();

    let body = std::fs::read(dir.path().join("imp-1.json")).unwrap();
    let archived: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(archived["ImpressionId"], "imp-1");
    assert_eq!(archived["CampaignId"], "camp-9");
    assert_eq!(archived["Timestamp"], "2024-01-01T00:00:00Z");

    let listed = service.list_all().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].location.as_deref(), Some(DEFAULT_LOCATION));
}

#[tokio::test]
async fn test_invalid_request_writes_no_files() {
    let dir = TempDir::new().unwrap();
    let service = service_in(dir.path(), 100).await;

    let result = service
        .record(ImpressionRequest {
            timestamp: Some("yesterday".to_string()),
            ..request("imp-1", None)
        })
        .await;

    assert!(matches!(result, Err(IngestError::Validation(_))));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    assert!(service.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_ids_with_path_syntax_are_recorded_inside_archive() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("objects");
    let service = service_in(&base, 100).await;

    for id in ["../x", "a/../b", "/abs", "x", "x.json/y"] {
        service.record(request(id, None)).await.unwrap();
    }

    let mut ids: Vec<String> = service
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.impression_id)
        .collect();
    ids.sort();
    assert_eq!(ids, vec!["../x", "/abs", "a/../b", "x", "x.json/y"]);

    let top: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(top.len(), 1);
    assert_eq!(std::fs::read_dir(&base).unwrap().count(), 5);
}

#[tokio::test]
async fn test_listing_spans_many_pages() {
    let dir = TempDir::new().unwrap();
    let service = service_in(dir.path(), 3).await;

    for n in 0..10 {
        service
            .record(request(&format!("imp-{:02}", n), Some("Portland")))
            .await
            .unwrap();
    }

    let listed = service.list_all().await.unwrap();

    assert_eq!(listed.len(), 10);
    let mut ids: Vec<String> = listed.into_iter().map(|i| i.impression_id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 10);
}

#[tokio::test]
async fn test_rerecording_overwrites_archive_object() {
    let dir = TempDir::new().unwrap();
    let service = service_in(dir.path(), 100).await;

    service.record(request("imp-1", Some("Tacoma"))).await.unwrap();
    service.record(request("imp-1", Some("Olympia"))).await.unwrap();

    let body = std::fs::read(dir.path().join("imp-1.json")).unwrap();
    let archived: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(archived["Location"], "Olympia");
    assert_eq!(service.list_all().await.unwrap().len(), 1);
}
