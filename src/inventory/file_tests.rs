// Copyright (c) 2026 the certsync authors
// SPDX-License-Identifier: MIT

//! Unit tests for `file.rs`

use crate::inventory::file::FileAdapter;
use crate::inventory::{FtpsSslConfig, Inventory, InventoryAdapter, PlatformVersion, Site};

fn sample_inventory() -> Inventory {
    Inventory {
        platform: PlatformVersion::new(10, 0),
        ftp_defaults: FtpsSslConfig::default(),
        sites: vec![Site {
            id: 1,
            name: "Default Web Site".to_string(),
            path: String::new(),
            bindings: vec![],
            ftp_ssl: None,
        }],
    }
}

#[tokio::test]
async fn test_commit_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inventory.json");
    let adapter = FileAdapter::new(&path);

    adapter.commit(&sample_inventory()).await.unwrap();
    let loaded = adapter.load().await.unwrap();
    assert_eq!(loaded, sample_inventory());
}

#[tokio::test]
async fn test_load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = FileAdapter::new(dir.path().join("absent.json"));
    let err = adapter.load().await.unwrap_err();
    assert!(matches!(err, crate::errors::AdapterError::Io(_)));
}

#[tokio::test]
async fn test_load_rejects_malformed_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inventory.json");
    tokio::fs::write(&path, "{ not json").await.unwrap();
    let adapter = FileAdapter::new(&path);
    let err = adapter.load().await.unwrap_err();
    assert!(matches!(err, crate::errors::AdapterError::Serialization(_)));
}

#[tokio::test]
async fn test_cache_serves_until_refresh() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inventory.json");
    let adapter = FileAdapter::new(&path);
    adapter.commit(&sample_inventory()).await.unwrap();
    let first = adapter.load().await.unwrap();

    // External edit behind the adapter's back.
    let mut edited = sample_inventory();
    edited.sites[0].name = "Renamed".to_string();
    tokio::fs::write(&path, serde_json::to_string(&edited).unwrap())
        .await
        .unwrap();

    // Cached snapshot still served...
    assert_eq!(adapter.load().await.unwrap(), first);

    // ...until the cache is invalidated.
    adapter.refresh().await;
    assert_eq!(adapter.load().await.unwrap().sites[0].name, "Renamed");
}
