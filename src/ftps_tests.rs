// Copyright (c) 2026 the certsync authors
// SPDX-License-Identifier: MIT

//! Unit tests for `ftps.rs`

use crate::certificate::{CertificateInfo, Thumbprint};
use crate::ftps::reconcile_ftps;
use crate::inventory::memory::MemoryAdapter;
use crate::inventory::{FtpsSslConfig, Inventory, PlatformVersion, Site};

fn old_cert() -> CertificateInfo {
    CertificateInfo::new(Thumbprint::from_bytes(vec![0x0a; 20]), "My")
}

fn new_cert() -> CertificateInfo {
    CertificateInfo::new(Thumbprint::from_bytes(vec![0x0b; 20]), "My")
}

fn unrelated_hash() -> Thumbprint {
    Thumbprint::from_bytes(vec![0x0c; 20])
}

fn ssl(hash: Option<Thumbprint>, store: Option<&str>) -> FtpsSslConfig {
    FtpsSslConfig {
        server_cert_hash: hash,
        server_cert_store: store.map(String::from),
    }
}

fn ftp_site(id: u64, name: &str, ssl: FtpsSslConfig) -> Site {
    Site {
        id,
        name: name.to_string(),
        path: String::new(),
        bindings: vec![],
        ftp_ssl: Some(ssl),
    }
}

fn inventory(defaults: FtpsSslConfig, sites: Vec<Site>) -> Inventory {
    Inventory {
        platform: PlatformVersion::new(10, 0),
        ftp_defaults: defaults,
        sites,
    }
}

#[tokio::test]
async fn test_owned_site_updates_whenever_reference_differs() {
    // The install site carries an unrelated certificate; ownership means
    // it follows the new certificate regardless of what it held before.
    let adapter = MemoryAdapter::new(inventory(
        FtpsSslConfig::default(),
        vec![ftp_site(5, "ftp", ssl(Some(unrelated_hash()), Some("My")))],
    ));

    let changed = reconcile_ftps(&adapter, 5, &new_cert(), Some(&old_cert()))
        .await
        .unwrap();
    assert_eq!(changed, 1);

    let committed = adapter.site(5).unwrap();
    let ssl = committed.ftp_ssl.unwrap();
    assert_eq!(ssl.server_cert_hash, Some(new_cert().thumbprint));
    assert_eq!(ssl.server_cert_store.as_deref(), Some("My"));
}

#[tokio::test]
async fn test_owned_site_updates_on_store_mismatch_alone() {
    let adapter = MemoryAdapter::new(inventory(
        FtpsSslConfig::default(),
        vec![ftp_site(
            5,
            "ftp",
            ssl(Some(new_cert().thumbprint), Some("WebHosting")),
        )],
    ));

    let changed = reconcile_ftps(&adapter, 5, &new_cert(), None).await.unwrap();
    assert_eq!(changed, 1);
    let ssl = adapter.site(5).unwrap().ftp_ssl.unwrap();
    assert_eq!(ssl.server_cert_store.as_deref(), Some("My"));
}

#[tokio::test]
async fn test_foreign_site_migrates_only_on_exact_old_match() {
    let adapter = MemoryAdapter::new(inventory(
        FtpsSslConfig::default(),
        vec![
            ftp_site(6, "stale", ssl(Some(old_cert().thumbprint), Some("My"))),
            ftp_site(7, "other", ssl(Some(unrelated_hash()), Some("My"))),
        ],
    ));

    let changed = reconcile_ftps(&adapter, 5, &new_cert(), Some(&old_cert()))
        .await
        .unwrap();
    assert_eq!(changed, 1);

    assert_eq!(
        adapter.site(6).unwrap().ftp_ssl.unwrap().server_cert_hash,
        Some(new_cert().thumbprint)
    );
    // A foreign site on an unrelated certificate is never touched.
    assert_eq!(
        adapter.site(7).unwrap().ftp_ssl.unwrap().server_cert_hash,
        Some(unrelated_hash())
    );
}

#[tokio::test]
async fn test_foreign_site_untouched_on_first_issuance() {
    let adapter = MemoryAdapter::new(inventory(
        FtpsSslConfig::default(),
        vec![ftp_site(6, "stale", ssl(Some(old_cert().thumbprint), Some("My")))],
    ));

    let changed = reconcile_ftps(&adapter, 5, &new_cert(), None).await.unwrap();
    assert_eq!(changed, 0);
    assert_eq!(
        adapter.site(6).unwrap().ftp_ssl.unwrap().server_cert_hash,
        Some(old_cert().thumbprint)
    );
}

#[tokio::test]
async fn test_defaults_participate_as_site_zero() {
    // Installing "into" the defaults element updates it like an owned
    // site; as a foreign element it follows the migration rule.
    let adapter = MemoryAdapter::new(inventory(ssl(Some(unrelated_hash()), Some("My")), vec![]));
    let changed = reconcile_ftps(&adapter, 0, &new_cert(), None).await.unwrap();
    assert_eq!(changed, 1);
    assert_eq!(
        adapter.snapshot().ftp_defaults.server_cert_hash,
        Some(new_cert().thumbprint)
    );

    let adapter = MemoryAdapter::new(inventory(ssl(Some(old_cert().thumbprint), Some("My")), vec![]));
    let changed = reconcile_ftps(&adapter, 5, &new_cert(), Some(&old_cert()))
        .await
        .unwrap();
    assert_eq!(changed, 1);
    assert_eq!(
        adapter.snapshot().ftp_defaults.server_cert_hash,
        Some(new_cert().thumbprint)
    );
}

#[tokio::test]
async fn test_store_comparison_is_case_insensitive() {
    let adapter = MemoryAdapter::new(inventory(
        FtpsSslConfig::default(),
        vec![ftp_site(5, "ftp", ssl(Some(new_cert().thumbprint), Some("my")))],
    ));
    let changed = reconcile_ftps(&adapter, 5, &new_cert(), None).await.unwrap();
    assert_eq!(changed, 0);
}

#[tokio::test]
async fn test_idempotent_pass_skips_commit() {
    let adapter = MemoryAdapter::new(inventory(
        FtpsSslConfig::default(),
        vec![ftp_site(5, "ftp", ssl(Some(old_cert().thumbprint), Some("My")))],
    ));

    let first = reconcile_ftps(&adapter, 5, &new_cert(), Some(&old_cert()))
        .await
        .unwrap();
    assert_eq!(first, 1);
    assert_eq!(adapter.commit_count(), 1);

    let second = reconcile_ftps(&adapter, 5, &new_cert(), Some(&old_cert()))
        .await
        .unwrap();
    assert_eq!(second, 0);
    assert_eq!(adapter.commit_count(), 1);
    // The cache is still invalidated after the no-op pass.
    assert_eq!(adapter.refresh_count(), 2);
}

#[tokio::test]
async fn test_sites_without_ftp_config_are_ignored() {
    let mut web_only = ftp_site(5, "web", FtpsSslConfig::default());
    web_only.ftp_ssl = None;
    let adapter = MemoryAdapter::new(inventory(FtpsSslConfig::default(), vec![web_only]));
    let changed = reconcile_ftps(&adapter, 5, &new_cert(), None).await.unwrap();
    assert_eq!(changed, 0);
}

#[tokio::test]
async fn test_commit_failure_propagates() {
    let adapter = MemoryAdapter::new(inventory(
        FtpsSslConfig::default(),
        vec![ftp_site(5, "ftp", ssl(None, None))],
    ));
    adapter.fail_next_commit();
    let err = reconcile_ftps(&adapter, 5, &new_cert(), None).await.unwrap_err();
    assert!(err.is_commit_failure());
    assert_eq!(adapter.refresh_count(), 1);
}
