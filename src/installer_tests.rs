// Copyright (c) 2026 the certsync authors
// SPDX-License-Identifier: MIT

//! Unit tests for `installer.rs`

use crate::certificate::{CertificateInfo, Thumbprint};
use crate::installer::{
    auto_confirm, FtpsInstaller, Install, InstallOutcome, InstallerRegistry, WebInstaller,
};
use crate::inventory::memory::MemoryAdapter;
use crate::inventory::{
    Binding, FtpsSslConfig, Inventory, PlatformVersion, Protocol, Site,
};
use crate::target::Target;
use std::collections::BTreeMap;
use std::sync::Arc;

fn https(host: &str, hash: &Thumbprint) -> Binding {
    Binding {
        protocol: Protocol::Https,
        host: host.to_string(),
        ip: "*".to_string(),
        port: 443,
        certificate_hash: Some(hash.clone()),
        certificate_store: Some("WebHosting".to_string()),
        ssl_flags: None,
        attributes: BTreeMap::new(),
    }
}

fn inventory(sites: Vec<Site>) -> Inventory {
    Inventory {
        platform: PlatformVersion::new(10, 0),
        ftp_defaults: FtpsSslConfig::default(),
        sites,
    }
}

fn web_site(id: u64, bindings: Vec<Binding>) -> Site {
    Site {
        id,
        name: format!("site-{id}"),
        path: String::new(),
        bindings,
        ftp_ssl: None,
    }
}

fn old_cert() -> CertificateInfo {
    CertificateInfo::new(Thumbprint::from_bytes(vec![0x0a; 20]), "WebHosting")
}

fn new_cert() -> CertificateInfo {
    CertificateInfo::new(Thumbprint::from_bytes(vec![0x0b; 20]), "WebHosting")
}

#[test]
fn test_builtin_registry_keys() {
    let registry = InstallerRegistry::builtin();
    let keys: Vec<&str> = registry.keys().collect();
    assert_eq!(keys, vec!["ftps", "web"]);
}

#[test]
fn test_registry_creates_registered_installers() {
    let registry = InstallerRegistry::default();
    let adapter = Arc::new(MemoryAdapter::new(inventory(vec![])));
    assert!(registry
        .create("web", adapter.clone(), auto_confirm(false))
        .is_some());
    assert!(registry
        .create("ftps", adapter.clone(), auto_confirm(false))
        .is_some());
    assert!(registry.create("smtp", adapter, auto_confirm(false)).is_none());
}

#[test]
fn test_registry_register_replaces_existing_key() {
    let mut registry = InstallerRegistry::builtin();
    registry.register("web", |adapter, _confirm| {
        Box::new(FtpsInstaller::new(adapter))
    });
    assert_eq!(registry.keys().count(), 2);
}

#[tokio::test]
async fn test_web_installer_reports_changes() {
    let adapter = Arc::new(MemoryAdapter::new(inventory(vec![web_site(
        1,
        vec![https("example.com", &old_cert().thumbprint)],
    )])));
    let installer = WebInstaller::new(adapter.clone(), auto_confirm(false));
    let target = Target::new("example.com", &[], Some(1));

    let outcome = installer
        .install(&target, &new_cert(), Some(&old_cert()))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        InstallOutcome::Changed {
            changed: 1,
            blocked: vec![],
        }
    );
    assert!(outcome.changed_anything());
    assert_eq!(
        adapter.site(1).unwrap().bindings[0].certificate_hash,
        Some(new_cert().thumbprint)
    );
}

#[tokio::test]
async fn test_web_installer_reports_noop() {
    let adapter = Arc::new(MemoryAdapter::new(inventory(vec![web_site(
        1,
        vec![{
            let mut b = https("example.com", &new_cert().thumbprint);
            b.ssl_flags = Some(crate::inventory::SslFlags::SNI);
            b
        }],
    )])));
    let installer = WebInstaller::new(adapter.clone(), auto_confirm(false));
    let target = Target::new("example.com", &[], Some(1));

    let outcome = installer
        .install(&target, &new_cert(), Some(&old_cert()))
        .await
        .unwrap();
    assert_eq!(outcome, InstallOutcome::NoChangeNeeded);
    assert!(!outcome.changed_anything());
    assert_eq!(adapter.commit_count(), 0);
}

#[tokio::test]
async fn test_web_installer_custom_port() {
    let adapter = Arc::new(MemoryAdapter::new(inventory(vec![web_site(1, vec![])])));
    let installer = WebInstaller::new(adapter.clone(), auto_confirm(false)).with_port(8443);
    let target = Target::new("example.com", &[], Some(1));

    installer.install(&target, &new_cert(), None).await.unwrap();
    assert_eq!(adapter.site(1).unwrap().bindings[0].port, 8443);
}

#[tokio::test]
async fn test_ftps_installer_updates_owned_site() {
    let mut site = web_site(5, vec![]);
    site.ftp_ssl = Some(FtpsSslConfig::default());
    let adapter = Arc::new(MemoryAdapter::new(inventory(vec![site])));
    let installer = FtpsInstaller::new(adapter.clone());
    let target = Target::new("ftp.example.com", &[], Some(5));

    let outcome = installer.install(&target, &new_cert(), None).await.unwrap();
    assert_eq!(
        outcome,
        InstallOutcome::Changed {
            changed: 1,
            blocked: vec![],
        }
    );
    assert_eq!(
        adapter.site(5).unwrap().ftp_ssl.unwrap().server_cert_hash,
        Some(new_cert().thumbprint)
    );
}

#[tokio::test]
async fn test_ftps_installer_requires_installation_site() {
    let adapter = Arc::new(MemoryAdapter::new(inventory(vec![])));
    let installer = FtpsInstaller::new(adapter);
    let target = Target::new("ftp.example.com", &[], None);

    let err = installer.install(&target, &new_cert(), None).await.unwrap_err();
    assert!(matches!(
        err,
        crate::errors::ReconcileError::MissingTargetSite { .. }
    ));
}
