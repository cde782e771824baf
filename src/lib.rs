// Copyright (c) 2026 the certsync authors
// SPDX-License-Identifier: MIT

//! # certsync - Certificate Binding Reconciliation Engine
//!
//! certsync makes freshly issued certificates *effective*: given a target's
//! desired host set and a certificate transition (old → new), it computes
//! and applies the minimal set of binding mutations against a web server's
//! site inventory, including migrating bindings on other sites that still
//! reference the superseded certificate.
//!
//! ## Overview
//!
//! - A pure [`policy`] decides, per (site, host) pair, whether a binding is
//!   created, updated, or left alone, and what its attributes should be.
//! - The [`reconciler`] orchestrates the policy across the full desired
//!   host set and the full inventory: cross-site migration first, then
//!   target-site creation/update, then a single commit.
//! - The [`ftps`] reconciler is the simplified sibling for FTPS endpoints,
//!   which carry one certificate reference per site instead of per host.
//! - The [`installer`] facade wraps both for the certificate-lifecycle
//!   orchestrator and reports whether any change occurred.
//! - The site inventory itself sits behind the
//!   [`inventory::InventoryAdapter`] port; in-memory and JSON-file
//!   implementations ship with the crate.
//!
//! ## Example
//!
//! ```rust,no_run
//! use certsync::certificate::CertificateInfo;
//! use certsync::installer::{auto_confirm, Install, WebInstaller};
//! use certsync::inventory::file::FileAdapter;
//! use certsync::target::Target;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let adapter = Arc::new(FileAdapter::new("inventory.json"));
//! let installer = WebInstaller::new(adapter, auto_confirm(false));
//!
//! let target = Target::new("example.com", &["www.example.com"], Some(1));
//! let new_cert = CertificateInfo::from_der(b"certificate der bytes", "WebHosting");
//! let outcome = installer.install(&target, &new_cert, None).await?;
//! println!("changed anything: {}", outcome.changed_anything());
//! # Ok(())
//! # }
//! ```
//!
//! ## Guarantees
//!
//! - At most one commit per pass; an abort before commit leaves the live
//!   configuration untouched.
//! - Reconciling twice with unchanged inputs stages nothing the second
//!   time and skips the commit.
//! - A binding's certificate hash and store name only ever move as a pair.
//! - A host blocked on an operator decision skips that host only; the
//!   remaining hosts complete.

pub mod certificate;
pub mod constants;
pub mod errors;
pub mod ftps;
pub mod identifier;
pub mod installer;
pub mod inventory;
pub mod policy;
pub mod reconciler;
pub mod target;

pub use certificate::{CertificateInfo, Thumbprint};
pub use errors::{AdapterError, AttributeError, PolicyError, ReconcileError};
pub use identifier::Identifier;
pub use installer::{Install, InstallOutcome, InstallerRegistry};
pub use inventory::{Binding, Inventory, InventoryAdapter, PlatformVersion, Site, SslFlags};
pub use reconciler::{ReconcileOptions, ReconcileOutcome};
pub use target::Target;
