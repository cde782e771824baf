// Copyright (c) 2026 the certsync authors
// SPDX-License-Identifier: MIT

//! The site inventory data model and adapter port.
//!
//! A reconciliation pass works against a snapshot of the backend's site
//! collection: it loads the whole [`Inventory`] once, stages mutations in
//! memory, and makes them durable with a single terminal commit. The
//! backend itself is abstracted behind [`InventoryAdapter`]; this crate
//! ships an in-memory implementation ([`memory::MemoryAdapter`]) and a
//! JSON-file implementation ([`file::FileAdapter`]).
//!
//! # Session lifecycle
//!
//! [`Session`] is the scoped handle around one pass. Opening a session
//! loads the snapshot; the reconcilers mutate it and record how many
//! mutations they staged; [`Session::commit`] issues at most one commit
//! and always invalidates the adapter's cache on the way out, so the next
//! independent pass observes fresh state. Abort paths go through
//! [`Session::discard`], which skips the commit but still invalidates.

pub mod file;
pub mod memory;

use crate::certificate::Thumbprint;
use crate::constants::{CENTRAL_SSL_MIN_MAJOR, FTPS_MIN_VERSION, SNI_MIN_MAJOR};
use crate::errors::{AdapterError, AttributeError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::BitOr;
use tracing::debug;

/// Protocol of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Plain http
    Http,
    /// TLS-terminated http
    Https,
    /// FTP (TLS configured through the site's FTPS settings, not per binding)
    Ftp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Ftp => "ftp",
        };
        f.write_str(s)
    }
}

/// Capability flags on an https binding.
///
/// A bitmask-like set of binary flags. `None` on a [`Binding`] means the
/// record predates the flags attribute entirely; the policy preserves
/// that distinction when staging replacements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SslFlags(u32);

impl SslFlags {
    /// No flags set
    pub const NONE: Self = Self(0);
    /// Server Name Indication: host-based certificate selection on a shared IP
    pub const SNI: Self = Self(1);
    /// Certificate resolved from a central store by name rather than bound per binding
    pub const CENTRAL_SSL: Self = Self(2);

    /// Whether every flag in `other` is set here.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no flags are set.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The raw bitmask, as written to the backend's flags attribute.
    #[must_use]
    pub fn bits(self) -> u32 {
        self.0
    }
}

impl BitOr for SslFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for SslFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Version of the web-serving platform behind the adapter.
///
/// Gates which capability flags the policy offers: SNI and the central
/// certificate store arrived in different platform generations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct PlatformVersion {
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
}

impl PlatformVersion {
    /// Construct a version.
    #[must_use]
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Whether https bindings support the SNI flag.
    #[must_use]
    pub fn supports_sni(self) -> bool {
        self.major >= SNI_MIN_MAJOR
    }

    /// Whether the centralized certificate store is available.
    #[must_use]
    pub fn supports_central_ssl(self) -> bool {
        self.major >= CENTRAL_SSL_MIN_MAJOR
    }

    /// Whether FTPS site configuration is available.
    #[must_use]
    pub fn supports_ftps(self) -> bool {
        (self.major, self.minor) >= FTPS_MIN_VERSION
    }
}

impl fmt::Display for PlatformVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A (host, protocol) routing rule on a site.
///
/// (IP, port) are attributes, not identity: a host may move between IPs
/// across renewals, so binding lookup always goes through (host,
/// protocol). Certificate fields are only meaningful for `https` (ftp
/// TLS lives in [`FtpsSslConfig`]).
///
/// Non-managed attributes (anything the backend stores beyond the fields
/// below) ride along in an ordered name → already-serialized-value map
/// and are copied opaquely when a binding is replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    /// Binding protocol
    pub protocol: Protocol,
    /// Hostname, or empty for "all hosts"
    #[serde(default)]
    pub host: String,
    /// Literal address or the wildcard `*`
    pub ip: String,
    /// Port
    pub port: u16,
    /// Certificate thumbprint (https only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_hash: Option<Thumbprint>,
    /// Certificate store name (https only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_store: Option<String>,
    /// Explicit flags attribute; `None` when the record never had one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_flags: Option<SslFlags>,
    /// Non-managed attributes, copied opaquely on replacement
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
}

impl Binding {
    /// The backend's combined endpoint descriptor, `ip:port:host`.
    #[must_use]
    pub fn binding_information(&self) -> String {
        format!("{}:{}:{}", self.ip, self.port, self.host)
    }

    /// Case-insensitive host comparison.
    #[must_use]
    pub fn matches_host(&self, host: &str) -> bool {
        self.host.eq_ignore_ascii_case(host)
    }

    /// Set a non-managed attribute, validating that the backend can
    /// round-trip the value.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError`] for values the attribute schema cannot
    /// represent (currently: explicit nulls).
    pub fn set_attribute(&mut self, name: &str, value: Value) -> Result<(), AttributeError> {
        if value.is_null() {
            return Err(AttributeError {
                name: name.to_string(),
                reason: "null values cannot be round-tripped".to_string(),
            });
        }
        self.attributes.insert(name.to_string(), value);
        Ok(())
    }
}

/// TLS configuration of an FTPS endpoint (site-level or site defaults).
///
/// FTPS has no host concept; one configuration element carries the
/// certificate reference for the whole endpoint. The hash and store are
/// only ever written as a pair.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FtpsSslConfig {
    /// Thumbprint of the bound certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_cert_hash: Option<Thumbprint>,
    /// Store holding the bound certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_cert_store: Option<String>,
}

impl FtpsSslConfig {
    /// Stage the new certificate reference. Hash and store always move
    /// together.
    pub fn assign(&mut self, hash: Thumbprint, store: &str) {
        self.server_cert_hash = Some(hash);
        self.server_cert_store = Some(store.to_string());
    }
}

/// A site owned by the inventory backend.
///
/// The reconciler never creates or deletes sites, only their bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Backend identity
    pub id: u64,
    /// Display name
    pub name: String,
    /// Physical path
    #[serde(default)]
    pub path: String,
    /// Ordered binding collection
    #[serde(default)]
    pub bindings: Vec<Binding>,
    /// Site-level FTPS TLS configuration, present on ftp-capable sites
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ftp_ssl: Option<FtpsSslConfig>,
}

impl Site {
    /// Whether the site serves http/https traffic.
    #[must_use]
    pub fn has_web_bindings(&self) -> bool {
        self.bindings
            .iter()
            .any(|b| matches!(b.protocol, Protocol::Http | Protocol::Https))
    }

    /// Whether the site has ftp bindings.
    #[must_use]
    pub fn has_ftp_bindings(&self) -> bool {
        self.bindings.iter().any(|b| b.protocol == Protocol::Ftp)
    }
}

/// One full snapshot of the backend's configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    /// Platform version reported by the backend
    #[serde(default)]
    pub platform: PlatformVersion,
    /// Site-wide default FTPS TLS configuration
    #[serde(default)]
    pub ftp_defaults: FtpsSslConfig,
    /// All sites, in an order that is stable within one snapshot
    #[serde(default)]
    pub sites: Vec<Site>,
}

impl Inventory {
    /// Look up a site by id.
    #[must_use]
    pub fn site(&self, id: u64) -> Option<&Site> {
        self.sites.iter().find(|s| s.id == id)
    }

    /// Look up a site by id, mutably.
    #[must_use]
    pub fn site_mut(&mut self, id: u64) -> Option<&mut Site> {
        self.sites.iter_mut().find(|s| s.id == id)
    }
}

/// Case-insensitive comparison of store names, treating `None` as the
/// empty name. Backends report store names with inconsistent casing.
#[must_use]
pub fn store_name_eq(a: Option<&str>, b: Option<&str>) -> bool {
    a.unwrap_or_default()
        .eq_ignore_ascii_case(b.unwrap_or_default())
}

/// Read/write access to a collection of sites.
///
/// Implementations must hand out a snapshot whose site order is stable
/// within one call, accept the whole staged snapshot as a single atomic
/// commit, and support invalidating any cache they keep so the next load
/// re-reads the backend.
#[async_trait]
pub trait InventoryAdapter: Send + Sync {
    /// Read the full site inventory.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] if the backend cannot be read.
    async fn load(&self) -> Result<Inventory, AdapterError>;

    /// Apply a staged inventory as one atomic batch.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::CommitRejected`] if the backend refuses the
    /// batch; nothing from the batch is durable in that case.
    async fn commit(&self, staged: &Inventory) -> Result<(), AdapterError>;

    /// Invalidate any cached inventory so the next [`load`](Self::load)
    /// observes the backend's current state.
    async fn refresh(&self);
}

/// Scoped handle around one reconciliation pass.
///
/// Owns the loaded snapshot and the staged-mutation count. Exactly one of
/// [`commit`](Self::commit) or [`discard`](Self::discard) consumes the
/// session; both invalidate the adapter cache, so every exit path leaves
/// the adapter ready for a fresh read.
pub struct Session<'a> {
    adapter: &'a dyn InventoryAdapter,
    inventory: Inventory,
    staged: usize,
}

impl<'a> Session<'a> {
    /// Open a session by loading the current inventory.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] if the snapshot cannot be loaded.
    pub async fn open(adapter: &'a dyn InventoryAdapter) -> Result<Session<'a>, AdapterError> {
        let inventory = adapter.load().await?;
        debug!(
            sites = inventory.sites.len(),
            platform = %inventory.platform,
            "Opened inventory session"
        );
        Ok(Self {
            adapter,
            inventory,
            staged: 0,
        })
    }

    /// The staged snapshot.
    #[must_use]
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// The staged snapshot, mutably.
    #[must_use]
    pub fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    /// Record `count` staged mutations.
    pub fn add_staged(&mut self, count: usize) {
        self.staged += count;
    }

    /// Number of mutations staged so far.
    #[must_use]
    pub fn staged(&self) -> usize {
        self.staged
    }

    /// Terminal commit: apply the staged snapshot if anything was staged,
    /// then invalidate the adapter cache regardless of outcome.
    ///
    /// Returns the number of committed mutations (zero when nothing was
    /// staged; the backend is not called in that case).
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] when the backend rejects the batch. The
    /// cache is still invalidated so a subsequent attempt observes fresh
    /// state.
    pub async fn commit(self) -> Result<usize, AdapterError> {
        if self.staged == 0 {
            debug!("No staged changes, skipping commit");
            self.adapter.refresh().await;
            return Ok(0);
        }
        let result = self.adapter.commit(&self.inventory).await;
        self.adapter.refresh().await;
        result.map(|()| self.staged)
    }

    /// Abort the pass: drop the staged snapshot without committing, still
    /// invalidating the adapter cache.
    pub async fn discard(self) {
        debug!(staged = self.staged, "Discarding inventory session");
        self.adapter.refresh().await;
    }
}
