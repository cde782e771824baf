// Copyright (c) 2026 the certsync authors
// SPDX-License-Identifier: MIT

//! Binding policy: per-(site, host) decisions.
//!
//! Given one site, one desired host, and the certificate transition, the
//! policy decides whether a binding is updated, created, or left alone,
//! and computes the attributes of the staged binding. The functions here
//! are stateless given their inputs; the only suspension point is the
//! injected confirmation port for IP-specific creations.
//!
//! # Update semantics
//!
//! An update never mutates the existing binding in place. A replacement
//! value is built that copies every non-managed attribute verbatim, sets
//! the managed attributes (protocol, endpoint descriptor, certificate
//! hash + store, flags) to the desired values, and is swapped into the
//! existing binding's slot inside the staged snapshot. Some backends
//! corrupt bindings on in-place attribute mutation; a backend without
//! that defect only needs to swap out [`stage_update`].

use crate::certificate::Thumbprint;
use crate::constants::{DEFAULT_BINDING_IP, UNSPECIFIED_IP};
use crate::errors::PolicyError;
use crate::identifier::Identifier;
use crate::inventory::{store_name_eq, Binding, PlatformVersion, Protocol, Site, SslFlags};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Decision port for IP-specific https creation.
///
/// Creating an https binding pinned to a specific IP can break unrelated
/// https sites sharing that IP on platforms with SNI support, so the
/// policy asks before doing it. Interactive callers prompt the operator;
/// non-interactive callers install an automatic policy.
#[async_trait]
pub trait ConfirmIpBinding: Send + Sync {
    /// Decide whether an https binding for `host` may be pinned to `ip`.
    ///
    /// # Errors
    ///
    /// Implementations may fail (for example, a prompt losing its
    /// terminal); that failure is fatal for the host being processed.
    async fn confirm(&self, host: &str, ip: &str) -> anyhow::Result<bool>;
}

/// Automatic confirmation policy: always allow or always deny.
pub struct AutoConfirm(pub bool);

#[async_trait]
impl ConfirmIpBinding for AutoConfirm {
    async fn confirm(&self, _host: &str, _ip: &str) -> anyhow::Result<bool> {
        Ok(self.0)
    }
}

/// The desired managed attributes shared by every binding staged in one
/// reconciliation pass.
#[derive(Debug, Clone)]
pub struct DesiredBinding {
    /// Port for newly created bindings (existing bindings keep theirs)
    pub port: u16,
    /// Capability flags appropriate to the platform and install mode
    pub flags: SslFlags,
    /// New certificate thumbprint; `None` in central-store mode
    pub thumbprint: Option<Thumbprint>,
    /// New certificate store; `None` in central-store mode
    pub store: Option<String>,
}

/// Flags appropriate to a platform version and install mode.
///
/// SNI is only offered on platforms that support it; the central-store
/// flag is always included when that installation mode is active.
#[must_use]
pub fn default_flags(platform: PlatformVersion, central_ssl: bool) -> SslFlags {
    let mut flags = SslFlags::NONE;
    if platform.supports_sni() {
        flags = flags | SslFlags::SNI;
    }
    if central_ssl {
        flags = flags | SslFlags::CENTRAL_SSL;
    }
    flags
}

/// What the policy did for one (site, host) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOutcome {
    /// Existing https bindings were brought up to date; `staged` counts
    /// the ones that actually changed (already-current bindings are
    /// no-ops and not staged).
    Updated {
        /// Number of bindings staged for replacement
        staged: usize,
    },
    /// A new https binding was staged.
    Created,
    /// No https binding exists and creation was not permitted.
    Skipped,
}

impl HostOutcome {
    /// Number of mutations this outcome staged.
    #[must_use]
    pub fn staged(&self) -> usize {
        match self {
            Self::Updated { staged } => *staged,
            Self::Created => 1,
            Self::Skipped => 0,
        }
    }
}

/// Apply the policy for one desired host against one site.
///
/// Every existing https binding for the host is brought up to date
/// independently; operators may have intentionally created more than one
/// (different ports). When none exists and creation is permitted, a new
/// binding is staged, inheriting the IP of an http binding for the same
/// host when there is one.
///
/// # Errors
///
/// [`PolicyError::CreationBlocked`] when an IP-specific creation was
/// declined, [`PolicyError::ConfirmFailed`] when the confirmation port
/// itself failed.
pub async fn apply_to_host(
    site: &mut Site,
    host: &Identifier,
    desired: &DesiredBinding,
    allow_create: bool,
    confirm: &dyn ConfirmIpBinding,
    platform: PlatformVersion,
) -> Result<HostOutcome, PolicyError> {
    let host_value = host.value();
    let https_matches: Vec<usize> = site
        .bindings
        .iter()
        .enumerate()
        .filter(|(_, b)| b.protocol == Protocol::Https && b.matches_host(&host_value))
        .map(|(i, _)| i)
        .collect();

    if !https_matches.is_empty() {
        let mut staged = 0;
        for index in https_matches {
            if stage_update(site, index, desired) {
                staged += 1;
            }
        }
        return Ok(HostOutcome::Updated { staged });
    }

    if allow_create {
        stage_create(site, &host_value, desired, confirm, platform).await?;
        return Ok(HostOutcome::Created);
    }

    debug!(host = %host_value, site = %site.name, "No https binding and creation not permitted");
    Ok(HostOutcome::Skipped)
}

/// Stage a replacement for the binding at `index`, bringing its managed
/// attributes up to `desired`. Returns false when the binding is already
/// current (nothing staged).
pub fn stage_update(site: &mut Site, index: usize, desired: &DesiredBinding) -> bool {
    let existing = &site.bindings[index];

    let current_flags = existing.ssl_flags.unwrap_or(SslFlags::NONE);
    if current_flags == desired.flags
        && existing.certificate_hash == desired.thumbprint
        && store_name_eq(
            existing.certificate_store.as_deref(),
            desired.store.as_deref(),
        )
    {
        debug!(
            host = %existing.host,
            port = existing.port,
            "No binding update needed"
        );
        return false;
    }

    info!(
        host = %existing.host,
        port = existing.port,
        site = %site.name,
        "Updating existing https binding"
    );

    let mut replacement = Binding {
        protocol: existing.protocol,
        host: existing.host.clone(),
        ip: existing.ip.clone(),
        port: existing.port,
        certificate_hash: desired.thumbprint.clone(),
        certificate_store: desired.store.clone(),
        // Only write flags when the desired value is non-zero or the
        // original had an explicit flags attribute; older binding records
        // never carried one.
        ssl_flags: if !desired.flags.is_empty() || existing.ssl_flags.is_some() {
            Some(desired.flags)
        } else {
            None
        },
        attributes: BTreeMap::new(),
    };

    for (name, value) in &existing.attributes {
        if let Err(err) = replacement.set_attribute(name, value.clone()) {
            warn!("Unable to set attribute {} on new binding: {}", name, err);
        }
    }

    // Replacement swaps into the existing slot within the staged snapshot.
    site.bindings[index] = replacement;
    true
}

/// Stage a new https binding for `host` on `site`.
///
/// IP selection: inherit the IP of an existing http binding for the same
/// host when there is one; otherwise fall back to the wildcard with a
/// warning. An inherited non-wildcard IP needs operator confirmation on
/// platforms with SNI support.
async fn stage_create(
    site: &mut Site,
    host: &str,
    desired: &DesiredBinding,
    confirm: &dyn ConfirmIpBinding,
    platform: PlatformVersion,
) -> Result<(), PolicyError> {
    let inherited = site
        .bindings
        .iter()
        .find(|b| b.protocol == Protocol::Http && b.matches_host(host))
        .map(|b| b.ip.clone());

    let ip = match inherited {
        Some(ip) if ip != DEFAULT_BINDING_IP && ip != UNSPECIFIED_IP => {
            if platform.supports_sni() {
                let allowed =
                    confirm
                        .confirm(host, &ip)
                        .await
                        .map_err(|source| PolicyError::ConfirmFailed {
                            host: host.to_string(),
                            source,
                        })?;
                if !allowed {
                    return Err(PolicyError::CreationBlocked {
                        host: host.to_string(),
                        ip,
                    });
                }
            }
            ip
        }
        Some(_) => DEFAULT_BINDING_IP.to_string(),
        None => {
            warn!("No HTTP binding for {} on {}", host, site.name);
            DEFAULT_BINDING_IP.to_string()
        }
    };

    info!(host = %host, ip = %ip, port = desired.port, site = %site.name, "Adding new https binding");
    site.bindings.push(Binding {
        protocol: Protocol::Https,
        host: host.to_string(),
        ip,
        port: desired.port,
        certificate_hash: desired.thumbprint.clone(),
        certificate_store: desired.store.clone(),
        ssl_flags: if desired.flags.is_empty() {
            None
        } else {
            Some(desired.flags)
        },
        attributes: BTreeMap::new(),
    });
    Ok(())
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod policy_tests;
