// Copyright (c) 2026 the certsync authors
// SPDX-License-Identifier: MIT

//! The binding reconciliation engine.
//!
//! One pass turns a certificate transition (old → new) into the minimal
//! set of binding mutations across the whole site inventory:
//!
//! 1. **Migration** — https bindings on *other* sites still referencing
//!    the superseded certificate are updated to the new one. An operator
//!    who bound other sites to the certificate being renewed almost
//!    certainly wants them to follow the renewal; leaving them on an
//!    expiring certificate is worse than the risk of an unwanted update.
//! 2. **Target site** — every desired host not already satisfied by a
//!    migrated binding is created or updated on the target's own site.
//! 3. **Commit** — at most one commit makes the staged mutations durable.
//!    Zero staged mutations skip the commit entirely, which is what makes
//!    a repeated pass with unchanged inputs a no-op.
//!
//! Migration always runs before the target-site phase: a host found
//! during migration must never also be created on the target site, which
//! is the mechanism preventing duplicate https bindings for hosts that
//! exist on two sites simultaneously.

use crate::certificate::CertificateInfo;
use crate::constants::{CENTRAL_SSL_MIN_MAJOR, DEFAULT_BINDING_PORT};
use crate::errors::{PolicyError, ReconcileError};
use crate::identifier::Identifier;
use crate::inventory::{Inventory, InventoryAdapter, Protocol, Session};
use crate::policy::{self, ConfirmIpBinding, DesiredBinding, HostOutcome};
use crate::target::Target;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// Knobs for one reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Port for newly created https bindings
    pub port: u16,
    /// Resolve certificates from the central store instead of binding a
    /// thumbprint per binding
    pub central_ssl: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            port: DEFAULT_BINDING_PORT,
            central_ssl: false,
        }
    }
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Number of committed binding mutations
    pub changed: usize,
    /// Hosts skipped pending an operator decision on IP-specific creation
    pub blocked: Vec<String>,
}

impl ReconcileOutcome {
    /// Whether the pass staged nothing and skipped the commit.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.changed == 0 && self.blocked.is_empty()
    }
}

/// Reconcile the desired host set against the site inventory.
///
/// Loads the inventory once, stages mutations in memory, and issues at
/// most one commit. On any fatal failure the staged snapshot is
/// discarded, leaving the live configuration in its pre-call state; the
/// adapter cache is invalidated on every exit path.
///
/// Hosts blocked on an operator decision are reported in the outcome
/// rather than failing the pass; a partially successful pass (some hosts
/// installed, one blocked) is an expected result.
///
/// # Errors
///
/// [`ReconcileError`] on a missing target site, an unsupported install
/// mode, an unrecoverable per-host failure, or an adapter load/commit
/// failure.
pub async fn reconcile(
    adapter: &dyn InventoryAdapter,
    target: &Target,
    hosts: &[Identifier],
    new_cert: &CertificateInfo,
    old_cert: Option<&CertificateInfo>,
    confirm: &dyn ConfirmIpBinding,
    options: &ReconcileOptions,
) -> Result<ReconcileOutcome, ReconcileError> {
    let mut session = Session::open(adapter).await?;
    match run_pass(&mut session, target, hosts, new_cert, old_cert, confirm, options).await {
        Ok(blocked) => {
            let staged = session.staged();
            if staged > 0 {
                info!("Committing {} https binding changes", staged);
            } else {
                warn!("No bindings have been changed");
            }
            let changed = session.commit().await?;
            Ok(ReconcileOutcome { changed, blocked })
        }
        Err(err) => {
            error!("Reconciliation aborted before commit: {err}");
            session.discard().await;
            Err(err)
        }
    }
}

/// Phases 1 and 2 against the staged snapshot. Returns the blocked hosts.
async fn run_pass(
    session: &mut Session<'_>,
    target: &Target,
    hosts: &[Identifier],
    new_cert: &CertificateInfo,
    old_cert: Option<&CertificateInfo>,
    confirm: &dyn ConfirmIpBinding,
    options: &ReconcileOptions,
) -> Result<Vec<String>, ReconcileError> {
    let platform = session.inventory().platform;
    if options.central_ssl && !platform.supports_central_ssl() {
        return Err(ReconcileError::CentralSslUnsupported {
            min_major: CENTRAL_SSL_MIN_MAJOR,
            found: platform.to_string(),
        });
    }

    let site_id = target
        .installation_site()
        .ok_or_else(|| ReconcileError::MissingTargetSite {
            target: target.common_name.value(),
        })?;
    if session.inventory().site(site_id).is_none() {
        return Err(ReconcileError::SiteNotFound { site_id });
    }

    let desired = DesiredBinding {
        port: options.port,
        flags: policy::default_flags(platform, options.central_ssl),
        thumbprint: (!options.central_ssl).then(|| new_cert.thumbprint.clone()),
        store: (!options.central_ssl).then(|| new_cert.store_name.clone()),
    };

    let migrated = match old_cert {
        Some(old) => {
            let inventory = session.inventory_mut();
            let (staged, migrated) = migrate_cross_site(inventory, site_id, old, &desired);
            session.add_staged(staged);
            migrated
        }
        // First issuance never migrates anything.
        None => HashSet::new(),
    };

    let mut blocked = Vec::new();
    for host in hosts {
        if migrated.contains(&host.value().to_ascii_lowercase()) {
            debug!(host = %host, "Already satisfied by a migrated binding on another site");
            continue;
        }
        let site = session
            .inventory_mut()
            .site_mut(site_id)
            .ok_or(ReconcileError::SiteNotFound { site_id })?;
        match policy::apply_to_host(site, host, &desired, true, confirm, platform).await {
            Ok(outcome) => {
                if let HostOutcome::Skipped = outcome {
                    debug!(host = %host, "Binding not created");
                }
                session.add_staged(outcome.staged());
            }
            Err(err @ PolicyError::CreationBlocked { .. }) => {
                warn!("{err}");
                blocked.push(host.value());
            }
            Err(err) => {
                return Err(ReconcileError::Host {
                    host: host.value(),
                    source: err.into(),
                });
            }
        }
    }
    Ok(blocked)
}

/// Phase 1: update https bindings on other sites that still reference the
/// superseded certificate. Returns the staged-mutation count and the set
/// of hosts (lowercased) satisfied by migrated bindings.
fn migrate_cross_site(
    inventory: &mut Inventory,
    target_site: u64,
    old_cert: &CertificateInfo,
    desired: &DesiredBinding,
) -> (usize, HashSet<String>) {
    let mut staged = 0;
    let mut migrated = HashSet::new();
    for site in &mut inventory.sites {
        if site.id == target_site {
            continue;
        }
        let matches: Vec<usize> = site
            .bindings
            .iter()
            .enumerate()
            .filter(|(_, b)| {
                b.protocol == Protocol::Https
                    && b.certificate_hash.as_ref() == Some(&old_cert.thumbprint)
            })
            .map(|(i, _)| i)
            .collect();
        for index in matches {
            let host = site.bindings[index].host.to_ascii_lowercase();
            info!(
                host = %host,
                site = %site.name,
                "Migrating binding from superseded certificate"
            );
            if policy::stage_update(site, index, desired) {
                staged += 1;
            }
            migrated.insert(host);
        }
    }
    (staged, migrated)
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod reconciler_tests;
