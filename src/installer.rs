// Copyright (c) 2026 the certsync authors
// SPDX-License-Identifier: MIT

//! Installer facade and registry.
//!
//! [`Install`] is the capability the certificate-lifecycle orchestrator
//! consumes: make a newly issued certificate effective for a target. The
//! two built-in installers wrap the web and FTPS reconcilers; additional
//! installers register under a stable string key in
//! [`InstallerRegistry`] — an explicit factory table populated at process
//! start, not discovered at runtime.
//!
//! The facade folds the reconcilers' results into three user-visible
//! outcomes: "updated N bindings", "no changes needed" (a warning, not an
//! error, so the orchestrator can tell an idempotent no-op apart from a
//! failure), and the error path.

use crate::certificate::CertificateInfo;
use crate::constants::{INSTALLER_FTPS, INSTALLER_WEB};
use crate::errors::ReconcileError;
use crate::ftps;
use crate::inventory::InventoryAdapter;
use crate::policy::{AutoConfirm, ConfirmIpBinding};
use crate::reconciler::{self, ReconcileOptions};
use crate::target::Target;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of one installation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Mutations were committed; some hosts may still be blocked pending
    /// an operator decision.
    Changed {
        /// Committed mutation count
        changed: usize,
        /// Hosts skipped pending operator confirmation
        blocked: Vec<String>,
    },
    /// Nothing needed doing; the commit was skipped.
    NoChangeNeeded,
}

impl InstallOutcome {
    /// Whether the installation changed anything.
    #[must_use]
    pub fn changed_anything(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }
}

/// Make a certificate effective for a target.
#[async_trait]
pub trait Install: Send + Sync {
    /// Reconcile the target's bindings from `old_cert` to `new_cert`.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the pass aborts; nothing staged
    /// has been committed in that case.
    async fn install(
        &self,
        target: &Target,
        new_cert: &CertificateInfo,
        old_cert: Option<&CertificateInfo>,
    ) -> Result<InstallOutcome, ReconcileError>;
}

/// Installer for https bindings.
pub struct WebInstaller {
    adapter: Arc<dyn InventoryAdapter>,
    confirm: Arc<dyn ConfirmIpBinding>,
    options: ReconcileOptions,
}

impl WebInstaller {
    /// Build a web installer over an inventory adapter and a confirmation
    /// policy.
    #[must_use]
    pub fn new(adapter: Arc<dyn InventoryAdapter>, confirm: Arc<dyn ConfirmIpBinding>) -> Self {
        Self {
            adapter,
            confirm,
            options: ReconcileOptions::default(),
        }
    }

    /// Port for newly created https bindings.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.options.port = port;
        self
    }

    /// Resolve certificates from the central store instead of binding a
    /// thumbprint per binding.
    #[must_use]
    pub fn with_central_ssl(mut self, central_ssl: bool) -> Self {
        self.options.central_ssl = central_ssl;
        self
    }
}

#[async_trait]
impl Install for WebInstaller {
    async fn install(
        &self,
        target: &Target,
        new_cert: &CertificateInfo,
        old_cert: Option<&CertificateInfo>,
    ) -> Result<InstallOutcome, ReconcileError> {
        let hosts = target.hosts();
        let outcome = reconciler::reconcile(
            self.adapter.as_ref(),
            target,
            &hosts,
            new_cert,
            old_cert,
            self.confirm.as_ref(),
            &self.options,
        )
        .await?;
        if outcome.is_noop() {
            warn!(target = %target.common_name, "No binding changes were needed");
            return Ok(InstallOutcome::NoChangeNeeded);
        }
        info!(
            target = %target.common_name,
            changed = outcome.changed,
            blocked = outcome.blocked.len(),
            "Updated https bindings"
        );
        Ok(InstallOutcome::Changed {
            changed: outcome.changed,
            blocked: outcome.blocked,
        })
    }
}

/// Installer for FTPS endpoints.
pub struct FtpsInstaller {
    adapter: Arc<dyn InventoryAdapter>,
}

impl FtpsInstaller {
    /// Build an FTPS installer over an inventory adapter.
    #[must_use]
    pub fn new(adapter: Arc<dyn InventoryAdapter>) -> Self {
        Self { adapter }
    }
}

#[async_trait]
impl Install for FtpsInstaller {
    async fn install(
        &self,
        target: &Target,
        new_cert: &CertificateInfo,
        old_cert: Option<&CertificateInfo>,
    ) -> Result<InstallOutcome, ReconcileError> {
        let site_id =
            target
                .installation_site()
                .ok_or_else(|| ReconcileError::MissingTargetSite {
                    target: target.common_name.value(),
                })?;
        let changed =
            ftps::reconcile_ftps(self.adapter.as_ref(), site_id, new_cert, old_cert).await?;
        if changed == 0 {
            warn!(target = %target.common_name, "No ftp site changes were needed");
            return Ok(InstallOutcome::NoChangeNeeded);
        }
        info!(target = %target.common_name, changed, "Updated ftp site configuration");
        Ok(InstallOutcome::Changed {
            changed,
            blocked: Vec::new(),
        })
    }
}

/// Factory producing an installer from the shared collaborator handles.
pub type InstallerFactory =
    fn(Arc<dyn InventoryAdapter>, Arc<dyn ConfirmIpBinding>) -> Box<dyn Install>;

/// Explicit installer registry: stable key → factory.
///
/// Populated with the built-in installers at construction; embedders add
/// their own with [`register`](Self::register).
pub struct InstallerRegistry {
    factories: BTreeMap<&'static str, InstallerFactory>,
}

impl InstallerRegistry {
    /// A registry holding the built-in web and FTPS installers.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self {
            factories: BTreeMap::new(),
        };
        registry.register(INSTALLER_WEB, |adapter, confirm| {
            Box::new(WebInstaller::new(adapter, confirm))
        });
        registry.register(INSTALLER_FTPS, |adapter, _confirm| {
            Box::new(FtpsInstaller::new(adapter))
        });
        registry
    }

    /// Register (or replace) a factory under `key`.
    pub fn register(&mut self, key: &'static str, factory: InstallerFactory) {
        self.factories.insert(key, factory);
    }

    /// Instantiate the installer registered under `key`.
    #[must_use]
    pub fn create(
        &self,
        key: &str,
        adapter: Arc<dyn InventoryAdapter>,
        confirm: Arc<dyn ConfirmIpBinding>,
    ) -> Option<Box<dyn Install>> {
        self.factories
            .get(key)
            .map(|factory| factory(adapter, confirm))
    }

    /// The registered keys, in stable order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}

impl Default for InstallerRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Convenience: a non-interactive confirmation policy.
///
/// `accept_ip` controls whether IP-specific https creations are allowed
/// automatically or blocked for later operator action.
#[must_use]
pub fn auto_confirm(accept_ip: bool) -> Arc<dyn ConfirmIpBinding> {
    Arc::new(AutoConfirm(accept_ip))
}

#[cfg(test)]
#[path = "installer_tests.rs"]
mod installer_tests;
