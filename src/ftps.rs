// Copyright (c) 2026 the certsync authors
// SPDX-License-Identifier: MIT

//! Secondary-service (FTPS) reconciliation.
//!
//! FTPS carries no host concept: each ftp-capable site has one SSL
//! configuration element, plus a site-wide default that sites inherit
//! from. The decision rule, evaluated independently for the default and
//! for each site:
//!
//! - An element owned by the installation target updates whenever its
//!   certificate reference differs from the new certificate.
//! - Any other element updates only when its thumbprint exactly equals
//!   the superseded certificate's, mirroring the cross-site migration of
//!   the web reconciler.
//!
//! The site-wide default participates under [`DEFAULT_FTPS_SITE_ID`].
//! Same staging, single-commit, and abort semantics as the web engine.

use crate::certificate::CertificateInfo;
use crate::constants::DEFAULT_FTPS_SITE_ID;
use crate::errors::ReconcileError;
use crate::inventory::{store_name_eq, FtpsSslConfig, InventoryAdapter, Session};
use tracing::{debug, error, info};

/// Reconcile the FTPS certificate references across the inventory.
///
/// Returns the number of committed configuration changes. Zero staged
/// changes skip the commit; the adapter cache is invalidated on every
/// exit path.
///
/// # Errors
///
/// [`ReconcileError::Adapter`] on a load or commit failure.
pub async fn reconcile_ftps(
    adapter: &dyn InventoryAdapter,
    install_site_id: u64,
    new_cert: &CertificateInfo,
    old_cert: Option<&CertificateInfo>,
) -> Result<usize, ReconcileError> {
    let mut session = Session::open(adapter).await?;
    let staged = stage_ftps_updates(&mut session, install_site_id, new_cert, old_cert);
    if staged > 0 {
        info!("Committing {} ftp site changes", staged);
    } else {
        debug!("No ftp site changes needed");
    }
    match session.commit().await {
        Ok(changed) => Ok(changed),
        Err(err) => {
            error!("FTPS reconciliation failed at commit: {err}");
            Err(err.into())
        }
    }
}

/// Stage qualifying updates on the default element and every ftp site.
fn stage_ftps_updates(
    session: &mut Session<'_>,
    install_site_id: u64,
    new_cert: &CertificateInfo,
    old_cert: Option<&CertificateInfo>,
) -> usize {
    let mut staged = 0;
    let inventory = session.inventory_mut();

    if requires_update(
        &inventory.ftp_defaults,
        DEFAULT_FTPS_SITE_ID,
        install_site_id,
        new_cert,
        old_cert,
    ) {
        inventory
            .ftp_defaults
            .assign(new_cert.thumbprint.clone(), &new_cert.store_name);
        info!("Updating default ftp site settings");
        staged += 1;
    } else {
        debug!("No update needed for default ftp site settings");
    }

    for site in &mut inventory.sites {
        let Some(ssl) = site.ftp_ssl.as_mut() else {
            continue;
        };
        if requires_update(ssl, site.id, install_site_id, new_cert, old_cert) {
            ssl.assign(new_cert.thumbprint.clone(), &new_cert.store_name);
            info!("Updating ftp site {}", site.name);
            staged += 1;
        } else {
            debug!("No update needed for ftp site {}", site.name);
        }
    }

    session.add_staged(staged);
    staged
}

/// The FTPS decision rule for one configuration element.
fn requires_update(
    element: &FtpsSslConfig,
    element_site_id: u64,
    install_site_id: u64,
    new_cert: &CertificateInfo,
    old_cert: Option<&CertificateInfo>,
) -> bool {
    if element_site_id == install_site_id {
        element.server_cert_hash.as_ref() != Some(&new_cert.thumbprint)
            || !store_name_eq(
                element.server_cert_store.as_deref(),
                Some(&new_cert.store_name),
            )
    } else {
        match old_cert {
            Some(old) => element.server_cert_hash.as_ref() == Some(&old.thumbprint),
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "ftps_tests.rs"]
mod ftps_tests;
