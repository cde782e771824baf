// Copyright (c) 2026 the certsync authors
// SPDX-License-Identifier: MIT

//! Error types for the binding reconciliation engine.
//!
//! This module provides specialized error types for:
//! - Inventory adapter failures (load, commit rejection, serialization)
//! - Per-host policy decisions that need operator input
//! - Fatal reconciliation failures that abort a pass before commit
//!
//! The taxonomy separates recoverable conditions (logged, the pass
//! continues) from fatal ones (the pass unwinds without committing, so the
//! live configuration is left untouched).

use thiserror::Error;

/// Errors raised by a site inventory adapter.
///
/// These represent failures of the backing store itself: reading the site
/// collection, or applying the staged batch during the terminal commit.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// The backing store could not produce or accept inventory data.
    ///
    /// Covers connection failures, a stopped administration service, or a
    /// backend-side exception while enumerating sites.
    #[error("inventory backend error: {reason}")]
    Backend {
        /// Backend-provided description of the failure
        reason: String,
    },

    /// The backing store rejected the staged batch during commit.
    ///
    /// Nothing from the staged batch has been made durable. The engine
    /// never retries a rejected commit; retry policy belongs to the
    /// calling orchestrator.
    #[error("inventory backend rejected the staged changes: {reason}")]
    CommitRejected {
        /// Backend-provided rejection reason
        reason: String,
    },

    /// Inventory data could not be serialized or deserialized.
    #[error("invalid inventory data: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O failure while reading or writing inventory data.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AdapterError {
    /// Returns true if this error is a commit rejection, i.e. the staged
    /// batch reached the backend and was refused there.
    #[must_use]
    pub fn is_commit_rejection(&self) -> bool {
        matches!(self, Self::CommitRejected { .. })
    }
}

/// An attribute value that cannot be represented on a binding.
///
/// Raised while copying non-managed attributes onto a replacement binding.
/// The policy treats this as recoverable: the attribute is dropped with a
/// warning and the update proceeds.
#[derive(Error, Debug, Clone)]
#[error("attribute '{name}' cannot be set on a binding: {reason}")]
pub struct AttributeError {
    /// The attribute name that was rejected
    pub name: String,
    /// Why the value cannot be round-tripped
    pub reason: String,
}

/// Recoverable per-host outcomes of the binding policy.
#[derive(Error, Debug)]
pub enum PolicyError {
    /// Creating an https binding would pin it to a specific IP, which on a
    /// platform with SNI support can break unrelated https sites sharing
    /// that IP. The operator declined (or was never asked), so this host
    /// is skipped; all other hosts in the pass proceed.
    #[error(
        "https binding for '{host}' not created: the matching http binding \
         is pinned to IP {ip} and requires operator confirmation"
    )]
    CreationBlocked {
        /// The desired host that was skipped
        host: String,
        /// The IP the existing http binding is pinned to
        ip: String,
    },

    /// The injected confirmation callback itself failed (for example, an
    /// interactive prompt lost its terminal). Fatal for the pass.
    #[error("confirmation for '{host}' failed: {source}")]
    ConfirmFailed {
        /// The host whose confirmation was being requested
        host: String,
        /// The underlying callback failure
        #[source]
        source: anyhow::Error,
    },
}

/// Fatal errors raised by a reconciliation pass.
///
/// Any of these aborts the remaining work in the pass. Because mutations
/// are only staged in memory until the terminal commit, an abort before
/// commit leaves the live configuration in its pre-call state.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The target carries no installation site reference.
    #[error("target '{target}' has no installation site")]
    MissingTargetSite {
        /// The target's common name
        target: String,
    },

    /// The referenced site does not exist in the loaded inventory.
    #[error("unable to find site #{site_id} in the inventory")]
    SiteNotFound {
        /// The site id that was looked up
        site_id: u64,
    },

    /// Centralized certificate store installation was requested on a
    /// platform version that predates it.
    #[error(
        "centralized certificate store requires platform version \
         {min_major}.0 or later (found {found})"
    )]
    CentralSslUnsupported {
        /// Minimum supported major version
        min_major: u32,
        /// The version reported by the inventory backend
        found: String,
    },

    /// An unrecoverable failure while computing or staging the mutation
    /// for a single host. Work on the remaining hosts is aborted and
    /// nothing already staged is committed.
    #[error("failed to reconcile bindings for '{host}': {source}")]
    Host {
        /// The host being processed when the failure occurred
        host: String,
        /// The underlying failure
        #[source]
        source: anyhow::Error,
    },

    /// The inventory adapter failed, either while loading the site
    /// collection or while committing the staged batch.
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

impl ReconcileError {
    /// Returns true if the terminal commit was rejected by the backend.
    ///
    /// Orchestrators use this to decide whether a retry with fresh state
    /// is worthwhile: the adapter cache has already been invalidated, so a
    /// subsequent pass observes the backend's current configuration.
    #[must_use]
    pub fn is_commit_failure(&self) -> bool {
        matches!(self, Self::Adapter(e) if e.is_commit_rejection())
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
