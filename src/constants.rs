// Copyright (c) 2026 the certsync authors
// SPDX-License-Identifier: MIT

//! Global constants for the certsync engine.
//!
//! This module contains the numeric and string constants used throughout
//! the codebase, organized by category.

// ============================================================================
// Binding defaults
// ============================================================================

/// Default port for newly created https bindings
pub const DEFAULT_BINDING_PORT: u16 = 443;

/// Default IP for newly created https bindings ("all addresses")
pub const DEFAULT_BINDING_IP: &str = "*";

/// The all-zero address some backends report for an unbound http endpoint.
/// Treated the same as [`DEFAULT_BINDING_IP`] when inheriting an IP.
pub const UNSPECIFIED_IP: &str = "0.0.0.0";

// ============================================================================
// Platform version thresholds
// ============================================================================

/// First platform major version with SNI support on https bindings
pub const SNI_MIN_MAJOR: u32 = 8;

/// First platform major version with centralized certificate store support
pub const CENTRAL_SSL_MIN_MAJOR: u32 = 8;

/// Platform version (major, minor) that introduced FTPS site configuration
pub const FTPS_MIN_VERSION: (u32, u32) = (7, 5);

// ============================================================================
// Secondary-service (FTPS) configuration
// ============================================================================

/// Pseudo site id under which the site-wide default FTPS SSL configuration
/// participates in reconciliation decisions.
pub const DEFAULT_FTPS_SITE_ID: u64 = 0;

// ============================================================================
// Installer registry keys
// ============================================================================

/// Registry key for the https binding installer
pub const INSTALLER_WEB: &str = "web";

/// Registry key for the FTPS installer
pub const INSTALLER_FTPS: &str = "ftps";
