// Copyright (c) 2026 the certsync authors
// SPDX-License-Identifier: MIT

//! Desired-host identifiers.
//!
//! A certificate covers a set of identifiers: DNS names (possibly
//! wildcards) and literal IP addresses. Bindings store their host as a
//! plain string, so matching is always case-insensitive on the ASCII
//! range, mirroring how web server administration APIs compare hosts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// A single desired host: a DNS name or an IP address.
///
/// Immutable value type. DNS names are normalized to lowercase when
/// parsed so that equality and host matching never depend on the casing
/// the upstream collaborator happened to use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    /// An IP address identifier
    Ip(IpAddr),
    /// A DNS name identifier, stored lowercase
    Dns(String),
}

impl Identifier {
    /// Parse an identifier from its textual form.
    ///
    /// Anything that parses as an IP address becomes [`Identifier::Ip`];
    /// everything else is treated as a DNS name and lowercased.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.parse::<IpAddr>() {
            Ok(ip) => Self::Ip(ip),
            Err(_) => Self::Dns(value.trim().to_ascii_lowercase()),
        }
    }

    /// The textual form used for binding hosts and log output.
    #[must_use]
    pub fn value(&self) -> String {
        match self {
            Self::Ip(ip) => ip.to_string(),
            Self::Dns(name) => name.clone(),
        }
    }

    /// Case-insensitive comparison against a binding's host field.
    #[must_use]
    pub fn matches_host(&self, host: &str) -> bool {
        match self {
            Self::Ip(ip) => host
                .parse::<IpAddr>()
                .map_or_else(|_| host.eq_ignore_ascii_case(&ip.to_string()), |h| h == *ip),
            Self::Dns(name) => host.eq_ignore_ascii_case(name),
        }
    }

    /// Whether this is a wildcard DNS identifier (`*.example.com`).
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Dns(name) if name.starts_with("*."))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip(ip) => write!(f, "{ip}"),
            Self::Dns(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

#[cfg(test)]
#[path = "identifier_tests.rs"]
mod identifier_tests;
