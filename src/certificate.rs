// Copyright (c) 2026 the certsync authors
// SPDX-License-Identifier: MIT

//! Certificate references.
//!
//! The reconciler never touches certificate bytes; it works with a
//! [`Thumbprint`] (the content hash used as the store lookup key) and the
//! name of the store holding the private key. Both arrive from upstream
//! collaborators (the ACME client and the store plugin).

use chrono::{DateTime, Utc};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A malformed thumbprint string.
#[derive(Error, Debug, Clone)]
#[error("invalid thumbprint '{value}': {reason}")]
pub struct ThumbprintError {
    /// The rejected input
    pub value: String,
    /// Why it was rejected
    pub reason: String,
}

/// Content hash of a certificate, used as its lookup key in a store.
///
/// Stored as raw bytes; displayed and parsed as hex, case-insensitively.
/// Two thumbprints are equal when their bytes are equal, regardless of
/// the casing they were parsed from.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Thumbprint(Vec<u8>);

impl Thumbprint {
    /// Wrap raw hash bytes produced elsewhere.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Derive a thumbprint from raw certificate DER bytes (SHA-256).
    #[must_use]
    pub fn from_der(der: &[u8]) -> Self {
        Self(Sha256::digest(der).to_vec())
    }

    /// The raw hash bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Thumbprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Thumbprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Thumbprint({self})")
    }
}

impl FromStr for Thumbprint {
    type Err = ThumbprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        if cleaned.is_empty() {
            return Err(ThumbprintError {
                value: s.to_string(),
                reason: "empty".to_string(),
            });
        }
        if cleaned.len() % 2 != 0 {
            return Err(ThumbprintError {
                value: s.to_string(),
                reason: "odd number of hex digits".to_string(),
            });
        }
        let mut bytes = Vec::with_capacity(cleaned.len() / 2);
        for chunk in cleaned.as_bytes().chunks(2) {
            let pair = std::str::from_utf8(chunk).expect("hex chunk is ascii");
            let byte = u8::from_str_radix(pair, 16).map_err(|_| ThumbprintError {
                value: s.to_string(),
                reason: format!("'{pair}' is not a hex byte"),
            })?;
            bytes.push(byte);
        }
        Ok(Self(bytes))
    }
}

impl Serialize for Thumbprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Thumbprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(D::Error::custom)
    }
}

/// A reference to an X.509 certificate held in a store.
///
/// The reconciler receives exactly two of these per pass: the newly
/// issued certificate (required) and the certificate being superseded
/// (absent on first issuance).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateInfo {
    /// Content hash of the public certificate
    pub thumbprint: Thumbprint,
    /// The logical/physical store holding the private key
    pub store_name: String,
    /// Human-readable name, if the store recorded one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    /// Not valid before
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,
    /// Not valid after
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_after: Option<DateTime<Utc>>,
}

impl CertificateInfo {
    /// Build a certificate reference from an existing thumbprint.
    #[must_use]
    pub fn new(thumbprint: Thumbprint, store_name: impl Into<String>) -> Self {
        Self {
            thumbprint,
            store_name: store_name.into(),
            friendly_name: None,
            not_before: None,
            not_after: None,
        }
    }

    /// Build a certificate reference by hashing raw DER bytes.
    #[must_use]
    pub fn from_der(der: &[u8], store_name: impl Into<String>) -> Self {
        Self::new(Thumbprint::from_der(der), store_name)
    }

    /// Whether the certificate has expired at `now`.
    ///
    /// Unknown validity (no `not_after`) is treated as not expired; the
    /// reconciler installs whatever upstream hands it.
    #[must_use]
    pub fn expired_at(&self, now: DateTime<Utc>) -> bool {
        self.not_after.is_some_and(|t| t < now)
    }
}

#[cfg(test)]
#[path = "certificate_tests.rs"]
mod certificate_tests;
