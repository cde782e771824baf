// Copyright (c) 2026 the certsync authors
// SPDX-License-Identifier: MIT

//! The unit of work handed to an installer.
//!
//! A [`Target`] is produced by upstream plugins (target selection,
//! validation, ordering) and consumed read-only here: the reconciler only
//! needs the desired host set and the installation site reference.

use crate::identifier::Identifier;
use serde::{Deserialize, Serialize};

/// One source part of a target.
///
/// Parts carry their own identifiers and, when the target was sourced
/// from an existing site, a reference to that site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetPart {
    /// Identifiers contributed by this part
    pub identifiers: Vec<Identifier>,
    /// The site this part was sourced from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<u64>,
}

/// The unit of work: a common name, its alternative names, and the parts
/// it was assembled from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// The certificate's common name
    pub common_name: Identifier,
    /// Alternative-name identifiers covered by the certificate
    #[serde(default)]
    pub alternative_names: Vec<Identifier>,
    /// Source parts, possibly tagged with site references
    #[serde(default)]
    pub parts: Vec<TargetPart>,
}

impl Target {
    /// Build a target for a single site from plain host strings.
    #[must_use]
    pub fn new(common_name: &str, alternative_names: &[&str], site_id: Option<u64>) -> Self {
        let common_name = Identifier::parse(common_name);
        let alternative_names: Vec<Identifier> = alternative_names
            .iter()
            .map(|n| Identifier::parse(n))
            .collect();
        let mut identifiers = vec![common_name.clone()];
        identifiers.extend(alternative_names.iter().cloned());
        Self {
            common_name,
            alternative_names,
            parts: vec![TargetPart {
                identifiers,
                site_id,
            }],
        }
    }

    /// All desired hosts, common name first, deduplicated.
    #[must_use]
    pub fn hosts(&self) -> Vec<Identifier> {
        let mut hosts = vec![self.common_name.clone()];
        for name in &self.alternative_names {
            if !hosts.contains(name) {
                hosts.push(name.clone());
            }
        }
        hosts
    }

    /// The installation site: the first part that carries a site reference.
    #[must_use]
    pub fn installation_site(&self) -> Option<u64> {
        self.parts.iter().find_map(|p| p.site_id)
    }
}

#[cfg(test)]
#[path = "target_tests.rs"]
mod target_tests;
