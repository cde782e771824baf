// Copyright (c) 2026 the certsync authors
// SPDX-License-Identifier: MIT

//! JSON-file inventory adapter.
//!
//! Persists the whole [`Inventory`] snapshot as pretty-printed JSON.
//! Used by the CLI to reconcile against a file-backed inventory and as a
//! simple interchange format with out-of-process backends. The adapter
//! caches the parsed inventory between loads; `refresh` drops the cache
//! so the next load re-reads the file.

use super::{Inventory, InventoryAdapter};
use crate::errors::AdapterError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, info};

/// Adapter over a JSON inventory file.
pub struct FileAdapter {
    path: PathBuf,
    cache: Mutex<Option<Inventory>>,
}

impl FileAdapter {
    /// Create an adapter for `path`. The file is read lazily on first load.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl InventoryAdapter for FileAdapter {
    async fn load(&self) -> Result<Inventory, AdapterError> {
        if let Some(cached) = self.cache.lock().expect("cache lock poisoned").clone() {
            debug!(path = %self.path.display(), "Serving cached inventory");
            return Ok(cached);
        }
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let mut inventory: Inventory = serde_json::from_str(&raw)?;
        inventory.sites.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(
            path = %self.path.display(),
            sites = inventory.sites.len(),
            "Loaded inventory from file"
        );
        *self.cache.lock().expect("cache lock poisoned") = Some(inventory.clone());
        Ok(inventory)
    }

    async fn commit(&self, staged: &Inventory) -> Result<(), AdapterError> {
        let rendered = serde_json::to_string_pretty(staged)?;
        tokio::fs::write(&self.path, rendered).await?;
        info!(path = %self.path.display(), "Committed inventory to file");
        Ok(())
    }

    async fn refresh(&self) {
        *self.cache.lock().expect("cache lock poisoned") = None;
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod file_tests;
