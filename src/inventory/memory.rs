// Copyright (c) 2026 the certsync authors
// SPDX-License-Identifier: MIT

//! In-memory inventory adapter.
//!
//! Reference implementation of [`InventoryAdapter`] and the test double
//! for the reconcilers. Keeps an authoritative [`Inventory`] behind a
//! mutex, serves snapshots of it, and atomically replaces it on commit.
//! Commit failures can be injected to exercise abort paths, and load /
//! refresh counters let tests assert the cache-invalidation contract.

use super::{Inventory, InventoryAdapter, Site};
use crate::errors::AdapterError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// Adapter over an in-memory inventory.
pub struct MemoryAdapter {
    state: Mutex<Inventory>,
    fail_next_commit: AtomicBool,
    loads: AtomicUsize,
    commits: AtomicUsize,
    refreshes: AtomicUsize,
}

impl MemoryAdapter {
    /// Wrap an inventory. Sites are sorted by name so the snapshot order
    /// is stable, matching what real administration backends report.
    #[must_use]
    pub fn new(mut inventory: Inventory) -> Self {
        inventory.sites.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            state: Mutex::new(inventory),
            fail_next_commit: AtomicBool::new(false),
            loads: AtomicUsize::new(0),
            commits: AtomicUsize::new(0),
            refreshes: AtomicUsize::new(0),
        }
    }

    /// The current authoritative inventory.
    #[must_use]
    pub fn snapshot(&self) -> Inventory {
        self.state.lock().expect("inventory lock poisoned").clone()
    }

    /// A site from the current authoritative inventory.
    #[must_use]
    pub fn site(&self, id: u64) -> Option<Site> {
        self.snapshot().site(id).cloned()
    }

    /// Make the next commit fail with a rejection.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// How many times the inventory has been loaded.
    #[must_use]
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// How many commits have been accepted.
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// How many times the cache has been invalidated.
    #[must_use]
    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InventoryAdapter for MemoryAdapter {
    async fn load(&self) -> Result<Inventory, AdapterError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot())
    }

    async fn commit(&self, staged: &Inventory) -> Result<(), AdapterError> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(AdapterError::CommitRejected {
                reason: "injected commit failure".to_string(),
            });
        }
        let mut state = self.state.lock().expect("inventory lock poisoned");
        *state = staged.clone();
        self.commits.fetch_add(1, Ordering::SeqCst);
        debug!(sites = staged.sites.len(), "Committed in-memory inventory");
        Ok(())
    }

    async fn refresh(&self) {
        // Snapshots are built per load, so invalidation only needs counting.
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod memory_tests;
