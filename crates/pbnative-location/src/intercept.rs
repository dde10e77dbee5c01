//! Idempotent attachment of trigger handlers.
//!
//! The page re-scans on every DOM mutation and would otherwise bind the
//! location handler to the same button again and again. A marker is
//! attached at most once per page lifetime.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct InterceptRegistry {
    markers: Mutex<HashSet<String>>,
}

impl InterceptRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` only the first time `marker` is attached.
    pub fn attach(&self, marker: &str) -> bool {
        let inserted = self
            .markers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(marker.to_string());
        if inserted {
            tracing::debug!(marker, "handler attached");
        }
        inserted
    }

    #[must_use]
    pub fn is_attached(&self, marker: &str) -> bool {
        self.markers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(marker)
    }

    /// Forget every marker after navigation; returns how many were attached.
    pub fn reset(&self) -> usize {
        let mut markers = self.markers.lock().unwrap_or_else(PoisonError::into_inner);
        let count = markers.len();
        markers.clear();
        count
    }
}
