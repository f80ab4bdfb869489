//! Last-confirmed preference state for the current user session.

use std::sync::RwLock;

use crate::errors::{Error, Result};
use crate::preferences::model::PreferenceMatrix;

/// Holds the authoritative last-known matrix for the session.
///
/// Replaced wholesale after a successful fetch or save; last write wins.
/// Exactly one save cycle is in flight per session, so no further
/// concurrent-writer protocol is needed.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    inner: RwLock<Option<PreferenceMatrix>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored snapshot wholesale.
    pub fn load(&self, matrix: PreferenceMatrix) {
        *self.inner.write().unwrap() = Some(matrix);
    }

    /// The stored snapshot, or `NotLoaded` before the first `load`.
    pub fn current(&self) -> Result<PreferenceMatrix> {
        self.inner
            .read()
            .unwrap()
            .clone()
            .ok_or(Error::NotLoaded)
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.read().unwrap().is_some()
    }
}
