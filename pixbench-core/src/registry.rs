//! Backend Registry
//!
//! The set of backends a benchmark runs against. Built once before
//! orchestration and shared read-only between workers.

use crate::backend::Backend;
use crate::backends::{ImageOpsBackend, LibWebpBackend, ThumbnailBackend};
use std::sync::Arc;
use thiserror::Error;

/// A backend identifier that is not registered
#[derive(Debug, Clone, Error)]
#[error("unknown backend '{requested}' (available: {})", available.join(", "))]
pub struct UnknownBackend {
    /// Identifier that was asked for
    pub requested: String,
    /// Identifiers that exist
    pub available: Vec<String>,
}

/// Read-only list of backends
#[derive(Clone)]
pub struct BackendRegistry {
    backends: Vec<Arc<dyn Backend>>,
}

impl BackendRegistry {
    /// Registry of explicitly provided backends
    pub fn new(backends: Vec<Arc<dyn Backend>>) -> Self {
        Self { backends }
    }

    /// All built-in backends
    pub fn builtin() -> Self {
        Self::new(vec![
            Arc::new(ImageOpsBackend),
            Arc::new(ThumbnailBackend),
            Arc::new(LibWebpBackend),
        ])
    }

    /// Narrow this registry to `ids`, in the order given
    ///
    /// Duplicate identifiers are collapsed so a backend never runs twice for
    /// the same input.
    pub fn select<S: AsRef<str>>(&self, ids: &[S]) -> Result<Self, UnknownBackend> {
        let mut selected: Vec<Arc<dyn Backend>> = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.as_ref();
            let backend = self.get(id).ok_or_else(|| UnknownBackend {
                requested: id.to_string(),
                available: self.ids().iter().map(|s| s.to_string()).collect(),
            })?;
            if !selected.iter().any(|b| b.id() == id) {
                selected.push(backend);
            }
        }
        Ok(Self::new(selected))
    }

    /// Look up a backend by identifier
    pub fn get(&self, id: &str) -> Option<Arc<dyn Backend>> {
        self.backends.iter().find(|b| b.id() == id).cloned()
    }

    /// Registered identifiers, in registration order
    pub fn ids(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.id()).collect()
    }

    /// Iterate over registered backends
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Backend>> {
        self.backends.iter()
    }

    /// Number of registered backends
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Whether no backend is registered
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}
