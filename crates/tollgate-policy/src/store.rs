//! Cached policy snapshot with atomic reload.
//!
//! [`PolicyStore`] holds the active [`PolicyConfig`] behind an `RwLock`
//! around an `Arc`. Readers clone the `Arc` and evaluate against a
//! consistent snapshot; `reload` validates the replacement fully before
//! swapping, so no reader ever observes a half-updated policy and a
//! corrupt replacement leaves the previous policy active.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use crate::error::PolicyResult;
use crate::loader;
use crate::types::PolicyConfig;

/// Thread-safe cache of the active policy snapshot.
///
/// Inject an instance wherever policy decisions are made rather than
/// reaching for a module-level global; reload and test isolation then
/// never require a process restart.
pub struct PolicyStore {
    snapshot: RwLock<Arc<PolicyConfig>>,
    source_path: Option<PathBuf>,
}

impl PolicyStore {
    /// Create a store from an already-validated config.
    #[must_use]
    pub fn new(config: PolicyConfig) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(config)),
            source_path: None,
        }
    }

    /// Load, validate, and cache a policy from a file path.
    ///
    /// # Errors
    ///
    /// Propagates any [`crate::PolicyError`] from the loader; on error no
    /// store is created and nothing can be authorized.
    pub fn load_from_path(path: impl AsRef<Path>) -> PolicyResult<Self> {
        let path = path.as_ref();
        let config = loader::load_from_path(path)?;
        Ok(Self {
            snapshot: RwLock::new(Arc::new(config)),
            source_path: Some(path.to_path_buf()),
        })
    }

    /// Load, validate, and cache a policy from a JSON string.
    ///
    /// # Errors
    ///
    /// Propagates any [`crate::PolicyError`] from the loader.
    pub fn load_from_str(raw: &str) -> PolicyResult<Self> {
        Ok(Self::new(loader::load_from_str(raw)?))
    }

    /// Get the current policy snapshot.
    ///
    /// The returned `Arc` stays consistent for the caller even if a
    /// reload swaps the store underneath it.
    #[must_use]
    pub fn current(&self) -> Arc<PolicyConfig> {
        let guard = self.snapshot.read().unwrap_or_else(|e| {
            warn!("PolicyStore read lock poisoned, recovering");
            e.into_inner()
        });
        Arc::clone(&guard)
    }

    /// Re-validate and atomically swap in a new policy from a JSON string.
    ///
    /// # Errors
    ///
    /// On any load or validation error the active snapshot is untouched.
    pub fn reload_from_str(&self, raw: &str) -> PolicyResult<()> {
        let config = loader::load_from_str(raw)?;
        self.swap(config);
        Ok(())
    }

    /// Re-validate and atomically swap in a new policy from a path.
    ///
    /// Defaults to the path the store was originally loaded from.
    ///
    /// # Errors
    ///
    /// On any load or validation error the active snapshot is untouched.
    pub fn reload_from_path(&self, path: Option<&Path>) -> PolicyResult<()> {
        let path = match (path, &self.source_path) {
            (Some(p), _) => p.to_path_buf(),
            (None, Some(p)) => p.clone(),
            (None, None) => {
                return Err(crate::PolicyError::Io {
                    path: "<none>".to_string(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "store has no source path to reload from",
                    ),
                });
            },
        };
        let config = loader::load_from_path(&path)?;
        self.swap(config);
        Ok(())
    }

    fn swap(&self, config: PolicyConfig) {
        let mut guard = self.snapshot.write().unwrap_or_else(|e| {
            warn!("PolicyStore write lock poisoned, recovering");
            e.into_inner()
        });
        *guard = Arc::new(config);
        info!(version = guard.version, "policy snapshot swapped");
    }
}

impl std::fmt::Debug for PolicyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyStore")
            .field("source_path", &self.source_path)
            .finish_non_exhaustive()
    }
}
