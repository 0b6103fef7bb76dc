//! Context store persistence
//!
//! Context stores are serialized as pretty-printed JSON documents under a
//! contexts root, one file per directory, keyed by a fixed-length hash of
//! the absolute directory path. Field names are stable across versions and
//! unknown fields never break loading. A missing file means "start fresh";
//! a corrupt file is an error.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use directories::ProjectDirs;
use sha2::{Digest, Sha256};

use crate::context::store::ContextStore;
use crate::error::{ConfabError, Result};

/// Length of the hex-encoded context key
const CONTEXT_KEY_LENGTH: usize = 16;

/// File-backed storage for context stores
///
/// The default root is the platform data directory; tests point it at a
/// temporary directory, and `CONFAB_CONTEXT_DIR` overrides it for the
/// binary.
pub struct ContextStorage {
    root: PathBuf,
}

impl ContextStorage {
    /// Creates storage rooted at the default contexts directory
    ///
    /// Honors the `CONFAB_CONTEXT_DIR` environment variable override, which
    /// makes it easy to point the binary at a test directory without
    /// touching the user's data.
    pub fn new() -> Result<Self> {
        if let Ok(override_root) = std::env::var("CONFAB_CONTEXT_DIR") {
            return Ok(Self::with_root(override_root));
        }

        let proj_dirs = ProjectDirs::from("com", "confab-cli", "confab").ok_or_else(|| {
            ConfabError::Storage("Could not determine data directory".to_string())
        })?;

        Ok(Self::with_root(proj_dirs.data_dir().join("contexts")))
    }

    /// Creates storage rooted at the specified directory
    ///
    /// # Examples
    ///
    /// ```
    /// use confab::storage::ContextStorage;
    ///
    /// let storage = ContextStorage::with_root("/tmp/confab-test-contexts");
    /// ```
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Computes the fixed-length context key for a directory path
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use confab::storage::ContextStorage;
    ///
    /// let key = ContextStorage::context_key(Path::new("/some/project"));
    /// assert_eq!(key.len(), 16);
    /// ```
    pub fn context_key(directory: &Path) -> String {
        let mut hasher = Sha256::new();
        hasher.update(directory.display().to_string().as_bytes());
        let digest = hasher.finalize();
        hex_encode(&digest)[..CONTEXT_KEY_LENGTH].to_string()
    }

    /// Returns the backing file path for a directory's context
    pub fn context_path(&self, directory: &Path) -> PathBuf {
        self.root
            .join(format!("{}.json", Self::context_key(directory)))
    }

    /// Loads the context store for a directory
    ///
    /// A missing file yields a fresh, empty store. An unreadable or corrupt
    /// file, or a stored directory that does not match the requested one,
    /// is an error.
    pub fn load(&self, directory: &Path) -> Result<ContextStore> {
        let path = self.context_path(directory);

        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(?path, "No existing context, starting fresh");
                return Ok(ContextStore::new(directory));
            }
            Err(err) => {
                return Err(ConfabError::Storage(format!(
                    "Failed to read context file {}: {}",
                    path.display(),
                    err
                ))
                .into());
            }
        };

        let store: ContextStore = serde_json::from_str(&data).map_err(|e| {
            ConfabError::Storage(format!(
                "Failed to parse context file {}: {}",
                path.display(),
                e
            ))
        })?;

        if store.directory != directory {
            return Err(ConfabError::Storage(format!(
                "Context file directory mismatch: expected {}, got {}",
                directory.display(),
                store.directory.display()
            ))
            .into());
        }

        Ok(store)
    }

    /// Persists a context store, stamping its update time
    pub fn save(&self, store: &mut ContextStore) -> Result<()> {
        store.updated_at = Utc::now();

        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create context directory {}", self.root.display()))?;

        let path = self.context_path(&store.directory);
        let data = serde_json::to_string_pretty(store)
            .map_err(|e| ConfabError::Storage(format!("Failed to serialize context: {}", e)))?;

        fs::write(&path, data)
            .map_err(|e| {
                ConfabError::Storage(format!(
                    "Failed to write context file {}: {}",
                    path.display(),
                    e
                ))
            })?;

        tracing::debug!(?path, messages = store.messages.len(), "Context saved");
        Ok(())
    }
}

/// Lowercase hex encoding of a byte slice
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
