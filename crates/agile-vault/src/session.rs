//! One open vault: directory, parsed index and key bundle, optional keys.
//!
//! A session starts locked. [`VaultSession::unlock`] installs an
//! [`UnlockedKeyMap`]; [`VaultSession::lock`] and `Drop` zeroize it.
//! Decryption borrows the session immutably and may run from several
//! threads at once; unlock and lock need `&mut self`.

use std::path::{Path, PathBuf};

use crate::config::EngineConfig;
use crate::error::VaultError;
use crate::items::{self, DecryptedEntry};
use crate::keys::{self, UnlockedKeyMap};
use crate::reader::{self, IndexEntry, KeyBundle, KEYCHAIN_EXTENSION};

/// An open AgileKeychain directory.
#[derive(Debug)]
pub struct VaultSession {
    path: PathBuf,
    index: Vec<IndexEntry>,
    bundle: KeyBundle,
    config: EngineConfig,
    keys: Option<UnlockedKeyMap>,
}

impl VaultSession {
    /// Open a vault directory and parse its index and key bundle.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::NotFound` (with the reason) if the path is not
    /// a valid keychain directory, or any error from reading the index or
    /// key bundle.
    pub fn open(path: &Path, config: EngineConfig) -> Result<Self, VaultError> {
        let path = trim_trailing_separators(path);
        reader::check_directory(&path).map_err(|issue| {
            tracing::debug!(path = %path.display(), reason = %issue, "open rejected");
            VaultError::NotFound(format!("{}: {issue}", path.display()))
        })?;

        let index = reader::read_index(&path)?;
        let bundle = reader::read_key_bundle(&path)?;
        tracing::info!(
            path = %path.display(),
            entries = index.len(),
            keys = bundle.entries.len(),
            "vault opened"
        );

        Ok(Self {
            path,
            index,
            bundle,
            config,
            keys: None,
        })
    }

    /// Directory basename without the `.agilekeychain` extension.
    #[must_use]
    pub fn name(&self) -> &str {
        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        file_name
            .strip_suffix(KEYCHAIN_EXTENSION)
            .and_then(|stem| stem.strip_suffix('.'))
            .unwrap_or(file_name)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn index(&self) -> &[IndexEntry] {
        &self.index
    }

    #[must_use]
    pub fn key_bundle(&self) -> &KeyBundle {
        &self.bundle
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of index rows, trashed ones included.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub const fn is_unlocked(&self) -> bool {
        self.keys.is_some()
    }

    /// Unlock with the master password.
    ///
    /// On failure the previous key map, if any, is left in place.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Authentication` if the password is wrong.
    pub fn unlock(&mut self, password: &[u8]) -> Result<(), VaultError> {
        let map = keys::unlock(password, &self.bundle)?;
        tracing::info!(vault = %self.name(), keys = map.len(), "vault unlocked");
        if let Some(mut previous) = self.keys.replace(map) {
            previous.clear();
        }
        Ok(())
    }

    /// Zeroize and discard the key map. Idempotent.
    pub fn lock(&mut self) {
        if let Some(mut map) = self.keys.take() {
            map.clear();
            tracing::info!(vault = %self.name(), "vault locked");
        }
    }

    /// Read and decrypt one entry.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Locked` (before touching the disk) when locked,
    /// `VaultError::NotFound` if the entry file is absent, and
    /// `VaultError::Format` for a malformed entry file. Payload failures
    /// are reported inside the returned entry.
    pub fn decrypt_entry(&self, uuid: &str) -> Result<DecryptedEntry, VaultError> {
        let keys = self.keys.as_ref().ok_or(VaultError::Locked)?;
        let raw = reader::read_entry_limited(&self.path, uuid, self.config.max_entry_bytes)?;
        items::decrypt_entry(&raw, keys, self.config.fallback_policy)
    }

    /// Identifiers of the entry files on disk, sorted.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::NotFound` if `data/default` vanished.
    pub fn list_entry_ids(&self) -> Result<Vec<String>, VaultError> {
        reader::list_entry_ids(&self.path)
    }
}

impl Drop for VaultSession {
    fn drop(&mut self) {
        self.lock();
    }
}

fn trim_trailing_separators(path: &Path) -> PathBuf {
    // `components()` already ignores a trailing separator.
    path.components().collect()
}
