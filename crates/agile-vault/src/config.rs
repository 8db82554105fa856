//! Engine configuration, stored as plain JSON outside any vault.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::keys::FallbackPolicy;
use crate::reader::DEFAULT_MAX_ENTRY_BYTES;

/// Tunables for a [`VaultSession`](crate::VaultSession).
///
/// All fields have defaults via [`Default`], so a partial file is valid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Key selection when an entry's security level has no exact key.
    #[serde(default)]
    pub fallback_policy: FallbackPolicy,

    /// Largest per-entry file the reader accepts, in bytes.
    #[serde(default = "default_max_entry_bytes")]
    pub max_entry_bytes: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fallback_policy: FallbackPolicy::default(),
            max_entry_bytes: default_max_entry_bytes(),
        }
    }
}

const fn default_max_entry_bytes() -> u64 {
    DEFAULT_MAX_ENTRY_BYTES
}

impl EngineConfig {
    /// Load configuration from a JSON file.
    ///
    /// Returns [`Default::default()`] when the file is missing or
    /// contains invalid JSON.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "config unreadable, using defaults");
                return Self::default();
            }
        };
        serde_json::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "config corrupt, using defaults");
            Self::default()
        })
    }
}
