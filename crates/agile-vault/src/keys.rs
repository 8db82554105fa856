//! Master-password unlock and the per-session key map.
//!
//! Each key entry is opened in two phases:
//!
//! 1. PBKDF2-HMAC-SHA1 of the password over the entry's salt yields an
//!    AES-128 key and IV that decrypt the candidate master key.
//! 2. The candidate must re-open the entry's validation blob (via the MD5
//!    stretch) to itself. Only then is it accepted.
//!
//! Unlock is all-or-nothing: any entry failing either phase fails the
//! whole call with [`VaultError::Authentication`].

use std::collections::BTreeMap;
use std::fmt;

use agile_crypto_core::salted::SaltedContainer;
use agile_crypto_core::{kdf, symmetric, CryptoError, SecretBuffer};
use serde::{Deserialize, Serialize};

use crate::error::VaultError;
use crate::reader::{KeyBundle, KeyEntry};

/// How a missing security level is resolved to a key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FallbackPolicy {
    /// Fall back to the bundle's SL5 key, then its SL3 key, then the
    /// lexicographically smallest alias.
    #[default]
    BundleDefault,
    /// Exact matches only.
    Strict,
}

/// Decrypted master keys addressable by security level or identifier.
///
/// Both aliases of one key share a single [`SecretBuffer`]. Keys are
/// zeroized on [`clear`](Self::clear) and on drop.
pub struct UnlockedKeyMap {
    keys: Vec<SecretBuffer>,
    aliases: BTreeMap<String, usize>,
    defaults: Vec<String>,
}

impl UnlockedKeyMap {
    fn with_defaults(defaults: Vec<String>) -> Self {
        Self {
            keys: Vec::new(),
            aliases: BTreeMap::new(),
            defaults,
        }
    }

    fn insert(&mut self, entry: &KeyEntry, key: SecretBuffer) {
        let slot = self.keys.len();
        self.keys.push(key);
        for alias in [&entry.security_level, &entry.identifier] {
            if !alias.is_empty() {
                self.aliases.insert(alias.clone(), slot);
            }
        }
    }

    /// Exact lookup by security level or key identifier.
    #[must_use]
    pub fn get(&self, alias: &str) -> Option<&SecretBuffer> {
        self.aliases.get(alias).and_then(|&slot| self.keys.get(slot))
    }

    /// Resolve the key for `level`, applying `policy` when there is no
    /// exact match.
    #[must_use]
    pub fn resolve(&self, level: &str, policy: FallbackPolicy) -> Option<&SecretBuffer> {
        if let Some(key) = self.get(level) {
            return Some(key);
        }
        if policy == FallbackPolicy::Strict {
            return None;
        }
        self.defaults
            .iter()
            .find_map(|id| self.get(id))
            .or_else(|| self.aliases.values().next().and_then(|&slot| self.keys.get(slot)))
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// `true` when no key is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Every alias, sorted.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.aliases.keys().map(String::as_str)
    }

    /// Zeroize and drop every key.
    pub fn clear(&mut self) {
        // SecretBuffer zeroizes on drop.
        self.keys.clear();
        self.aliases.clear();
    }
}

impl fmt::Debug for UnlockedKeyMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnlockedKeyMap")
            .field("keys", &self.keys.len())
            .field("aliases", &self.aliases.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Unlock every key entry in `bundle` with `password`.
///
/// # Errors
///
/// Returns `VaultError::Authentication` if the bundle is empty or any entry
/// fails to decrypt or validate. The underlying cause is logged at `debug`
/// only.
pub fn unlock(password: &[u8], bundle: &KeyBundle) -> Result<UnlockedKeyMap, VaultError> {
    if bundle.entries.is_empty() {
        tracing::debug!("key bundle has no entries");
        return Err(VaultError::Authentication);
    }

    let mut map = UnlockedKeyMap::with_defaults(bundle.default_identifiers());
    for entry in &bundle.entries {
        match open_key_entry(password, entry) {
            Ok(key) => map.insert(entry, key),
            Err(cause) => {
                tracing::debug!(key = %entry.identifier, %cause, "key entry rejected");
                // `map` drops here, zeroizing keys already opened.
                return Err(VaultError::Authentication);
            }
        }
    }
    Ok(map)
}

fn open_key_entry(password: &[u8], entry: &KeyEntry) -> Result<SecretBuffer, CryptoError> {
    let sealed = SaltedContainer::from_bytes(&entry.encrypted_key)?;
    let key_iv = kdf::pbkdf2_sha1(password, &sealed.salt, entry.iterations)?;
    let candidate = symmetric::decrypt(&sealed.ciphertext, &key_iv)?;

    let validation = SaltedContainer::from_bytes(&entry.validation)?;
    let echoed = validation.open_stretched(candidate.expose())?;
    if !candidate.ct_eq(echoed.expose()) {
        return Err(CryptoError::InvalidKeyMaterial(
            "validation does not match candidate key".into(),
        ));
    }
    Ok(candidate)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
