//! `agile-vault` — Read-only engine for legacy AgileKeychain vaults.
//!
//! Parses the on-disk format, unlocks the per-level master keys with the
//! user's password, and decrypts entries on demand. Nothing is ever written
//! back to the vault.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod config;
pub mod document;
pub mod error;

pub mod reader;

pub mod keys;

pub mod items;

pub mod listing;

pub mod session;

pub use config::EngineConfig;
pub use document::Document;
pub use error::VaultError;
pub use items::{
    decrypt_entry, form_fields, type_label, DecryptedEntry, DisplayField, FormField, GenericView,
    ItemCategory, ItemView, LoginView, PasswordView, Payload, SecureNoteView,
};
pub use keys::{unlock, FallbackPolicy, UnlockedKeyMap};
pub use listing::{category_counts, reconcile, search, Reconciliation};
pub use reader::{
    check_directory, dewrap, list_entry_ids, read_entry, read_entry_limited, read_index,
    read_key_bundle, validate_directory, DirectoryIssue, IndexEntry, KeyBundle, KeyEntry,
    RawEntry,
};
pub use session::VaultSession;
