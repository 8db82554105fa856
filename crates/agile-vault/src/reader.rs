//! AgileKeychain directory reader: validation, index, key bundle, entries.
//!
//! # Directory Layout
//!
//! ```text
//! <name>.agilekeychain/
//! └── data/default/
//!     ├── contents.js            index: array of positional tuples
//!     ├── encryptionKeys.js      key bundle (or legacy 1password.keys)
//!     └── <uuid>.1password       one encrypted entry per file
//! ```
//!
//! `contents.js` and `encryptionKeys.js` are JSON embedded in script
//! statements (`var contents = [...];`). [`dewrap`] recovers the JSON value.

use std::fs;
use std::path::{Component, Path, PathBuf};

use agile_crypto_core::salted::decode_base64;
use agile_crypto_core::DEFAULT_ITERATIONS;
use serde::Serialize;
use serde_json::Value;

use crate::document::{coerce_i64, coerce_string, field, is_truthy};
use crate::error::VaultError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Directory extension every vault must carry.
pub const KEYCHAIN_EXTENSION: &str = "agilekeychain";

/// Index file name inside `data/default`.
pub const INDEX_FILE: &str = "contents.js";

/// Key bundle file name inside `data/default`.
pub const KEYS_FILE: &str = "encryptionKeys.js";

/// Legacy key bundle file name, used when [`KEYS_FILE`] is absent.
pub const LEGACY_KEYS_FILE: &str = "1password.keys";

/// Extension of per-entry files.
pub const ENTRY_EXTENSION: &str = "1password";

/// Security level assumed when an entry or key does not declare one.
pub const DEFAULT_SECURITY_LEVEL: &str = "SL5";

/// Default upper bound on a per-entry file's size (16 MiB).
pub const DEFAULT_MAX_ENTRY_BYTES: u64 = 16 * 1024 * 1024;

/// Position of the trashed flag in an index tuple.
const TRASHED_POSITION: usize = 7;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Why a path is not a usable vault directory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryIssue {
    /// Path does not end in `.agilekeychain`.
    #[error("path does not end with .{KEYCHAIN_EXTENSION}")]
    WrongExtension,
    /// Path does not exist or is not a directory.
    #[error("not a directory")]
    NotADirectory,
    /// `data/default/contents.js` is missing.
    #[error("missing data/default/{INDEX_FILE}")]
    MissingIndex,
    /// Neither key bundle file is present.
    #[error("missing data/default/{KEYS_FILE} and {LEGACY_KEYS_FILE}")]
    MissingKeyBundle,
}

/// One row of the vault index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    /// Entry identifier (also the entry file stem).
    pub uuid: String,
    /// Legacy type name, e.g. `webforms.WebForm`.
    pub type_name: String,
    /// Display title.
    pub title: String,
    /// Primary URL or location.
    pub location: String,
    /// Last update, Unix seconds.
    pub updated_at: i64,
    /// Containing folder identifier, empty when unfiled.
    pub folder_id: String,
    /// Whether the entry sits in the trash.
    pub trashed: bool,
}

/// One encrypted master key from the key bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEntry {
    /// Key identifier, referenced by the bundle's `SL3`/`SL5` defaults.
    pub identifier: String,
    /// Security level this key protects (`SL3`, `SL5`).
    pub security_level: String,
    /// Salted container holding the master key, encrypted under PBKDF2.
    pub encrypted_key: Vec<u8>,
    /// Salted container holding the master key, encrypted under itself.
    pub validation: Vec<u8>,
    /// PBKDF2 iteration count (always ≥ 1).
    pub iterations: u32,
}

/// Parsed key bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyBundle {
    /// Key entries in file order.
    pub entries: Vec<KeyEntry>,
    /// Identifier of the default `SL3` key (may be empty).
    pub sl3: String,
    /// Identifier of the default `SL5` key (may be empty).
    pub sl5: String,
}

impl KeyBundle {
    /// Default identifiers in fallback preference order, empties skipped.
    #[must_use]
    pub fn default_identifiers(&self) -> Vec<String> {
        [&self.sl5, &self.sl3]
            .into_iter()
            .filter(|id| !id.is_empty())
            .cloned()
            .collect()
    }
}

/// One entry file as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Entry identifier.
    pub uuid: String,
    /// Legacy type name.
    pub type_name: String,
    /// Display title.
    pub title: String,
    /// Primary URL or location.
    pub location: String,
    /// Normalized location used for matching.
    pub location_key: String,
    /// Creation time, Unix seconds.
    pub created_at: i64,
    /// Last update, Unix seconds.
    pub updated_at: i64,
    /// Base64 salted container with the entry's secret fields.
    pub encrypted_payload: String,
    /// Security level whose master key encrypts the payload.
    pub security_level: String,
    /// Whether the entry sits in the trash.
    pub trashed: bool,
}

// ---------------------------------------------------------------------------
// Paths and validation
// ---------------------------------------------------------------------------

/// `data/default` inside a vault directory.
#[must_use]
pub fn data_dir(vault: &Path) -> PathBuf {
    vault.join("data").join("default")
}

/// Validate a vault directory, reporting why it is unusable.
///
/// # Errors
///
/// Returns the first [`DirectoryIssue`] found, checked in layout order.
pub fn check_directory(vault: &Path) -> Result<(), DirectoryIssue> {
    if vault.extension().and_then(|ext| ext.to_str()) != Some(KEYCHAIN_EXTENSION) {
        return Err(DirectoryIssue::WrongExtension);
    }
    if !vault.is_dir() {
        return Err(DirectoryIssue::NotADirectory);
    }
    let data = data_dir(vault);
    if !data.join(INDEX_FILE).is_file() {
        return Err(DirectoryIssue::MissingIndex);
    }
    if !data.join(KEYS_FILE).is_file() && !data.join(LEGACY_KEYS_FILE).is_file() {
        return Err(DirectoryIssue::MissingKeyBundle);
    }
    Ok(())
}

/// `true` iff `vault` is a readable AgileKeychain directory.
///
/// Never errors; the failure reason is logged at `debug`.
#[must_use]
pub fn validate_directory(vault: &Path) -> bool {
    match check_directory(vault) {
        Ok(()) => true,
        Err(issue) => {
            tracing::debug!(path = %vault.display(), reason = %issue, "not a keychain directory");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// De-wrapping
// ---------------------------------------------------------------------------

/// Strip a script-statement wrapper and parse the JSON value inside.
///
/// Finds the first `[` or `{`, drops everything before it, trims, then
/// removes trailing `;` (and whitespace between them) before parsing.
///
/// # Errors
///
/// Returns `VaultError::Format` if no bracket is present or the remaining
/// text is not valid JSON.
pub fn dewrap(raw: &str) -> Result<Value, VaultError> {
    let start = raw
        .find(['[', '{'])
        .ok_or_else(|| VaultError::Format("no JSON value found".into()))?;

    let mut cleaned = raw[start..].trim();
    while let Some(stripped) = cleaned.strip_suffix(';') {
        cleaned = stripped.trim_end();
    }

    serde_json::from_str(cleaned).map_err(|e| VaultError::Format(format!("invalid JSON: {e}")))
}

fn read_dewrapped(path: &Path, what: &str) -> Result<Value, VaultError> {
    let bytes = fs::read(path).map_err(|e| VaultError::from_io(e, what))?;
    let raw = String::from_utf8_lossy(&bytes);
    dewrap(&raw).map_err(|e| match e {
        VaultError::Format(msg) => VaultError::Format(format!("{what}: {msg}")),
        other => other,
    })
}

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

/// Read `contents.js` into index rows.
///
/// Tuple layout: `[uuid, typeName, title, location, updatedAt, folderUuid,
/// <unused>, trashed]`. Short or mistyped rows are coerced, never rejected.
///
/// # Errors
///
/// Returns `VaultError::NotFound` if the file is missing and
/// `VaultError::Format` if it does not hold a JSON array.
pub fn read_index(vault: &Path) -> Result<Vec<IndexEntry>, VaultError> {
    let json = read_dewrapped(&data_dir(vault).join(INDEX_FILE), INDEX_FILE)?;
    let Value::Array(rows) = json else {
        return Err(VaultError::Format(format!(
            "{INDEX_FILE} does not contain an array"
        )));
    };

    let entries: Vec<IndexEntry> = rows.iter().map(index_row).collect();
    tracing::debug!(entries = entries.len(), "index parsed");
    Ok(entries)
}

fn index_row(row: &Value) -> IndexEntry {
    let cells: &[Value] = row.as_array().map_or(&[], Vec::as_slice);
    let at = |i: usize| cells.get(i);

    let trashed = matches!(at(TRASHED_POSITION), Some(Value::Bool(true)))
        || matches!(at(TRASHED_POSITION), Some(Value::String(s)) if s == "Y");

    IndexEntry {
        uuid: coerce_string(at(0)),
        type_name: coerce_string(at(1)),
        title: coerce_string(at(2)),
        location: coerce_string(at(3)),
        updated_at: coerce_i64(at(4)),
        folder_id: coerce_string(at(5)),
        trashed,
    }
}

// ---------------------------------------------------------------------------
// Key bundle
// ---------------------------------------------------------------------------

/// Read the key bundle, preferring `encryptionKeys.js` over `1password.keys`.
///
/// NUL bytes are stripped from both base64 blobs before decoding. `level`
/// defaults to `SL5` and `iterations` to 1000 when absent.
///
/// # Errors
///
/// Returns `VaultError::NotFound` if neither file exists and
/// `VaultError::Format` if the content is not a JSON object, a blob is not
/// valid base64, or an iteration count is out of range.
pub fn read_key_bundle(vault: &Path) -> Result<KeyBundle, VaultError> {
    let data = data_dir(vault);
    let modern = data.join(KEYS_FILE);
    let (path, name) = if modern.is_file() {
        (modern, KEYS_FILE)
    } else {
        (data.join(LEGACY_KEYS_FILE), LEGACY_KEYS_FILE)
    };

    let json = read_dewrapped(&path, name)?;
    if !json.is_object() {
        return Err(VaultError::Format(format!("{name} does not contain an object")));
    }

    let entries = match field(&json, "list") {
        Some(Value::Array(list)) => list.iter().map(key_entry).collect::<Result<_, _>>()?,
        _ => Vec::new(),
    };

    Ok(KeyBundle {
        entries,
        sl3: coerce_string(field(&json, "SL3")),
        sl5: coerce_string(field(&json, "SL5")),
    })
}

fn key_entry(item: &Value) -> Result<KeyEntry, VaultError> {
    let identifier = coerce_string(field(item, "identifier"));
    let security_level = match field(item, "level") {
        None | Some(Value::Null) => DEFAULT_SECURITY_LEVEL.to_string(),
        level => coerce_string(level),
    };

    let decode_blob = |name: &str| -> Result<Vec<u8>, VaultError> {
        let text = coerce_string(field(item, name)).replace('\0', "");
        decode_base64(&text)
            .map_err(|e| VaultError::Format(format!("key {identifier} {name}: {e}")))
    };

    Ok(KeyEntry {
        encrypted_key: decode_blob("data")?,
        validation: decode_blob("validation")?,
        iterations: iterations(field(item, "iterations"), &identifier)?,
        identifier,
        security_level,
    })
}

fn iterations(value: Option<&Value>, identifier: &str) -> Result<u32, VaultError> {
    if matches!(value, None | Some(Value::Null)) {
        return Ok(DEFAULT_ITERATIONS);
    }
    let count = coerce_i64(value);
    u32::try_from(count)
        .ok()
        .filter(|n| *n >= 1)
        .ok_or_else(|| {
            VaultError::Format(format!(
                "key {identifier}: iteration count {count} out of range"
            ))
        })
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Reduce an entry identifier to a bare file name component.
///
/// # Errors
///
/// Returns `VaultError::Format` unless the identifier is exactly one
/// normal path component free of separators, drive markers and NUL.
pub fn sanitize_entry_id(uuid: &str) -> Result<&str, VaultError> {
    let trimmed = uuid.trim();
    let mut components = Path::new(trimmed).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    let hostile = !single_normal || trimmed.contains(['/', '\\', ':', '\0']);
    if hostile {
        return Err(VaultError::Format(format!("invalid entry identifier {uuid:?}")));
    }
    Ok(trimmed)
}

/// Path of an entry's file. The identifier is sanitized first.
///
/// # Errors
///
/// Returns `VaultError::Format` for a hostile identifier.
pub fn entry_path(vault: &Path, uuid: &str) -> Result<PathBuf, VaultError> {
    let safe = sanitize_entry_id(uuid)?;
    Ok(data_dir(vault).join(format!("{safe}.{ENTRY_EXTENSION}")))
}

/// Read one entry file using [`DEFAULT_MAX_ENTRY_BYTES`].
///
/// # Errors
///
/// See [`read_entry_limited`].
pub fn read_entry(vault: &Path, uuid: &str) -> Result<RawEntry, VaultError> {
    read_entry_limited(vault, uuid, DEFAULT_MAX_ENTRY_BYTES)
}

/// Read one entry file, refusing files larger than `max_bytes`.
///
/// # Errors
///
/// Returns `VaultError::Format` for a hostile identifier, an oversized
/// file, or content that is not a JSON object; `VaultError::NotFound` if
/// the file is absent.
pub fn read_entry_limited(
    vault: &Path,
    uuid: &str,
    max_bytes: u64,
) -> Result<RawEntry, VaultError> {
    let safe = sanitize_entry_id(uuid)?;
    let path = entry_path(vault, safe)?;
    let what = format!("entry {safe}");

    let size = fs::metadata(&path)
        .map_err(|e| VaultError::from_io(e, &what))?
        .len();
    if size > max_bytes {
        return Err(VaultError::Format(format!(
            "{what}: file is {size} bytes (limit {max_bytes})"
        )));
    }

    let json = read_dewrapped(&path, &what)?;
    if !json.is_object() {
        return Err(VaultError::Format(format!("{what}: not a JSON object")));
    }

    let security_level = [
        field(&json, "securityLevel"),
        field(&json, "openContents").and_then(|oc| field(oc, "securityLevel")),
    ]
    .into_iter()
    .flatten()
    .find(|v| !v.is_null())
    .map_or_else(|| DEFAULT_SECURITY_LEVEL.to_string(), |v| coerce_string(Some(v)));

    let uuid = match field(&json, "uuid") {
        None | Some(Value::Null) => safe.to_string(),
        some => coerce_string(some),
    };

    Ok(RawEntry {
        uuid,
        type_name: coerce_string(field(&json, "typeName")),
        title: coerce_string(field(&json, "title")),
        location: coerce_string(field(&json, "location")),
        location_key: coerce_string(field(&json, "locationKey")),
        created_at: coerce_i64(field(&json, "createdAt")),
        updated_at: coerce_i64(field(&json, "updatedAt")),
        encrypted_payload: coerce_string(field(&json, "encrypted")),
        security_level,
        trashed: is_truthy(field(&json, "trashed")),
    })
}

/// Identifiers of every `*.1password` file present on disk, sorted.
///
/// # Errors
///
/// Returns `VaultError::NotFound` if `data/default` is missing.
pub fn list_entry_ids(vault: &Path) -> Result<Vec<String>, VaultError> {
    let dir = data_dir(vault);
    let listing = fs::read_dir(&dir).map_err(|e| VaultError::from_io(e, "data/default"))?;

    let mut ids = Vec::new();
    for item in listing {
        let path = item?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(ENTRY_EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            ids.push(stem.to_string());
        }
    }
    ids.sort();
    Ok(ids)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
