//! Entry payload decryption and typed views over decrypted documents.
//!
//! A payload failure never aborts a listing: it is captured as
//! [`Payload::Failed`] on the returned [`DecryptedEntry`] so callers can show
//! the rest of the vault.

use std::fmt;

use agile_crypto_core::salted::SaltedContainer;
use serde::Serialize;
use serde_json::Value;

use crate::document::{coerce_string, field, Document};
use crate::error::VaultError;
use crate::keys::{FallbackPolicy, UnlockedKeyMap};
use crate::reader::RawEntry;

/// Type-name prefix of login entries, whose payload carries form fields.
const WEBFORM_PREFIX: &str = "webforms.";

/// Top-level payload keys rendered elsewhere or not meant for display.
const STRUCTURAL_KEYS: &[&str] = &[
    "notesPlain",
    "URLs",
    "fields",
    "sections",
    "htmlForm",
    "htmlMethod",
    "htmlAction",
    "htmlID",
];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Outcome of decrypting one entry's payload.
#[derive(Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum Payload {
    /// Payload decrypted to a JSON object.
    Decrypted {
        /// The decrypted document, key order preserved.
        document: Document,
    },
    /// Payload could not be decrypted or parsed.
    Failed {
        /// Human-readable failure reason. Never contains secret material.
        reason: String,
    },
}

/// One login form field.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub name: String,
    pub value: String,
    /// Legacy single-letter type (`T` text, `P` password, `E` email, ...).
    #[serde(rename = "type")]
    pub field_type: String,
    /// `username`, `password`, or empty.
    pub designation: String,
}

/// An entry with its payload decrypted.
#[derive(Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptedEntry {
    pub uuid: String,
    pub type_name: String,
    pub title: String,
    pub location: String,
    pub location_key: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub security_level: String,
    pub trashed: bool,
    pub payload: Payload,
    /// Form fields, populated for `webforms.*` entries only.
    pub fields: Vec<FormField>,
}

impl DecryptedEntry {
    /// The decrypted document, if decryption succeeded.
    #[must_use]
    pub fn document(&self) -> Option<&Document> {
        match &self.payload {
            Payload::Decrypted { document } => Some(document),
            Payload::Failed { .. } => None,
        }
    }

    /// Category derived from the entry's type name.
    #[must_use]
    pub fn category(&self) -> ItemCategory {
        ItemCategory::from_type_name(&self.type_name)
    }

    /// Build the typed view matching this entry's category.
    #[must_use]
    pub fn view(&self) -> ItemView {
        let Some(document) = self.document() else {
            let reason = match &self.payload {
                Payload::Failed { reason } => reason.clone(),
                Payload::Decrypted { .. } => String::new(),
            };
            return ItemView::Failed { reason };
        };
        match self.category() {
            ItemCategory::Login => ItemView::Login(LoginView::new(document, &self.fields)),
            ItemCategory::Password => ItemView::Password(PasswordView::new(document)),
            ItemCategory::Note => ItemView::SecureNote(SecureNoteView::new(document)),
            _ => ItemView::Generic(GenericView::new(document)),
        }
    }
}

// ---------------------------------------------------------------------------
// Decryption
// ---------------------------------------------------------------------------

/// Decrypt one entry with the unlocked key map.
///
/// # Errors
///
/// Returns `VaultError::Locked` if `keys` is empty. Every other failure is
/// captured in [`Payload::Failed`].
pub fn decrypt_entry(
    entry: &RawEntry,
    keys: &UnlockedKeyMap,
    policy: FallbackPolicy,
) -> Result<DecryptedEntry, VaultError> {
    if keys.is_empty() {
        return Err(VaultError::Locked);
    }

    let payload = match open_payload(entry, keys, policy) {
        Ok(document) => Payload::Decrypted { document },
        Err(e) => {
            let reason = match e {
                VaultError::Payload(reason) => reason,
                other => other.to_string(),
            };
            tracing::warn!(entry = %entry.uuid, %reason, "payload not decrypted");
            Payload::Failed { reason }
        }
    };

    let fields = match &payload {
        Payload::Decrypted { document } if entry.type_name.starts_with(WEBFORM_PREFIX) => {
            form_fields(document)
        }
        _ => Vec::new(),
    };

    Ok(DecryptedEntry {
        uuid: entry.uuid.clone(),
        type_name: entry.type_name.clone(),
        title: entry.title.clone(),
        location: entry.location.clone(),
        location_key: entry.location_key.clone(),
        created_at: entry.created_at,
        updated_at: entry.updated_at,
        security_level: entry.security_level.clone(),
        trashed: entry.trashed,
        payload,
        fields,
    })
}

fn open_payload(
    entry: &RawEntry,
    keys: &UnlockedKeyMap,
    policy: FallbackPolicy,
) -> Result<Document, VaultError> {
    let key = keys.resolve(&entry.security_level, policy).ok_or_else(|| {
        VaultError::Payload(format!(
            "no key for security level {}",
            entry.security_level
        ))
    })?;

    let sealed = SaltedContainer::from_base64(&entry.encrypted_payload)
        .map_err(|e| VaultError::Payload(e.to_string()))?;
    let plaintext = sealed
        .open_stretched(key.expose())
        .map_err(|e| VaultError::Payload(e.to_string()))?;

    let text = std::str::from_utf8(plaintext.expose())
        .map_err(|_| VaultError::Payload("payload is not valid UTF-8".into()))?;
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(_) => Err(VaultError::Payload("payload is not a JSON object".into())),
        Err(e) => Err(VaultError::Payload(format!("payload is not valid JSON: {e}"))),
    }
}

/// Extract the ordered `fields` array of a login payload.
///
/// A missing or non-array `fields` yields nothing; non-object items are
/// skipped.
#[must_use]
pub fn form_fields(document: &Document) -> Vec<FormField> {
    let Some(Value::Array(items)) = document.get("fields") else {
        return Vec::new();
    };
    items
        .iter()
        .filter(|item| item.is_object())
        .map(|item| FormField {
            name: coerce_string(field(item, "name")),
            value: coerce_string(field(item, "value")),
            field_type: coerce_string(field(item, "type")),
            designation: coerce_string(field(item, "designation")),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Coarse item category, used for grouping and view selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemCategory {
    Login,
    Password,
    Note,
    License,
    CreditCard,
    Bank,
    Identity,
    IdDocument,
    Membership,
    Email,
    Server,
    Generic,
}

impl ItemCategory {
    /// Classify a legacy type name. Unknown names are [`Self::Generic`].
    #[must_use]
    pub fn from_type_name(type_name: &str) -> Self {
        let has = |needle: &str| type_name.contains(needle);

        if type_name.starts_with(WEBFORM_PREFIX) {
            Self::Login
        } else if type_name.starts_with("passwords.") {
            Self::Password
        } else if type_name.starts_with("securenotes.") {
            Self::Note
        } else if type_name.starts_with("software_licenses.")
            || type_name == "wallet.computer.License"
        {
            Self::License
        } else if has("CreditCard") {
            Self::CreditCard
        } else if has("BankAccount") {
            Self::Bank
        } else if type_name.starts_with("identities.") {
            Self::Identity
        } else if has("DriversLicense") || has("Passport") || has("Ssn") {
            Self::IdDocument
        } else if has("Membership") || has("RewardProgram") {
            Self::Membership
        } else if has("Email") {
            Self::Email
        } else if has("Server") || has("Database") || has("Router") {
            Self::Server
        } else {
            Self::Generic
        }
    }

    /// Short lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Password => "password",
            Self::Note => "note",
            Self::License => "license",
            Self::CreditCard => "creditcard",
            Self::Bank => "bank",
            Self::Identity => "identity",
            Self::IdDocument => "id",
            Self::Membership => "membership",
            Self::Email => "email",
            Self::Server => "server",
            Self::Generic => "generic",
        }
    }
}

/// Human-readable label for a legacy type name, or the name itself when
/// unknown.
#[must_use]
pub fn type_label(type_name: &str) -> &str {
    match type_name {
        "webforms.WebForm" => "Login",
        "passwords.Password" => "Password",
        "securenotes.SecureNote" => "Secure Note",
        "software_licenses.SoftwareLicense" | "wallet.computer.License" => "Software License",
        "wallet.financial.CreditCard" => "Credit Card",
        "wallet.financial.BankAccountUS"
        | "wallet.financial.BankAccountCA"
        | "wallet.financial.BankAccountAU"
        | "wallet.financial.BankAccountUK"
        | "wallet.financial.BankAccountDE" => "Bank Account",
        "identities.Identity" => "Identity",
        "wallet.computer.Router" => "Wireless Router",
        "wallet.government.DriversLicense" => "Driver's License",
        "wallet.government.SsnUS" => "Social Security Number",
        "wallet.government.Passport" => "Passport",
        "wallet.membership.Membership" => "Membership",
        "wallet.membership.RewardProgram" => "Reward Program",
        "wallet.onlineservices.Email.v2" => "Email Account",
        "wallet.onlineservices.GenericAccount" | "wallet.computer.UnixServer" => "Server",
        "wallet.computer.Database" => "Database",
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Typed views
// ---------------------------------------------------------------------------

/// A labelled value ready for display.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayField {
    pub label: String,
    pub value: String,
    /// Value should be masked until revealed.
    pub concealed: bool,
}

/// Category-specific projection of a decrypted entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ItemView {
    Login(LoginView),
    Password(PasswordView),
    SecureNote(SecureNoteView),
    Generic(GenericView),
    Failed { reason: String },
}

#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginView {
    pub username: Option<String>,
    pub password: Option<String>,
    pub urls: Vec<String>,
    /// Non-empty fields other than the designated username and password.
    pub other_fields: Vec<FormField>,
    pub notes: Option<String>,
}

impl LoginView {
    #[must_use]
    pub fn new(document: &Document, fields: &[FormField]) -> Self {
        let designated = |name: &str| {
            fields
                .iter()
                .find(|f| f.designation == name)
                .map(|f| f.value.clone())
        };

        let urls = match document.get("URLs") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|u| coerce_string(field(u, "url")))
                .filter(|u| !u.is_empty())
                .collect(),
            _ => Vec::new(),
        };

        let other_fields = fields
            .iter()
            .filter(|f| f.designation != "username" && f.designation != "password")
            .filter(|f| !f.value.is_empty())
            .cloned()
            .collect();

        Self {
            username: designated("username"),
            password: designated("password"),
            urls,
            other_fields,
            notes: notes(document),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordView {
    pub password: String,
    pub notes: Option<String>,
}

impl PasswordView {
    #[must_use]
    pub fn new(document: &Document) -> Self {
        Self {
            password: coerce_string(document.get("password")),
            notes: notes(document),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecureNoteView {
    pub notes: String,
}

impl SecureNoteView {
    #[must_use]
    pub fn new(document: &Document) -> Self {
        Self {
            notes: coerce_string(document.get("notesPlain")),
        }
    }
}

/// Fallback view for every other category.
///
/// Section fields come first, then top-level string and number values in
/// document order. Structural keys are skipped.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericView {
    pub fields: Vec<DisplayField>,
    pub notes: Option<String>,
}

impl GenericView {
    #[must_use]
    pub fn new(document: &Document) -> Self {
        let mut fields = Vec::new();

        if let Some(Value::Array(sections)) = document.get("sections") {
            for section in sections {
                let Some(Value::Array(items)) = field(section, "fields") else {
                    continue;
                };
                for item in items {
                    let value = coerce_string(field(item, "v"));
                    if value.is_empty() {
                        continue;
                    }
                    let label = [field(item, "t"), field(item, "n")]
                        .into_iter()
                        .map(coerce_string)
                        .find(|s| !s.is_empty())
                        .unwrap_or_else(|| "Field".to_string());
                    fields.push(DisplayField {
                        label,
                        value,
                        concealed: coerce_string(field(item, "k")) == "concealed",
                    });
                }
            }
        }

        for (key, value) in document {
            if STRUCTURAL_KEYS.contains(&key.as_str()) {
                continue;
            }
            if !matches!(value, Value::String(_) | Value::Number(_)) {
                continue;
            }
            let lower = key.to_lowercase();
            fields.push(DisplayField {
                label: key.clone(),
                value: coerce_string(Some(value)),
                concealed: lower.contains("password") || lower.contains("secret"),
            });
        }

        Self {
            fields,
            notes: notes(document),
        }
    }
}

fn notes(document: &Document) -> Option<String> {
    Some(coerce_string(document.get("notesPlain"))).filter(|n| !n.is_empty())
}

// ---------------------------------------------------------------------------
// Debug output
// ---------------------------------------------------------------------------

// Decrypted values print as `***`; metadata and labels stay visible.

const MASK: &str = "***";

fn mask(value: Option<&String>) -> Option<&'static str> {
    value.map(|_| MASK)
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decrypted { document } => f
                .debug_struct("Decrypted")
                .field("keys", &document.keys().collect::<Vec<_>>())
                .field("values", &MASK)
                .finish(),
            Self::Failed { reason } => f.debug_struct("Failed").field("reason", reason).finish(),
        }
    }
}

impl fmt::Debug for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormField")
            .field("name", &self.name)
            .field("value", &MASK)
            .field("field_type", &self.field_type)
            .field("designation", &self.designation)
            .finish()
    }
}

impl fmt::Debug for DecryptedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptedEntry")
            .field("uuid", &self.uuid)
            .field("type_name", &self.type_name)
            .field("title", &self.title)
            .field("location", &self.location)
            .field("security_level", &self.security_level)
            .field("trashed", &self.trashed)
            .field("payload", &self.payload)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for DisplayField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayField")
            .field("label", &self.label)
            .field("value", &MASK)
            .field("concealed", &self.concealed)
            .finish()
    }
}

impl fmt::Debug for LoginView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginView")
            .field("username", &mask(self.username.as_ref()))
            .field("password", &mask(self.password.as_ref()))
            .field("urls", &self.urls)
            .field("other_fields", &self.other_fields)
            .field("notes", &mask(self.notes.as_ref()))
            .finish()
    }
}

impl fmt::Debug for PasswordView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordView")
            .field("password", &MASK)
            .field("notes", &mask(self.notes.as_ref()))
            .finish()
    }
}

impl fmt::Debug for SecureNoteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureNoteView").field("notes", &MASK).finish()
    }
}

impl fmt::Debug for GenericView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericView")
            .field("fields", &self.fields)
            .field("notes", &mask(self.notes.as_ref()))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
