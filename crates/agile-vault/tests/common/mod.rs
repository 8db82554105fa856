//! Shared on-disk fixture builder for integration tests.
//!
//! Builds a complete `.agilekeychain` directory in a temp dir using the
//! crypto core's sealing helpers, so each test controls passwords, keys and
//! payloads.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use agile_crypto_core::{random_salt, SaltedContainer};
use serde_json::{json, Value};
use tempfile::TempDir;

pub const PASSWORD: &[u8] = b"correct horse";
pub const ITERATIONS: u32 = 100;

pub const SL5_KEY: [u8; 32] = [0x55; 32];
pub const SL3_KEY: [u8; 32] = [0x33; 32];

/// One key entry to write into `encryptionKeys.js`.
pub struct FixtureKey {
    pub identifier: String,
    pub level: Option<String>,
    pub master: Vec<u8>,
    pub iterations: Option<u32>,
}

/// One entry file plus its index row.
pub struct FixtureEntry {
    pub uuid: String,
    pub type_name: String,
    pub title: String,
    pub location: String,
    pub security_level: Option<String>,
    /// Plaintext payload; sealed under the key for `sealing_key`.
    pub payload: Vec<u8>,
    pub sealing_key: Vec<u8>,
    pub trashed: bool,
    pub indexed: bool,
}

impl FixtureEntry {
    pub fn login(uuid: &str, title: &str, payload: &Value) -> Self {
        Self {
            uuid: uuid.into(),
            type_name: "webforms.WebForm".into(),
            title: title.into(),
            location: format!("https://{}.example", title.to_lowercase()),
            security_level: Some("SL5".into()),
            payload: payload.to_string().into_bytes(),
            sealing_key: SL5_KEY.to_vec(),
            trashed: false,
            indexed: true,
        }
    }

    pub fn note(uuid: &str, title: &str, text: &str) -> Self {
        Self {
            uuid: uuid.into(),
            type_name: "securenotes.SecureNote".into(),
            title: title.into(),
            location: String::new(),
            security_level: Some("SL5".into()),
            payload: json!({ "notesPlain": text }).to_string().into_bytes(),
            sealing_key: SL5_KEY.to_vec(),
            trashed: false,
            indexed: true,
        }
    }
}

pub struct VaultBuilder {
    name: String,
    password: Vec<u8>,
    keys: Vec<FixtureKey>,
    entries: Vec<FixtureEntry>,
    sl3: String,
    sl5: String,
    legacy_keys_file: bool,
}

impl VaultBuilder {
    /// A vault with one SL5 and one SL3 key, no entries.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            password: PASSWORD.to_vec(),
            keys: vec![
                FixtureKey {
                    identifier: "KEY-SL5".into(),
                    level: Some("SL5".into()),
                    master: SL5_KEY.to_vec(),
                    iterations: Some(ITERATIONS),
                },
                FixtureKey {
                    identifier: "KEY-SL3".into(),
                    level: Some("SL3".into()),
                    master: SL3_KEY.to_vec(),
                    iterations: Some(ITERATIONS),
                },
            ],
            entries: Vec::new(),
            sl3: "KEY-SL3".into(),
            sl5: "KEY-SL5".into(),
            legacy_keys_file: false,
        }
    }

    pub fn keys(mut self, keys: Vec<FixtureKey>, sl3: &str, sl5: &str) -> Self {
        self.keys = keys;
        self.sl3 = sl3.into();
        self.sl5 = sl5.into();
        self
    }

    pub fn entry(mut self, entry: FixtureEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn legacy_keys_file(mut self) -> Self {
        self.legacy_keys_file = true;
        self
    }

    pub fn build(self) -> Fixture {
        let dir = TempDir::new().unwrap();
        let vault = dir.path().join(format!("{}.agilekeychain", self.name));
        let data = vault.join("data").join("default");
        fs::create_dir_all(&data).unwrap();

        let rows: Vec<Value> = self
            .entries
            .iter()
            .filter(|e| e.indexed)
            .map(|e| {
                json!([
                    e.uuid,
                    e.type_name,
                    e.title,
                    e.location,
                    1_325_376_000,
                    "",
                    0,
                    if e.trashed { "Y" } else { "N" },
                ])
            })
            .collect();
        fs::write(
            data.join("contents.js"),
            format!("var contents = {};\n", Value::Array(rows)),
        )
        .unwrap();

        let list: Vec<Value> = self
            .keys
            .iter()
            .enumerate()
            .map(|(i, k)| {
                let salt = [u8::try_from(i).unwrap().wrapping_mul(16).wrapping_add(1); 8];
                let iterations = k.iterations.unwrap_or(1000);
                let sealed =
                    SaltedContainer::seal_pbkdf2(&k.master, &self.password, salt, iterations)
                        .unwrap();
                let validation =
                    SaltedContainer::seal_stretched(&k.master, &k.master, [salt[0] ^ 0xFF; 8])
                        .unwrap();
                let mut item = json!({
                    "identifier": k.identifier,
                    "data": format!("{}\u{0}", sealed.to_base64()),
                    "validation": validation.to_base64(),
                });
                if let Some(level) = &k.level {
                    item["level"] = json!(level);
                }
                if let Some(n) = k.iterations {
                    item["iterations"] = json!(n);
                }
                item
            })
            .collect();
        let bundle = json!({ "list": list, "SL3": self.sl3, "SL5": self.sl5 });
        let keys_file = if self.legacy_keys_file {
            "1password.keys"
        } else {
            "encryptionKeys.js"
        };
        fs::write(data.join(keys_file), format!("{bundle};;")).unwrap();

        for e in &self.entries {
            let salt = random_salt().unwrap();
            let sealed = SaltedContainer::seal_stretched(&e.payload, &e.sealing_key, salt).unwrap();
            let mut file = json!({
                "uuid": e.uuid,
                "typeName": e.type_name,
                "title": e.title,
                "location": e.location,
                "locationKey": e.location.to_lowercase(),
                "createdAt": 1_300_000_000,
                "updatedAt": 1_325_376_000,
                "encrypted": sealed.to_base64(),
            });
            if let Some(level) = &e.security_level {
                file["securityLevel"] = json!(level);
            }
            if e.trashed {
                file["trashed"] = json!(true);
            }
            fs::write(data.join(format!("{}.1password", e.uuid)), file.to_string()).unwrap();
        }

        Fixture { _dir: dir, vault }
    }
}

/// A built vault. The temp dir lives as long as this value.
pub struct Fixture {
    _dir: TempDir,
    pub vault: PathBuf,
}

impl Fixture {
    pub fn path(&self) -> &Path {
        &self.vault
    }

    pub fn data_dir(&self) -> PathBuf {
        self.vault.join("data").join("default")
    }
}

/// Standard vault: one login and one secure note, both SL5.
pub fn demo_vault() -> Fixture {
    VaultBuilder::new("Demo")
        .entry(FixtureEntry::login(
            "LOGIN1",
            "Example",
            &json!({
                "fields": [
                    {"name": "user", "value": "alice", "type": "T", "designation": "username"},
                    {"name": "pass", "value": "hunter2", "type": "P", "designation": "password"},
                ],
                "URLs": [{"url": "https://example.com/login"}],
                "notesPlain": "demo note",
            }),
        ))
        .entry(FixtureEntry::note("NOTE1", "Groceries", "remember the milk"))
        .build()
}
