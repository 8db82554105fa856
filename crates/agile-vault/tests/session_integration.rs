#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Integration tests for `VaultSession`: open, unlock, lock, and entry
//! decryption against fixture vaults built on disk.

mod common;

use std::fs;

use agile_vault::{
    EngineConfig, FallbackPolicy, FormField, ItemView, Payload, VaultError, VaultSession,
};
use common::{demo_vault, FixtureEntry, FixtureKey, VaultBuilder, PASSWORD, SL3_KEY};
use serde_json::json;

fn open(fx: &common::Fixture) -> VaultSession {
    VaultSession::open(fx.path(), EngineConfig::default()).unwrap()
}

fn unlocked(fx: &common::Fixture) -> VaultSession {
    let mut session = open(fx);
    session.unlock(PASSWORD).unwrap();
    session
}

// ---------------------------------------------------------------------------
// Open
// ---------------------------------------------------------------------------

#[test]
fn open_reads_index_and_name() {
    let fx = demo_vault();
    let session = open(&fx);

    assert_eq!(session.name(), "Demo");
    assert_eq!(session.item_count(), 2);
    assert_eq!(session.index()[0].uuid, "LOGIN1");
    assert_eq!(session.key_bundle().entries.len(), 2);
    assert!(!session.is_unlocked());
}

#[test]
fn open_invalid_directory_is_not_found_with_reason() {
    let fx = demo_vault();
    fs::remove_file(fx.data_dir().join("contents.js")).unwrap();

    let err = VaultSession::open(fx.path(), EngineConfig::default()).unwrap_err();
    match err {
        VaultError::NotFound(msg) => assert!(msg.contains("contents.js"), "{msg}"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Unlock / lock
// ---------------------------------------------------------------------------

#[test]
fn unlock_with_correct_password() {
    let fx = demo_vault();
    let mut session = open(&fx);
    session.unlock(PASSWORD).unwrap();
    assert!(session.is_unlocked());
}

#[test]
fn unlock_with_wrong_password_is_authentication() {
    let fx = demo_vault();
    let mut session = open(&fx);
    let err = session.unlock(b"wrong").unwrap_err();
    assert!(matches!(err, VaultError::Authentication));
    assert_eq!(err.to_string(), "incorrect master password");
    assert!(!session.is_unlocked());
}

#[test]
fn failed_unlock_keeps_previous_keys() {
    let fx = demo_vault();
    let mut session = unlocked(&fx);
    assert!(session.unlock(b"wrong").is_err());
    assert!(session.is_unlocked());
    assert!(session.decrypt_entry("NOTE1").is_ok());
}

#[test]
fn lock_is_idempotent() {
    let fx = demo_vault();
    let mut session = unlocked(&fx);
    session.lock();
    session.lock();
    assert!(!session.is_unlocked());
    assert!(matches!(
        session.decrypt_entry("NOTE1"),
        Err(VaultError::Locked)
    ));
}

#[test]
fn empty_key_list_cannot_unlock() {
    let fx = VaultBuilder::new("Empty").keys(Vec::new(), "", "").build();
    let mut session = open(&fx);
    assert!(matches!(
        session.unlock(PASSWORD),
        Err(VaultError::Authentication)
    ));
}

// ---------------------------------------------------------------------------
// Decrypt
// ---------------------------------------------------------------------------

#[test]
fn decrypt_before_unlock_is_locked_without_reading() {
    let fx = demo_vault();
    let session = open(&fx);
    // Remove the file: a Locked error proves no read was attempted.
    fs::remove_file(fx.data_dir().join("LOGIN1.1password")).unwrap();
    assert!(matches!(
        session.decrypt_entry("LOGIN1"),
        Err(VaultError::Locked)
    ));
}

#[test]
fn decrypt_login_extracts_fields() {
    let fx = demo_vault();
    let session = unlocked(&fx);

    let entry = session.decrypt_entry("LOGIN1").unwrap();
    assert_eq!(entry.title, "Example");
    assert_eq!(
        entry.fields[0],
        FormField {
            name: "user".into(),
            value: "alice".into(),
            field_type: "T".into(),
            designation: "username".into(),
        }
    );
    assert_eq!(entry.fields.len(), 2);

    let document = entry.document().unwrap();
    assert_eq!(document["notesPlain"], json!("demo note"));

    match entry.view() {
        ItemView::Login(login) => {
            assert_eq!(login.username.as_deref(), Some("alice"));
            assert_eq!(login.password.as_deref(), Some("hunter2"));
            assert_eq!(login.urls, ["https://example.com/login"]);
        }
        other => panic!("expected login view, got {other:?}"),
    }
}

#[test]
fn decrypt_note_has_no_fields() {
    let fx = demo_vault();
    let session = unlocked(&fx);

    let entry = session.decrypt_entry("NOTE1").unwrap();
    assert!(entry.fields.is_empty());
    match entry.view() {
        ItemView::SecureNote(note) => assert_eq!(note.notes, "remember the milk"),
        other => panic!("expected note view, got {other:?}"),
    }
}

#[test]
fn decrypt_sl3_entry_uses_sl3_key() {
    let fx = VaultBuilder::new("Levels")
        .entry(FixtureEntry {
            security_level: Some("SL3".into()),
            sealing_key: SL3_KEY.to_vec(),
            ..FixtureEntry::note("LOW", "Low", "sl3 secret")
        })
        .build();
    let session = unlocked(&fx);

    let entry = session.decrypt_entry("LOW").unwrap();
    assert_eq!(entry.security_level, "SL3");
    assert_eq!(entry.document().unwrap()["notesPlain"], json!("sl3 secret"));
}

#[test]
fn unknown_level_falls_back_to_sl5() {
    let fx = VaultBuilder::new("Fallback")
        .entry(FixtureEntry {
            security_level: Some("SL9".into()),
            ..FixtureEntry::note("ODD", "Odd", "fallback works")
        })
        .build();
    let session = unlocked(&fx);

    let entry = session.decrypt_entry("ODD").unwrap();
    assert_eq!(entry.document().unwrap()["notesPlain"], json!("fallback works"));
}

#[test]
fn strict_policy_reports_missing_key_as_failed_payload() {
    let fx = VaultBuilder::new("Strict")
        .entry(FixtureEntry {
            security_level: Some("SL9".into()),
            ..FixtureEntry::note("ODD", "Odd", "unreachable")
        })
        .build();
    let config = EngineConfig {
        fallback_policy: FallbackPolicy::Strict,
        ..EngineConfig::default()
    };
    let mut session = VaultSession::open(fx.path(), config).unwrap();
    session.unlock(PASSWORD).unwrap();

    let entry = session.decrypt_entry("ODD").unwrap();
    match &entry.payload {
        Payload::Failed { reason } => assert!(reason.contains("SL9"), "{reason}"),
        Payload::Decrypted { .. } => panic!("strict policy must not fall back"),
    }
}

#[test]
fn wrong_key_payload_is_failed_not_error() {
    let fx = VaultBuilder::new("Corrupt")
        .entry(FixtureEntry {
            sealing_key: vec![0xEE; 32],
            ..FixtureEntry::note("BAD", "Bad", "never seen")
        })
        .entry(FixtureEntry::note("GOOD", "Good", "fine"))
        .build();
    let session = unlocked(&fx);

    let bad = session.decrypt_entry("BAD").unwrap();
    assert!(bad.document().is_none());
    assert!(matches!(bad.view(), ItemView::Failed { .. }));

    let good = session.decrypt_entry("GOOD").unwrap();
    assert!(good.document().is_some());
}

#[test]
fn non_object_payload_is_failed() {
    let fx = VaultBuilder::new("Array")
        .entry(FixtureEntry {
            payload: b"[1,2,3]".to_vec(),
            ..FixtureEntry::note("ARR", "Array", "")
        })
        .build();
    let session = unlocked(&fx);

    let entry = session.decrypt_entry("ARR").unwrap();
    match entry.payload {
        Payload::Failed { reason } => assert!(reason.contains("object"), "{reason}"),
        Payload::Decrypted { .. } => panic!("array payload must fail"),
    }
}

#[test]
fn vanished_entry_file_is_not_found() {
    let fx = demo_vault();
    let session = unlocked(&fx);
    fs::remove_file(fx.data_dir().join("NOTE1.1password")).unwrap();
    assert!(matches!(
        session.decrypt_entry("NOTE1"),
        Err(VaultError::NotFound(_))
    ));
}

#[test]
fn size_limit_from_config_applies() {
    let fx = demo_vault();
    let config = EngineConfig {
        max_entry_bytes: 16,
        ..EngineConfig::default()
    };
    let mut session = VaultSession::open(fx.path(), config).unwrap();
    session.unlock(PASSWORD).unwrap();
    assert!(matches!(
        session.decrypt_entry("NOTE1"),
        Err(VaultError::Format(_))
    ));
}

#[test]
fn list_entry_ids_and_reconcile() {
    let fx = VaultBuilder::new("Drift")
        .entry(FixtureEntry::note("A", "a", "x"))
        .entry(FixtureEntry {
            indexed: false,
            ..FixtureEntry::note("B", "b", "y")
        })
        .build();
    let session = open(&fx);
    fs::remove_file(fx.data_dir().join("A.1password")).unwrap();

    let on_disk = session.list_entry_ids().unwrap();
    assert_eq!(on_disk, ["B"]);

    let report = agile_vault::reconcile(session.index(), &on_disk);
    assert_eq!(report.missing_files, ["A"]);
    assert_eq!(report.unindexed_files, ["B"]);
}

#[test]
fn decrypt_runs_concurrently_on_shared_session() {
    let fx = demo_vault();
    let session = unlocked(&fx);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| session.decrypt_entry("LOGIN1").unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().fields.len(), 2);
        }
    });
}

#[test]
fn multi_key_bundle_with_one_bad_key_fails_atomically() {
    let fx = VaultBuilder::new("Mixed")
        .keys(
            vec![
                FixtureKey {
                    identifier: "GOOD".into(),
                    level: Some("SL5".into()),
                    master: vec![1; 32],
                    iterations: Some(10),
                },
                FixtureKey {
                    identifier: "BAD".into(),
                    level: Some("SL3".into()),
                    master: vec![2; 32],
                    iterations: Some(10),
                },
            ],
            "BAD",
            "GOOD",
        )
        .build();
    // Corrupt the second key's validation blob.
    let path = fx.data_dir().join("encryptionKeys.js");
    let text = fs::read_to_string(&path).unwrap();
    let mut bundle = agile_vault::dewrap(&text).unwrap();
    bundle["list"][1]["validation"] = bundle["list"][0]["validation"].clone();
    fs::write(&path, bundle.to_string()).unwrap();

    let mut session = open(&fx);
    assert!(matches!(
        session.unlock(PASSWORD),
        Err(VaultError::Authentication)
    ));
    assert!(!session.is_unlocked());
}
