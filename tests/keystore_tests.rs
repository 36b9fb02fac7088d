//! KeyStore integration tests.

mod common;

use chrono::{TimeZone, Utc};
use tempfile::tempdir;
use domain_hq::{
    parse_pub_key, IdentityRecord, KeyBackend, KeyRecord, KeyStore, LookupError, MemoryBackend,
    SqliteBackend, Upsert,
};

use common::*;

fn sqlite_store() -> KeyStore {
    KeyStore::with_default_prefix(SqliteBackend::open_in_memory().unwrap())
}

/// Run `check` against every backend.
fn for_each_backend(check: impl Fn(KeyStore)) {
    check(sqlite_store());
    check(KeyStore::with_default_prefix(MemoryBackend::new()));
}

#[test]
fn test_keystore_create_file() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("keys.db");

    let backend = SqliteBackend::open(&db_path).unwrap();
    assert!(db_path.exists());
    assert_eq!(backend.path(), Some(db_path.as_path()));
    assert_eq!(backend.count().unwrap(), 0);
}

#[test]
fn test_keys_survive_reopen() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("keys.db");
    let record = parse_pub_key(&example_key()).unwrap();

    {
        let store = KeyStore::with_default_prefix(SqliteBackend::open(&db_path).unwrap());
        store.add_or_replace(&record).unwrap();
    }

    let store = KeyStore::with_default_prefix(SqliteBackend::open(&db_path).unwrap());
    assert_eq!(store.count().unwrap(), 1);
    assert_eq!(store.lookup(EXAMPLE_EMAIL).unwrap(), record);
}

#[test]
fn test_lookup_by_every_identifier() {
    for_each_backend(|store| {
        let record = parse_pub_key(&example_key()).unwrap();
        store.add_or_replace(&record).unwrap();

        for search in [
            EXAMPLE_KEY_ID.to_string(),
            EXAMPLE_KEY_ID_SHORT.to_string(),
            EXAMPLE_FINGERPRINT.to_string(),
            format!("0x{}", EXAMPLE_FINGERPRINT),
            EXAMPLE_EMAIL.to_string(),
        ] {
            let found = store.lookup(&search).unwrap();
            assert_eq!(found.key_id, EXAMPLE_KEY_ID, "search {}", search);
            assert_eq!(found.public_key, record.public_key);
        }
    });
}

#[test]
fn test_lookup_is_case_insensitive() {
    for_each_backend(|store| {
        store
            .add_or_replace(&parse_pub_key(&example_key()).unwrap())
            .unwrap();

        assert!(store.lookup(&EXAMPLE_KEY_ID.to_uppercase()).is_ok());
        assert!(store.lookup(&EXAMPLE_KEY_ID_SHORT.to_uppercase()).is_ok());
        assert!(store
            .lookup(&format!("0X{}", EXAMPLE_FINGERPRINT.to_uppercase()))
            .is_ok());
        assert!(store.lookup("Example@EXAMPLE.com").is_ok());
    });
}

#[test]
fn test_prefix_only_applies_to_fingerprint() {
    for_each_backend(|store| {
        store
            .add_or_replace(&parse_pub_key(&example_key()).unwrap())
            .unwrap();

        assert_eq!(
            store.lookup(&format!("0x{}", EXAMPLE_KEY_ID)),
            Err(LookupError::NotFound)
        );
    });
}

#[test]
fn test_partial_fingerprint_not_found() {
    for_each_backend(|store| {
        store
            .add_or_replace(&parse_pub_key(&example_key()).unwrap())
            .unwrap();

        assert_eq!(
            store.lookup(&EXAMPLE_FINGERPRINT[..20]),
            Err(LookupError::NotFound)
        );
        assert_eq!(store.lookup("nobody@example.com"), Err(LookupError::NotFound));
    });
}

#[test]
fn test_add_is_idempotent() {
    for_each_backend(|store| {
        let record = parse_pub_key(&example_key()).unwrap();

        assert_eq!(store.add_or_replace(&record).unwrap(), Upsert::Inserted);
        assert_eq!(store.add_or_replace(&record).unwrap(), Upsert::Replaced);
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.lookup(EXAMPLE_KEY_ID).unwrap(), record);
    });
}

#[test]
fn test_replace_swaps_identities() {
    for_each_backend(|store| {
        let key = generate_public_key(&["Carol <carol@example.com>"]);
        let first = parse_pub_key(&armor(&key)).unwrap();
        store.add_or_replace(&first).unwrap();

        // Same key ID, different identities
        let mut second = first.clone();
        second.identities[0].email = "carol@new.example.com".to_string();
        assert_eq!(store.add_or_replace(&second).unwrap(), Upsert::Replaced);

        assert_eq!(store.lookup("carol@example.com"), Err(LookupError::NotFound));
        let found = store.lookup("carol@new.example.com").unwrap();
        assert_eq!(found.identities, second.identities);
    });
}

#[test]
fn test_shared_email_is_ambiguous() {
    for_each_backend(|store| {
        let a = parse_pub_key(&generate_armored_key(&["Dave <dave@example.com>"])).unwrap();
        let b = parse_pub_key(&generate_armored_key(&["Dave <dave@example.com>"])).unwrap();
        store.add_or_replace(&a).unwrap();
        store.add_or_replace(&b).unwrap();

        assert_eq!(store.lookup("dave@example.com"), Err(LookupError::Ambiguous(2)));

        // Each key is still reachable by its own identifiers
        assert_eq!(store.lookup(&a.key_id).unwrap().key_id, a.key_id);
        assert_eq!(store.lookup(&b.fingerprint).unwrap().key_id, b.key_id);
    });
}

#[test]
fn test_key_with_repeated_email_is_one_match() {
    for_each_backend(|store| {
        let record = parse_pub_key(&generate_armored_key(&[
            "Erin <erin@example.com>",
            "Erin (laptop) <ERIN@example.com>",
        ]))
        .unwrap();
        store.add_or_replace(&record).unwrap();

        let found = store.lookup("erin@example.com").unwrap();
        assert_eq!(found.identities.len(), 2);
        assert_eq!(found.identities[1].comment, "laptop");
    });
}

#[test]
fn test_custom_fingerprint_prefix() {
    let store = KeyStore::new(SqliteBackend::open_in_memory().unwrap(), "fpr:");
    store
        .add_or_replace(&parse_pub_key(&example_key()).unwrap())
        .unwrap();

    assert!(store.lookup(&format!("fpr:{}", EXAMPLE_FINGERPRINT)).is_ok());
    assert!(store.lookup(&format!("FPR:{}", EXAMPLE_FINGERPRINT)).is_ok());
    assert_eq!(
        store.lookup(&format!("0x{}", EXAMPLE_FINGERPRINT)),
        Err(LookupError::NotFound)
    );
}

#[test]
fn test_remove_key() {
    for_each_backend(|store| {
        store
            .add_or_replace(&parse_pub_key(&example_key()).unwrap())
            .unwrap();

        assert!(store.remove(&EXAMPLE_KEY_ID.to_uppercase()).unwrap());
        assert!(!store.remove(EXAMPLE_KEY_ID).unwrap());
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(store.lookup(EXAMPLE_EMAIL), Err(LookupError::NotFound));
    });
}

/// A record with made-up identifiers.
fn record(key_id: &str, email: &str) -> KeyRecord {
    KeyRecord {
        key_id: key_id.to_string(),
        key_id_short: key_id[key_id.len() - 8..].to_string(),
        fingerprint: format!("{:0>40}", key_id),
        created_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        algorithm: "EdDSA".to_string(),
        version: 4,
        revoked: false,
        public_key: format!("armored {}", key_id),
        identities: vec![IdentityRecord {
            name: "Test".to_string(),
            email: email.to_string(),
            comment: String::new(),
        }],
    }
}

#[test]
fn test_short_key_id_collision_is_ambiguous() {
    for_each_backend(|store| {
        let a = record("1111111122222222", "a@example.com");
        let b = record("3333333322222222", "b@example.com");
        assert_eq!(a.key_id_short, b.key_id_short);
        store.add_or_replace(&a).unwrap();
        store.add_or_replace(&b).unwrap();

        assert_eq!(store.lookup("22222222"), Err(LookupError::Ambiguous(2)));

        // The full key IDs no longer collide
        assert_eq!(store.lookup(&a.key_id).unwrap(), a);
        assert_eq!(store.lookup(&b.key_id).unwrap(), b);
        assert_eq!(store.lookup(&b.fingerprint).unwrap(), b);
    });
}

#[test]
fn test_full_key_id_match_has_no_priority() {
    for_each_backend(|store| {
        // The identity of the second key looks like the first key's ID
        let a = record("1111111122222222", "a@example.com");
        let b = record("3333333344444444", "1111111122222222");
        store.add_or_replace(&a).unwrap();
        store.add_or_replace(&b).unwrap();

        assert_eq!(
            store.lookup("1111111122222222"),
            Err(LookupError::Ambiguous(2))
        );
    });
}

#[test]
fn test_revoked_flag_is_stored_as_parsed() {
    for_each_backend(|store| {
        let revoked = parse_pub_key(&armor(&generate_revoked_public_key(&[
            "Ivan <ivan@example.com>",
        ])))
        .unwrap();
        let active = parse_pub_key(&generate_armored_key(&["Judy <judy@example.com>"])).unwrap();
        store.add_or_replace(&revoked).unwrap();
        store.add_or_replace(&active).unwrap();

        // Lookup returns the flag recorded at upload, revoked or not
        assert!(store.lookup("ivan@example.com").unwrap().revoked);
        assert!(!store.lookup("judy@example.com").unwrap().revoked);
    });
}

#[test]
fn test_fingerprint_prefix_is_lowercased() {
    let store = KeyStore::new(MemoryBackend::new(), "0X");
    assert_eq!(store.fingerprint_prefix(), "0x");

    store
        .add_or_replace(&parse_pub_key(&example_key()).unwrap())
        .unwrap();
    assert!(store.lookup(&format!("0x{}", EXAMPLE_FINGERPRINT)).is_ok());
    assert!(store.lookup(&format!("0X{}", EXAMPLE_FINGERPRINT)).is_ok());
}
