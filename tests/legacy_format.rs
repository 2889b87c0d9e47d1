use chirp_store::ChirpStore;
use chrono::{TimeZone, Utc};
use serde_json::Value;

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("chirp_store_test_legacy_{}.json", name))
}

const LEGACY: &str = r#"{"chirps":{"1":{"id":1,"body":"first","author_id":2}},"users":{"1":{"id":1,"email":"a@x.com","password":"$2a$10$hash","is_chirpy_red":false},"2":{"id":2,"email":"b@x.com","password":"$2a$10$other","is_chirpy_red":true}},"refresh_tokens":null}"#;

#[test]
fn reads_file_with_null_collection() {
    let path = temp_path("null_tokens");
    std::fs::write(&path, LEGACY).unwrap();
    let store = ChirpStore::open(&path).unwrap();

    let doc = store.load_document().unwrap();
    assert!(doc.refresh_tokens.is_empty());
    assert_eq!(doc.posts[&1].body, "first");
    assert_eq!(doc.users[&2].password_hash, "$2a$10$other");
    assert!(doc.users[&2].is_upgraded);

    // creating continues the numbering
    assert_eq!(store.create_user("c@x.com", "h").unwrap().id, 3);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn reads_file_with_missing_collections() {
    let path = temp_path("missing_keys");
    std::fs::write(&path, r#"{"chirps":{}}"#).unwrap();
    let store = ChirpStore::open(&path).unwrap();
    let doc = store.load_document().unwrap();
    assert!(doc.is_empty());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn parses_offset_timestamps_with_nanos() {
    let path = temp_path("offset_ts");
    let token = "0f".repeat(32);
    let raw = format!(
        r#"{{"chirps":{{}},"users":{{}},"refresh_tokens":{{"{token}":{{"token":"{token}","expiration":"2030-06-01T08:00:00.123456789-04:00","id":1}}}}}}"#
    );
    std::fs::write(&path, raw).unwrap();
    let store = ChirpStore::open(&path).unwrap();

    let rt = store.load_document().unwrap().refresh_tokens.remove(&token).unwrap();
    let expected = Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap()
        + chrono::Duration::nanoseconds(123_456_789);
    assert_eq!(rt.expires_at, expected);
    assert_eq!(rt.owner_user_id, 1);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn writes_wire_field_names() {
    let path = temp_path("field_names");
    let _ = std::fs::remove_file(&path);
    let store = ChirpStore::open(&path).unwrap();
    store.create_post("hi", 1).unwrap();
    store.create_user("a@x.com", "h").unwrap();
    let rt = store
        .create_refresh_token(1, Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap())
        .unwrap();

    let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["chirps"]["1"]["id"], 1);
    assert_eq!(raw["chirps"]["1"]["body"], "hi");
    assert_eq!(raw["chirps"]["1"]["author_id"], 1);
    assert_eq!(raw["users"]["1"]["email"], "a@x.com");
    assert_eq!(raw["users"]["1"]["password"], "h");
    assert_eq!(raw["users"]["1"]["is_chirpy_red"], false);

    let stored = &raw["refresh_tokens"][rt.token.as_str()];
    assert_eq!(stored["token"], rt.token.as_str());
    assert_eq!(stored["id"], 1);
    let expiration = stored["expiration"].as_str().unwrap();
    assert!(expiration.starts_with("2030-01-01T00:00:00"));
    let _ = std::fs::remove_file(&path);
}
