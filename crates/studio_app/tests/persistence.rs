use studio_app::persistence::{load_access_key, resolve_access_key, save_access_key};
use tempfile::tempdir;

#[test]
fn saved_key_is_loaded_back() {
    let dir = tempdir().unwrap();
    assert_eq!(load_access_key(dir.path()), None);

    save_access_key(dir.path(), "secret-1");

    assert_eq!(load_access_key(dir.path()).as_deref(), Some("secret-1"));
}

#[test]
fn page_key_replaces_stored_key() {
    let dir = tempdir().unwrap();
    save_access_key(dir.path(), "old");

    assert_eq!(resolve_access_key(dir.path(), Some(" new ")).as_deref(), Some("new"));
    assert_eq!(load_access_key(dir.path()).as_deref(), Some("new"));
}

#[test]
fn blank_page_key_falls_back_to_stored() {
    let dir = tempdir().unwrap();
    save_access_key(dir.path(), "kept");

    assert_eq!(resolve_access_key(dir.path(), Some("  ")).as_deref(), Some("kept"));
    assert_eq!(resolve_access_key(dir.path(), None).as_deref(), Some("kept"));
}

#[test]
fn corrupt_state_file_is_ignored() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join(".tool_studio_state.ron"), "not ron {").unwrap();

    assert_eq!(load_access_key(dir.path()), None);
}
