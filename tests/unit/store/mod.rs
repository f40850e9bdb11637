use super::*;

fn temp_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "inkframe_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn exercise(store: &dyn ObjectStore) {
    assert!(!store.exists("a/b.png").unwrap());
    assert!(store.read("a/b.png").unwrap_err().is_not_found());

    store.write("a/b.png", b"one", "image/png").unwrap();
    store.write("a/c.png", b"two", "image/png").unwrap();
    store.write("ab/d.png", b"three", "image/png").unwrap();
    assert!(store.exists("a/b.png").unwrap());
    assert_eq!(store.read("a/b.png").unwrap(), b"one");

    assert_eq!(store.list("a/").unwrap(), vec!["a/b.png", "a/c.png"]);
    assert_eq!(
        store.list("a").unwrap(),
        vec!["a/b.png", "a/c.png", "ab/d.png"]
    );

    store.copy("a/b.png", "z/b.png").unwrap();
    assert_eq!(store.read("z/b.png").unwrap(), b"one");
    assert!(store.copy("missing", "z/x").unwrap_err().is_not_found());

    store.delete("a/b.png").unwrap();
    store.delete("a/b.png").unwrap();
    assert_eq!(store.list("a/").unwrap(), vec!["a/c.png"]);
    assert_eq!(read_optional(store, "a/b.png").unwrap(), None);
}

#[test]
fn memory_store_contract() {
    exercise(&MemoryStore::new());
}

#[test]
fn dir_store_contract() {
    let tmp = temp_dir("dir_store_contract");
    let store = DirStore::create(&tmp).unwrap();
    exercise(&store);
    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn dir_store_missing_root_is_unavailable() {
    let tmp = temp_dir("dir_store_missing_root");
    let err = DirStore::open(&tmp).unwrap_err();
    assert!(err.is_store_unavailable());
}

#[test]
fn dir_store_root_removed_after_open_is_unavailable() {
    let tmp = temp_dir("dir_store_root_removed");
    let store = DirStore::create(&tmp).unwrap();
    std::fs::remove_dir_all(&tmp).unwrap();
    assert!(store.read("x.png").unwrap_err().is_store_unavailable());
    assert!(store.list("").unwrap_err().is_store_unavailable());
}

#[test]
fn offline_memory_store_reports_unavailable() {
    let store = MemoryStore::new();
    store.write("k", b"v", "text/plain").unwrap();
    store.set_offline(true);
    assert!(store.read("k").unwrap_err().is_store_unavailable());
    assert!(store.exists("k").unwrap_err().is_store_unavailable());
    store.set_offline(false);
    assert_eq!(store.read("k").unwrap(), b"v");
}

#[test]
fn memory_store_keeps_content_type() {
    let store = MemoryStore::new();
    store
        .write("layouts/den.json", b"{}", "application/json")
        .unwrap();
    assert_eq!(
        store.content_type("layouts/den.json").as_deref(),
        Some("application/json")
    );
}

#[test]
fn normalize_key_rules() {
    assert_eq!(normalize_key("a//b/./c.png").unwrap(), "a/b/c.png");
    assert_eq!(normalize_key("a\\b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_key("/weekly-art/").unwrap(), "weekly-art/");
    assert_eq!(normalize_key("").unwrap(), "");
    assert!(normalize_key("../x.png").is_err());
}
