use serde_json::json;

use super::*;
use crate::store::MemoryStore;

fn layouts(per_user: bool) -> (Arc<MemoryStore>, LayoutStore) {
    let store = Arc::new(MemoryStore::new());
    let ls = LayoutStore::new(store.clone(), KeyConventions::default(), per_user);
    (store, ls)
}

#[test]
fn key_derivation() {
    let (_, shared) = layouts(false);
    assert_eq!(shared.key_for("familydisplay", None), "layouts/familydisplay.json");
    assert_eq!(
        shared.key_for("familydisplay", Some("a.b@c.com")),
        "layouts/familydisplay.json"
    );

    let (_, per_user) = layouts(true);
    assert_eq!(
        per_user.key_for("familydisplay", Some("a.b@c.com")),
        "users/a_b_at_c_com/devices/familydisplay/layouts/current.json"
    );
    assert_eq!(per_user.key_for("familydisplay", None), "layouts/familydisplay.json");
}

#[test]
fn missing_layout_falls_back_to_default() {
    let (_, ls) = layouts(false);
    let (doc, source) = ls.load("kitchen", None).unwrap();
    assert_eq!(source, LayoutSource::Default);
    assert_eq!(doc, LayoutDocument::default_for("kitchen"));
}

#[test]
fn saved_layout_loads_back() {
    let (store, ls) = layouts(false);
    let payload = json!({
        "mode": "compact",
        "elements": [{"kind": "text", "x": 10, "y": 10, "w": 200, "h": 40, "type": "DATE"}]
    });
    let key = ls.save("kitchen", None, &payload).unwrap();
    assert_eq!(store.content_type(&key).as_deref(), Some("application/json"));
    let stored = String::from_utf8(store.read(&key).unwrap()).unwrap();
    assert!(stored.contains('\n'), "pretty printed");

    let (doc, source) = ls.load("kitchen", None).unwrap();
    assert_eq!(source, LayoutSource::Stored(key));
    assert_eq!(doc.device_id, "kitchen");
    assert_eq!(doc.mode, "compact");
    assert_eq!(doc.elements.len(), 1);
}

#[test]
fn save_requires_elements() {
    let (_, ls) = layouts(false);
    assert!(ls.save("kitchen", None, &json!({"mode": "x"})).is_err());
    assert!(ls.save("kitchen", None, &json!({"elements": {}})).is_err());
    assert!(ls.save("../etc", None, &json!({"elements": []})).is_err());
}

#[test]
fn corrupt_layout_falls_back() {
    let (store, ls) = layouts(false);
    store
        .write("layouts/kitchen.json", b"{\"elements\": 3}", "application/json")
        .unwrap();
    let (_, source) = ls.load("kitchen", None).unwrap();
    assert_eq!(source, LayoutSource::Default);
}

#[test]
fn unavailable_store_is_an_error() {
    let (store, ls) = layouts(false);
    store.set_offline(true);
    let err = ls.load("kitchen", None).unwrap_err();
    assert!(err.is_store_unavailable());
}

#[test]
fn unsafe_device_loads_default_but_cannot_save() {
    let (_, ls) = layouts(false);
    for device in ["", "family display", "..", "a/b"] {
        let (_, source) = ls.load(device, None).unwrap();
        assert_eq!(source, LayoutSource::Default, "{device:?}");
    }
    let payload = json!({"elements": []});
    assert!(ls.save("a/b", None, &payload).is_err());
    assert!(ls.save("", None, &payload).is_err());
}
