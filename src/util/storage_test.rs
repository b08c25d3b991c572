use super::*;

#[test]
fn memory_storage_set_get_remove() {
    let tier = MemoryStorage::new();
    assert!(tier.is_empty());
    tier.set_item("k", "v");
    assert_eq!(tier.get_item("k").as_deref(), Some("v"));
    tier.set_item("k", "w");
    assert_eq!(tier.get_item("k").as_deref(), Some("w"));
    assert_eq!(tier.len(), 1);
    tier.remove_item("k");
    assert_eq!(tier.get_item("k"), None);
}

#[test]
fn load_json_reads_saved_value() {
    let tier = MemoryStorage::new();
    save_json(&tier, "nums", &vec![1, 2, 3]);
    assert_eq!(load_json::<Vec<i32>>(&tier, "nums"), Some(vec![1, 2, 3]));
}

#[test]
fn load_json_treats_garbage_as_absent() {
    let tier = MemoryStorage::new();
    tier.set_item("user", "{not json");
    assert_eq!(load_json::<Vec<i32>>(&tier, "user"), None);
    assert_eq!(load_json::<Vec<i32>>(&tier, "missing"), None);
}

#[cfg(not(feature = "hydrate"))]
#[test]
fn browser_storage_is_inert_outside_the_browser() {
    let tier = BrowserStorage::new(TierKind::Tab);
    tier.set_item("k", "v");
    assert_eq!(tier.get_item("k"), None);
    tier.remove_item("k");
    assert_eq!(tier.kind(), TierKind::Tab);
}
