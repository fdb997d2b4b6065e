use rewire::{DiError, Key, Resource, ResourceIdentity};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

fn hash_of(key: &Key) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn test_canonical_name_joins_namespace_and_name() {
    let key = Key::new("db_path", "app.storage").unwrap();
    assert_eq!(key.name(), "db_path");
    assert_eq!(key.namespace(), "app.storage");
    assert_eq!(key.canonical_name(), "app.storage.db_path");
}

#[test]
fn test_name_rejects_dot() {
    match Key::new("a.b", "app") {
        Err(DiError::InvalidName { name }) => assert_eq!(name, "a.b"),
        other => panic!("expected InvalidName, got {:?}", other),
    }
    // The namespace is free-form; dots are its whole point.
    assert!(Key::new("leaf", "deeply.nested.module").is_ok());
}

#[test]
fn test_identity_is_structural() {
    let a = Key::new("db", "app").unwrap();
    let b = Key::new("db", "app").unwrap();
    let c = Key::new("db", "other").unwrap();

    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
    assert_ne!(a, c);

    // Independently constructed keys address the same map slot.
    let mut map = HashMap::new();
    map.insert(a, 1);
    map.insert(b, 2);
    assert_eq!(map.len(), 1);
}

#[test]
fn test_ordering_follows_canonical_name() {
    let mut keys = vec![
        Key::new("b", "zz").unwrap(),
        Key::new("a", "app").unwrap(),
        Key::new("z", "app").unwrap(),
    ];
    keys.sort();
    let names: Vec<&str> = keys.iter().map(|k| k.canonical_name()).collect();
    assert_eq!(names, vec!["app.a", "app.z", "zz.b"]);
}

#[test]
fn test_resource_exposes_its_key() {
    let res: Resource<String> = Resource::new("config", "app").unwrap();
    assert_eq!(res.name(), "config");
    assert_eq!(res.namespace(), "app");
    assert_eq!(res.canonical_name(), "app.config");
    assert_eq!(res.key().canonical_name(), "app.config");
}

#[test]
fn test_resource_name_validation_mirrors_key() {
    let err = Resource::<u32>::new("a.b", "app").unwrap_err();
    assert!(matches!(err, DiError::InvalidName { .. }));
}

#[test]
fn test_clones_share_identity() {
    let res: Resource<u32> = Resource::new("port", "app").unwrap();
    let dup = res.clone();
    assert_eq!(res.key(), dup.key());
    assert_eq!(hash_of(res.key()), hash_of(dup.key()));
}

#[test]
fn test_debug_shows_canonical_name() {
    let key = Key::new("db", "app").unwrap();
    assert_eq!(format!("{:?}", key), "Key(\"app.db\")");

    let res: Resource<u32> = Resource::new("db", "app").unwrap();
    assert_eq!(format!("{:?}", res), "Resource(\"app.db\")");
}
