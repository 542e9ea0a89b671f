//! Integration tests for the Redis frontier store
//!
//! These tests need a running Redis server and are marked #[ignore] by default.
//! They use database 15 and clear the crawl keys before each test.
//! Run with: cargo test -p paperrank-frontier --test redis_store -- --ignored --test-threads=1

use std::collections::HashSet;

use paperrank_frontier::{Changeset, Collection, FrontierStore, Items, RedisConfig, RedisStore};

fn connect() -> RedisStore {
    let config = RedisConfig {
        host: std::env::var("REDIS_HOST").unwrap_or_else(|_| "localhost".into()),
        port: 6379,
        db: 15,
    };
    let store = RedisStore::connect(&config).expect("Redis should be reachable");
    for c in Collection::ALL {
        let members = store.members(c).unwrap();
        if !members.is_empty() {
            store.remove_multiple(c, &members).unwrap();
        }
    }
    store
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
#[ignore]
fn set_and_map_roundtrip() {
    let store = connect();
    store
        .add_multiple(Collection::Explore, Items::Members(strings(&["1", "2"])))
        .unwrap();
    store
        .add_multiple(
            Collection::Out,
            Items::Entries(vec![("1".into(), r#"["2","3"]"#.into())]),
        )
        .unwrap();

    assert!(store.contains(Collection::Explore, "1").unwrap());
    assert_eq!(store.size(Collection::Explore).unwrap(), 2);
    assert!(store.contains(Collection::Out, "1").unwrap());
    assert_eq!(
        store.get(Collection::Out, "1").unwrap().as_deref(),
        Some(r#"["2","3"]"#)
    );
    assert!(store.is_empty(Collection::Dangling).unwrap());
}

#[test]
#[ignore]
fn claim_into_is_atomic_and_disjoint() {
    let store = connect();
    let members: Vec<String> = (0..50).map(|i| i.to_string()).collect();
    store
        .add_multiple(Collection::Explore, Items::Members(members))
        .unwrap();

    let (a, b) = std::thread::scope(|s| {
        let a = s.spawn(|| {
            store
                .claim_into(Collection::Explore, Collection::Instance, 30)
                .unwrap()
        });
        let b = s.spawn(|| {
            store
                .claim_into(Collection::Explore, Collection::Instance, 30)
                .unwrap()
        });
        (a.join().unwrap(), b.join().unwrap())
    });

    let a: HashSet<String> = a.into_iter().collect();
    let b: HashSet<String> = b.into_iter().collect();
    assert!(a.is_disjoint(&b));
    assert_eq!(a.len() + b.len(), 50);
    assert!(store.is_empty(Collection::Explore).unwrap());
    assert_eq!(store.size(Collection::Instance).unwrap(), 50);
}

#[test]
#[ignore]
fn claim_into_large_batch() {
    let store = connect();
    let members: Vec<String> = (0..20_000).map(|i| i.to_string()).collect();
    store
        .add_multiple(Collection::Explore, Items::Members(members))
        .unwrap();

    let claimed = store
        .claim_into(Collection::Explore, Collection::Instance, 12_500)
        .unwrap();
    assert_eq!(claimed.len(), 12_500);
    assert_eq!(store.size(Collection::Instance).unwrap(), 12_500);
    assert_eq!(store.size(Collection::Explore).unwrap(), 7_500);
}

#[test]
#[ignore]
fn changeset_commits_in_order() {
    let store = connect();
    let mut changes = Changeset::new();
    changes
        .add(Collection::Explore, ["1", "2", "3"])
        .add(Collection::Seen, ["2"])
        .subtract(Collection::Explore, Collection::Seen)
        .add(Collection::Instance, ["9"])
        .move_all(Collection::Instance, Collection::Explore);
    store.apply(&changes).unwrap();

    let mut explore = store.members(Collection::Explore).unwrap();
    explore.sort();
    assert_eq!(explore, strings(&["1", "3", "9"]));
    assert!(store.is_empty(Collection::Instance).unwrap());
}

#[test]
#[ignore]
fn claim_on_map_rejected_without_touching_redis() {
    let store = connect();
    assert!(store.claim(Collection::Out, 1).is_err());
}
