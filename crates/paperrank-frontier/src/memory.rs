//! In-process frontier store
//!
//! One mutex guards every collection, which makes each call and each
//! changeset trivially atomic. Nothing is persisted.

use std::sync::Mutex;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::changeset::{Changeset, Mutation};
use crate::collection::{Collection, CollectionKind};
use crate::error::StoreError;
use crate::store::{FrontierStore, require_map, require_set};

#[derive(Default)]
struct State {
    sets: FxHashMap<Collection, FxHashSet<String>>,
    maps: FxHashMap<Collection, FxHashMap<String, String>>,
}

impl State {
    fn set_mut(&mut self, collection: Collection) -> &mut FxHashSet<String> {
        self.sets.entry(collection).or_default()
    }

    fn take(&mut self, collection: Collection, n: usize) -> Vec<String> {
        let set = self.set_mut(collection);
        let taken: Vec<String> = set.iter().take(n).cloned().collect();
        for member in &taken {
            set.remove(member);
        }
        taken
    }

    fn apply(&mut self, mutation: &Mutation) {
        match mutation {
            Mutation::Add {
                collection,
                members,
            } => self.set_mut(*collection).extend(members.iter().cloned()),
            Mutation::Put {
                collection,
                entries,
            } => self
                .maps
                .entry(*collection)
                .or_default()
                .extend(entries.iter().cloned()),
            Mutation::Remove { collection, keys } => match collection.kind() {
                CollectionKind::Set => {
                    if let Some(set) = self.sets.get_mut(collection) {
                        for key in keys {
                            set.remove(key);
                        }
                    }
                }
                CollectionKind::Map => {
                    if let Some(map) = self.maps.get_mut(collection) {
                        for key in keys {
                            map.remove(key);
                        }
                    }
                }
            },
            Mutation::Subtract { collection, other } => {
                let other = self.sets.get(other).cloned().unwrap_or_default();
                self.set_mut(*collection).retain(|m| !other.contains(m));
            }
            Mutation::MoveAll { from, to } => {
                let moved = self.sets.remove(from).unwrap_or_default();
                self.set_mut(*to).extend(moved);
            }
        }
    }
}

/// Frontier store held entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrontierStore for MemoryStore {
    fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn contains(&self, collection: Collection, key: &str) -> Result<bool, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(match collection.kind() {
            CollectionKind::Set => state.sets.get(&collection).is_some_and(|s| s.contains(key)),
            CollectionKind::Map => state
                .maps
                .get(&collection)
                .is_some_and(|m| m.contains_key(key)),
        })
    }

    fn claim(&self, collection: Collection, n: usize) -> Result<Vec<String>, StoreError> {
        require_set("claim", collection)?;
        Ok(self.state.lock().unwrap().take(collection, n))
    }

    fn claim_into(
        &self,
        from: Collection,
        to: Collection,
        n: usize,
    ) -> Result<Vec<String>, StoreError> {
        require_set("claim", from)?;
        require_set("claim", to)?;
        let mut state = self.state.lock().unwrap();
        let claimed = state.take(from, n);
        state.set_mut(to).extend(claimed.iter().cloned());
        Ok(claimed)
    }

    fn size(&self, collection: Collection) -> Result<usize, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(match collection.kind() {
            CollectionKind::Set => state.sets.get(&collection).map_or(0, |s| s.len()),
            CollectionKind::Map => state.maps.get(&collection).map_or(0, |m| m.len()),
        })
    }

    fn members(&self, collection: Collection) -> Result<Vec<String>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(match collection.kind() {
            CollectionKind::Set => state
                .sets
                .get(&collection)
                .map(|s| s.iter().cloned().collect())
                .unwrap_or_default(),
            CollectionKind::Map => state
                .maps
                .get(&collection)
                .map(|m| m.keys().cloned().collect())
                .unwrap_or_default(),
        })
    }

    fn get(&self, collection: Collection, key: &str) -> Result<Option<String>, StoreError> {
        require_map("get", collection)?;
        let state = self.state.lock().unwrap();
        Ok(state
            .maps
            .get(&collection)
            .and_then(|m| m.get(key).cloned()))
    }

    fn apply(&self, changes: &Changeset) -> Result<(), StoreError> {
        // Validate everything up front so a bad mutation leaves no trace
        changes.validate()?;
        let mut state = self.state.lock().unwrap();
        for mutation in changes.mutations() {
            state.apply(mutation);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;
    use crate::store::Items;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[test]
    fn add_contains_size() {
        let store = MemoryStore::new();
        store
            .add_multiple(Collection::Explore, Items::Members(strings(&["1", "2"])))
            .unwrap();
        assert!(store.contains(Collection::Explore, "1").unwrap());
        assert!(!store.contains(Collection::Explore, "3").unwrap());
        assert_eq!(store.size(Collection::Explore).unwrap(), 2);
    }

    #[test]
    fn never_created_collection_is_empty() {
        let store = MemoryStore::new();
        for c in Collection::ALL {
            assert!(store.is_empty(c).unwrap(), "{c}");
            assert_eq!(store.size(c).unwrap(), 0);
        }
    }

    #[test]
    fn remove_ignores_absent_keys() {
        let store = MemoryStore::new();
        store
            .add_multiple(Collection::Seen, Items::Members(strings(&["1"])))
            .unwrap();
        store
            .remove_multiple(Collection::Seen, &strings(&["1", "99"]))
            .unwrap();
        assert!(store.is_empty(Collection::Seen).unwrap());
        // Removing from a collection that never existed is a no-op
        store
            .remove_multiple(Collection::Dangling, &strings(&["1"]))
            .unwrap();
    }

    #[test]
    fn map_entries_and_remove_by_key() {
        let store = MemoryStore::new();
        store
            .add_multiple(
                Collection::Out,
                Items::Entries(vec![("1".into(), r#"["2","3"]"#.into())]),
            )
            .unwrap();
        assert!(store.contains(Collection::Out, "1").unwrap());
        assert_eq!(
            store.get(Collection::Out, "1").unwrap().as_deref(),
            Some(r#"["2","3"]"#)
        );
        assert_eq!(store.size(Collection::Out).unwrap(), 1);

        // Map removal goes by key, not value
        store
            .remove_multiple(Collection::Out, &strings(&[r#"["2","3"]"#]))
            .unwrap();
        assert_eq!(store.size(Collection::Out).unwrap(), 1);
        store.remove_multiple(Collection::Out, &strings(&["1"])).unwrap();
        assert!(store.is_empty(Collection::Out).unwrap());
    }

    #[test]
    fn claim_on_map_unsupported() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.claim(Collection::Out, 1),
            Err(StoreError::UnsupportedOperation {
                operation: "claim",
                collection: Collection::Out,
            })
        ));
    }

    #[test]
    fn claim_removes_exactly_returned_members() {
        let store = MemoryStore::new();
        store
            .add_multiple(Collection::Explore, Items::Members(strings(&["1", "2", "3"])))
            .unwrap();
        let claimed = store.claim(Collection::Explore, 2).unwrap();
        assert_eq!(claimed.len(), 2);
        for pmid in &claimed {
            assert!(!store.contains(Collection::Explore, pmid).unwrap());
        }
        assert_eq!(store.size(Collection::Explore).unwrap(), 1);

        // Asking for more than available returns the rest
        let rest = store.claim(Collection::Explore, 10).unwrap();
        assert_eq!(rest.len(), 1);
        assert!(store.claim(Collection::Explore, 10).unwrap().is_empty());
    }

    #[test]
    fn claim_into_marks_claimed() {
        let store = MemoryStore::new();
        store
            .add_multiple(Collection::Explore, Items::Members(strings(&["1", "2"])))
            .unwrap();
        let claimed = store
            .claim_into(Collection::Explore, Collection::Instance, 5)
            .unwrap();
        assert_eq!(sorted(claimed), strings(&["1", "2"]));
        assert!(store.is_empty(Collection::Explore).unwrap());
        assert_eq!(
            sorted(store.members(Collection::Instance).unwrap()),
            strings(&["1", "2"])
        );
    }

    #[test]
    fn concurrent_claims_are_disjoint() {
        // m < 2n: two claimants of n = 30 over m = 50 members
        let store = Arc::new(MemoryStore::new());
        let members: Vec<String> = (0..50).map(|i| i.to_string()).collect();
        store
            .add_multiple(Collection::Explore, Items::Members(members))
            .unwrap();

        let (a, b) = rayon::join(
            || store.claim(Collection::Explore, 30).unwrap(),
            || store.claim(Collection::Explore, 30).unwrap(),
        );

        let a: HashSet<String> = a.into_iter().collect();
        let b: HashSet<String> = b.into_iter().collect();
        assert!(a.is_disjoint(&b));
        assert_eq!(a.len() + b.len(), 50);
        assert!(store.is_empty(Collection::Explore).unwrap());
    }

    #[test]
    fn invalid_changeset_applies_nothing() {
        let store = MemoryStore::new();
        let mut changes = Changeset::new();
        changes
            .add(Collection::Seen, ["1"])
            // Invalid: members into a map
            .add(Collection::Out, ["1"]);
        assert!(store.apply(&changes).is_err());
        assert!(store.is_empty(Collection::Seen).unwrap());
    }

    #[test]
    fn subtract_and_move_all() {
        let store = MemoryStore::new();
        let mut changes = Changeset::new();
        changes
            .add(Collection::Explore, ["1", "2", "3"])
            .add(Collection::Seen, ["2"])
            .subtract(Collection::Explore, Collection::Seen)
            .add(Collection::Instance, ["9"])
            .move_all(Collection::Instance, Collection::Explore);
        store.apply(&changes).unwrap();

        assert_eq!(
            sorted(store.members(Collection::Explore).unwrap()),
            strings(&["1", "3", "9"])
        );
        assert!(store.is_empty(Collection::Instance).unwrap());
    }

    #[test]
    fn get_on_set_unsupported() {
        let store = MemoryStore::new();
        assert!(store.get(Collection::Seen, "1").is_err());
    }
}
