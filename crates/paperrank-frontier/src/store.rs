//! Uniform interface over the crawl collections

use crate::changeset::Changeset;
use crate::collection::{Collection, CollectionKind};
use crate::error::StoreError;

/// Bulk payload for [`FrontierStore::add_multiple`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Items {
    /// Members of a set
    Members(Vec<String>),
    /// Key -> value entries of a map
    Entries(Vec<(String, String)>),
}

/// Shared, concurrency-safe crawl state.
///
/// Every method is atomic on its own. Writes that must land together go
/// through [`apply`](FrontierStore::apply).
pub trait FrontierStore: Send + Sync {
    /// Check that the backend is reachable.
    fn ping(&self) -> Result<(), StoreError>;

    /// Membership (set) or key presence (map).
    fn contains(&self, collection: Collection, key: &str) -> Result<bool, StoreError>;

    /// Remove and return up to `n` members in one atomic step.
    ///
    /// Concurrent claimants never receive the same member. Sets only.
    fn claim(&self, collection: Collection, n: usize) -> Result<Vec<String>, StoreError>;

    /// Claim up to `n` members of `from` and add them to `to`, atomically.
    fn claim_into(
        &self,
        from: Collection,
        to: Collection,
        n: usize,
    ) -> Result<Vec<String>, StoreError>;

    /// Number of members (set) or keys (map).
    fn size(&self, collection: Collection) -> Result<usize, StoreError>;

    /// True iff the collection has no members; a never-created one is empty.
    fn is_empty(&self, collection: Collection) -> Result<bool, StoreError> {
        Ok(self.size(collection)? == 0)
    }

    /// All members (set) or keys (map), in no particular order.
    fn members(&self, collection: Collection) -> Result<Vec<String>, StoreError>;

    /// Value stored under `key` in a map.
    fn get(&self, collection: Collection, key: &str) -> Result<Option<String>, StoreError>;

    /// Apply all mutations or none of them, as seen by any other caller.
    fn apply(&self, changes: &Changeset) -> Result<(), StoreError>;

    /// Bulk insert: members for a set, entries for a map.
    fn add_multiple(&self, collection: Collection, items: Items) -> Result<(), StoreError> {
        let mut changes = Changeset::new();
        match items {
            Items::Members(members) => changes.add(collection, members),
            Items::Entries(entries) => changes.put(collection, entries),
        };
        self.apply(&changes)
    }

    /// Bulk delete by member (set) or key (map); absent keys are ignored.
    fn remove_multiple(&self, collection: Collection, keys: &[String]) -> Result<(), StoreError> {
        let mut changes = Changeset::new();
        changes.remove(collection, keys.iter().cloned());
        self.apply(&changes)
    }
}

/// Fail with `UnsupportedOperation` unless `collection` is a set.
pub(crate) fn require_set(
    operation: &'static str,
    collection: Collection,
) -> Result<(), StoreError> {
    match collection.kind() {
        CollectionKind::Set => Ok(()),
        CollectionKind::Map => Err(StoreError::UnsupportedOperation {
            operation,
            collection,
        }),
    }
}

/// Fail with `UnsupportedOperation` unless `collection` is a map.
pub(crate) fn require_map(
    operation: &'static str,
    collection: Collection,
) -> Result<(), StoreError> {
    match collection.kind() {
        CollectionKind::Map => Ok(()),
        CollectionKind::Set => Err(StoreError::UnsupportedOperation {
            operation,
            collection,
        }),
    }
}
