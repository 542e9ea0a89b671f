//! Staged store mutations applied as one atomic commit

use crate::collection::Collection;
use crate::error::StoreError;
use crate::store::{require_map, require_set};

/// One staged write against a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Insert members into a set
    Add {
        collection: Collection,
        members: Vec<String>,
    },
    /// Insert or overwrite key -> value entries in a map
    Put {
        collection: Collection,
        entries: Vec<(String, String)>,
    },
    /// Delete members (set) or keys (map); absent ones are ignored
    Remove {
        collection: Collection,
        keys: Vec<String>,
    },
    /// `collection := collection - other`, both sets
    Subtract {
        collection: Collection,
        other: Collection,
    },
    /// Move every member of `from` into `to`, leaving `from` empty
    MoveAll { from: Collection, to: Collection },
}

impl Mutation {
    /// Check the mutation against the kinds of the collections it touches.
    pub fn validate(&self) -> Result<(), StoreError> {
        match self {
            Self::Add { collection, .. } => require_set("add members", *collection),
            Self::Put { collection, .. } => require_map("put entries", *collection),
            Self::Remove { .. } => Ok(()),
            Self::Subtract { collection, other } => {
                require_set("subtract", *collection)?;
                require_set("subtract", *other)
            }
            Self::MoveAll { from, to } => {
                require_set("move", *from)?;
                require_set("move", *to)
            }
        }
    }
}

/// Ordered list of mutations committed all-or-nothing.
///
/// Builder methods skip empty member lists, so an empty changeset means
/// there is nothing to write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    mutations: Vec<Mutation>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<I, S>(&mut self, collection: Collection, members: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members: Vec<String> = members.into_iter().map(Into::into).collect();
        if !members.is_empty() {
            self.mutations.push(Mutation::Add {
                collection,
                members,
            });
        }
        self
    }

    pub fn put<I, K, V>(&mut self, collection: Collection, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries: Vec<(String, String)> = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        if !entries.is_empty() {
            self.mutations.push(Mutation::Put {
                collection,
                entries,
            });
        }
        self
    }

    pub fn remove<I, S>(&mut self, collection: Collection, keys: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        if !keys.is_empty() {
            self.mutations.push(Mutation::Remove { collection, keys });
        }
        self
    }

    pub fn subtract(&mut self, collection: Collection, other: Collection) -> &mut Self {
        self.mutations.push(Mutation::Subtract { collection, other });
        self
    }

    pub fn move_all(&mut self, from: Collection, to: Collection) -> &mut Self {
        self.mutations.push(Mutation::MoveAll { from, to });
        self
    }

    /// Append every mutation of `other` after the current ones.
    pub fn extend(&mut self, other: Changeset) -> &mut Self {
        self.mutations.extend(other.mutations);
        self
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Validate every mutation; backends call this before writing anything.
    pub fn validate(&self) -> Result<(), StoreError> {
        self.mutations.iter().try_for_each(Mutation::validate)
    }
}
