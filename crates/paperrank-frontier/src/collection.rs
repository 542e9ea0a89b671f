//! Named crawl collections and their abbreviation table

use crate::error::StoreError;

/// Structural kind of a collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectionKind {
    Set,
    Map,
}

/// The eight collections making up the persisted crawl state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    /// PMID -> outbound citations (JSON array), read by the ranker
    Out,
    /// Fully processed PMIDs
    Seen,
    /// Directed citation edges
    Graph,
    /// Unclaimed frontier
    Explore,
    /// PMIDs claimed by an in-flight batch
    Instance,
    /// PMIDs the upstream API could not resolve
    Not,
    /// Reserved audit sink, never written
    Log,
    /// Processed PMIDs without any citation
    Dangling,
}

impl Collection {
    pub const ALL: [Collection; 8] = [
        Self::Out,
        Self::Seen,
        Self::Graph,
        Self::Explore,
        Self::Instance,
        Self::Not,
        Self::Log,
        Self::Dangling,
    ];

    /// Look up a collection by its one-letter abbreviation
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'O' => Some(Self::Out),
            'S' => Some(Self::Seen),
            'G' => Some(Self::Graph),
            'E' => Some(Self::Explore),
            'I' => Some(Self::Instance),
            'N' => Some(Self::Not),
            'L' => Some(Self::Log),
            'D' => Some(Self::Dangling),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            Self::Out => 'O',
            Self::Seen => 'S',
            Self::Graph => 'G',
            Self::Explore => 'E',
            Self::Instance => 'I',
            Self::Not => 'N',
            Self::Log => 'L',
            Self::Dangling => 'D',
        }
    }

    /// Full name, also the storage key
    pub fn name(self) -> &'static str {
        match self {
            Self::Out => "OUT",
            Self::Seen => "SEEN",
            Self::Graph => "GRAPH",
            Self::Explore => "EXPLORE",
            Self::Instance => "INSTANCE",
            Self::Not => "NOT",
            Self::Log => "LOG",
            Self::Dangling => "DANGLING",
        }
    }

    pub fn kind(self) -> CollectionKind {
        match self {
            Self::Out => CollectionKind::Map,
            _ => CollectionKind::Set,
        }
    }

    /// Resolve an abbreviation (`"E"`) or full name (`"EXPLORE"`).
    pub fn resolve(name: &str) -> Result<Self, StoreError> {
        let mut chars = name.chars();
        let by_code = match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_code(c),
            _ => None,
        };
        by_code
            .or_else(|| Self::ALL.into_iter().find(|c| c.name() == name))
            .ok_or_else(|| StoreError::InvalidCollection(name.to_string()))
    }
}

impl std::str::FromStr for Collection {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s)
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_abbreviations() {
        assert_eq!(Collection::resolve("O").unwrap(), Collection::Out);
        assert_eq!(Collection::resolve("S").unwrap(), Collection::Seen);
        assert_eq!(Collection::resolve("G").unwrap(), Collection::Graph);
        assert_eq!(Collection::resolve("E").unwrap(), Collection::Explore);
        assert_eq!(Collection::resolve("I").unwrap(), Collection::Instance);
        assert_eq!(Collection::resolve("N").unwrap(), Collection::Not);
        assert_eq!(Collection::resolve("L").unwrap(), Collection::Log);
        assert_eq!(Collection::resolve("D").unwrap(), Collection::Dangling);
    }

    #[test]
    fn resolve_full_names() {
        for c in Collection::ALL {
            assert_eq!(Collection::resolve(c.name()).unwrap(), c);
        }
    }

    #[test]
    fn resolve_unknown_fails() {
        for name in ["X", "", "explore", "EXPLORED", "EE"] {
            match Collection::resolve(name) {
                Err(StoreError::InvalidCollection(n)) => assert_eq!(n, name),
                other => panic!("expected InvalidCollection for {name:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn code_roundtrip() {
        for c in Collection::ALL {
            assert_eq!(Collection::from_code(c.code()), Some(c));
        }
    }

    #[test]
    fn only_out_is_map() {
        for c in Collection::ALL {
            let expected = if c == Collection::Out {
                CollectionKind::Map
            } else {
                CollectionKind::Set
            };
            assert_eq!(c.kind(), expected, "{c}");
        }
    }
}
