//! Citation record extraction from parsed linksets

use std::fmt;
use std::str::FromStr;

use crate::elink::LinkSet;

/// Interpreted citation data for one PMID.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationRecord {
    /// Source PMID; empty when the linkset named none
    pub id: String,
    /// PMIDs this paper cites
    pub outbound: Vec<String>,
    /// PMIDs citing this paper
    pub inbound: Vec<String>,
    /// The linkset could not be interpreted; the PMID is not processed
    pub error: bool,
}

impl CitationRecord {
    /// Interpret one linkset.
    ///
    /// A linkset is malformed when it names zero or several source ids or
    /// carries an `ERROR` element. Link names ending in `_refs` are outbound,
    /// `_citedin` inbound; anything else is ignored.
    pub fn extract(linkset: &LinkSet) -> Self {
        let id = linkset.ids.first().cloned().unwrap_or_default();

        if linkset.ids.len() != 1 || linkset.error.is_some() {
            return Self {
                id,
                error: true,
                ..Default::default()
            };
        }

        let mut record = Self {
            id,
            ..Default::default()
        };
        for db in &linkset.link_dbs {
            if db.link_name.ends_with("_refs") {
                record.outbound.extend(db.links.iter().cloned());
            } else if db.link_name.ends_with("_citedin") {
                record.inbound.extend(db.links.iter().cloned());
            } else {
                log::debug!("Ignoring link {} for PMID {}", db.link_name, record.id);
            }
        }
        record
    }

    /// Citation edges: `(id, o)` for outbound, `(i, id)` for inbound.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        let outbound = self.outbound.iter().map(|to| Edge::new(&self.id, to));
        let inbound = self.inbound.iter().map(|from| Edge::new(from, &self.id));
        outbound.chain(inbound)
    }

    pub fn edge_count(&self) -> usize {
        self.outbound.len() + self.inbound.len()
    }

    /// No citations in either direction
    pub fn is_dangling(&self) -> bool {
        !self.error && self.edge_count() == 0
    }
}

/// Directed citation `from -> to` (`from` cites `to`).
///
/// Stored in `GRAPH` as the text `("from","to")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

impl Edge {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(\"{}\",\"{}\")", self.from, self.to)
    }
}

impl FromStr for Edge {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("(\"")
            .and_then(|rest| rest.strip_suffix("\")"))
            .and_then(|inner| inner.split_once("\",\""))
            .map(|(from, to)| Edge::new(from, to))
            .ok_or_else(|| format!("invalid edge: {s}"))
    }
}
