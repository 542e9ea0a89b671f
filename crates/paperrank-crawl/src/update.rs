//! Graph update protocol: the store transitions for one citation record
//!
//! Staging is pure; nothing touches the store until the caller commits the
//! changeset.

use paperrank_frontier::{Changeset, Collection};
use serde_json::Value;

use crate::citation::CitationRecord;

/// Stage the mutations that settle `record`'s claim.
///
/// A processed record is added to `SEEN` and either `DANGLING` (no edges)
/// or `GRAPH`/`OUT` with its neighbours queued in `EXPLORE`. A malformed
/// record only releases its claim and is noted in `NOT`.
pub fn stage(record: &CitationRecord, changes: &mut Changeset) {
    if record.error {
        if !record.id.is_empty() {
            changes
                .add(Collection::Not, [record.id.as_str()])
                .remove(Collection::Instance, [record.id.as_str()]);
        }
        return;
    }

    let id = record.id.as_str();
    changes.add(Collection::Seen, [id]);

    if record.edge_count() == 0 {
        changes.add(Collection::Dangling, [id]);
    } else {
        changes
            .add(Collection::Graph, record.edges().map(|e| e.to_string()))
            .put(Collection::Out, [(id, encode_outbound(&record.outbound))])
            .add(
                Collection::Explore,
                record.inbound.iter().chain(&record.outbound).map(String::as_str),
            )
            .subtract(Collection::Explore, Collection::Seen);
    }

    changes.remove(Collection::Instance, [id]);
}

/// Changeset for a single record
pub fn changes_for(record: &CitationRecord) -> Changeset {
    let mut changes = Changeset::new();
    stage(record, &mut changes);
    changes
}

/// `OUT` value: outbound PMIDs as a JSON array of strings.
pub fn encode_outbound(outbound: &[String]) -> String {
    Value::from(outbound.to_vec()).to_string()
}

pub fn decode_outbound(value: &str) -> Result<Vec<String>, serde_json::Error> {
    serde_json::from_str(value)
}
