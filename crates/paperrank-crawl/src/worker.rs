//! Batch query worker: one lookup and one commit per claimed batch

use paperrank_core::retry_with_backoff;
use paperrank_frontier::{Changeset, Collection, FrontierStore, StoreError};
use rustc_hash::FxHashSet;

use crate::citation::CitationRecord;
use crate::elink::LinkSet;
use crate::source::CitationSource;
use crate::update;

/// How a batch left the `INSTANCE` collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Lookup succeeded and the results were committed
    Committed {
        processed: usize,
        /// PMIDs released without being processed (also added to `NOT`)
        unresolved: Vec<String>,
    },
    /// Lookup failed; the batch was returned to `EXPLORE`
    RolledBack,
    /// Results could not be committed; the batch was returned to `EXPLORE`
    Released,
}

/// Process one claimed batch to completion.
///
/// Lookup errors roll the batch back. If the results commit keeps failing,
/// the batch is released back to `EXPLORE` instead. An error means not even
/// the release could be committed, so the claims are still in `INSTANCE`.
pub fn run_batch(
    batch: &[String],
    store: &dyn FrontierStore,
    source: &dyn CitationSource,
    commit_retries: u32,
) -> Result<BatchOutcome, StoreError> {
    let (changes, outcome) = match source.fetch_linksets(batch) {
        Ok(linksets) => {
            let (changes, processed, unresolved) = stage_results(batch, &linksets);
            if !unresolved.is_empty() {
                log::warn!("Unresolved PMIDs recorded in NOT: {unresolved:?}");
            }
            (
                changes,
                BatchOutcome::Committed {
                    processed,
                    unresolved,
                },
            )
        }
        Err(e) => {
            log::warn!("Lookup failed for PMIDs {batch:?}: {e}");
            (stage_rollback(batch), BatchOutcome::RolledBack)
        }
    };

    let label = format!("commit ({} PMIDs)", batch.len());
    let err = match retry_with_backoff(&label, commit_retries, || store.apply(&changes)) {
        Ok(()) => return Ok(outcome),
        Err(e) => e,
    };
    if outcome == BatchOutcome::RolledBack {
        log::error!("Rollback failed for PMIDs {batch:?}: {err}");
        return Err(err);
    }

    log::warn!("Commit failed for PMIDs {batch:?}: {err}, releasing claims");
    let label = format!("release ({} PMIDs)", batch.len());
    let release = stage_rollback(batch);
    match retry_with_backoff(&label, commit_retries, || store.apply(&release)) {
        Ok(()) => Ok(BatchOutcome::Released),
        Err(e) => {
            log::error!("Release failed for PMIDs {batch:?}: {e}");
            Err(e)
        }
    }
}

/// Changes for a successful lookup.
///
/// Returns the changeset, the number of processed PMIDs, and the batch
/// PMIDs that got no usable linkset.
pub fn stage_results(batch: &[String], linksets: &[LinkSet]) -> (Changeset, usize, Vec<String>) {
    let requested: FxHashSet<&str> = batch.iter().map(String::as_str).collect();
    let mut processed: FxHashSet<String> = FxHashSet::default();
    let mut changes = Changeset::new();

    for linkset in linksets {
        let record = CitationRecord::extract(linkset);
        if !record.id.is_empty() && !requested.contains(record.id.as_str()) {
            log::warn!("Ignoring linkset for unrequested PMID {}", record.id);
            continue;
        }
        if record.error {
            log::warn!(
                "Malformed linkset for PMID {:?}: {}",
                record.id,
                linkset.error.as_deref().unwrap_or("unexpected id list")
            );
        } else {
            processed.insert(record.id.clone());
        }
        update::stage(&record, &mut changes);
    }

    let unresolved: Vec<String> = batch
        .iter()
        .filter(|pmid| !processed.contains(*pmid))
        .cloned()
        .collect();

    // Batch-wide release: covers PMIDs the response never mentioned, and
    // neighbours queued by one record that a later record in the batch
    // marked as seen. Neighbours currently claimed by other workers are
    // dropped from EXPLORE too, or they would be processed twice.
    changes
        .add(Collection::Not, unresolved.iter().map(String::as_str))
        .subtract(Collection::Explore, Collection::Seen)
        .subtract(Collection::Explore, Collection::Instance)
        .remove(Collection::Instance, batch.iter().map(String::as_str));

    (changes, processed.len(), unresolved)
}

/// Changes returning a failed batch to the frontier.
pub fn stage_rollback(batch: &[String]) -> Changeset {
    let mut changes = Changeset::new();
    changes
        .remove(Collection::Instance, batch.iter().map(String::as_str))
        .add(Collection::Explore, batch.iter().map(String::as_str))
        .subtract(Collection::Explore, Collection::Seen);
    changes
}
