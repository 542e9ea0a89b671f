//! PaperRank Crawl - citation graph crawler over NCBI E-utilities
//!
//! Starting from seed PMIDs, repeatedly claims batches from the frontier,
//! looks up who each paper cites and is cited by, and commits the edges
//! and newly discovered PMIDs back to the store until nothing is left.
//!
//! # Features
//!
//! - One `elink` request and one atomic commit per batch
//! - Streaming XML parsing with quick-xml
//! - Bounded parallel workers on a rayon pool
//! - Failed lookups return their batch to the frontier
//!
//! # Example
//!
//! ```ignore
//! use paperrank_crawl::{CrawlConfig, EutilsClient, EutilsConfig, Manager, seed};
//! use paperrank_frontier::{RedisConfig, RedisStore};
//!
//! let store = RedisStore::connect(&RedisConfig::default())?;
//! seed(&store, &["21876761".to_string()])?;
//!
//! let source = EutilsClient::new(EutilsConfig::default());
//! let summary = Manager::new(&store, &source, CrawlConfig::default()).run()?;
//! println!("Processed {} PMIDs", summary.pmids_processed);
//! ```

pub mod citation;
pub mod config;
pub mod elink;
pub mod manager;
pub mod source;
pub mod update;
pub mod worker;

// Re-exports
pub use citation::{CitationRecord, Edge};
pub use config::{CrawlConfig, EutilsConfig};
pub use elink::{LinkSet, LinkSetDb, parse_elink_xml};
pub use manager::{CrawlState, CrawlSummary, Manager, is_frontier_exhausted, recover_claims, seed};
pub use source::{CitationSource, EutilsClient, LookupError};
pub use worker::{BatchOutcome, run_batch};
