//! PaperRank Frontier - persistent crawl state
//!
//! Eight named collections (seven sets and one map) holding the crawl
//! frontier, claims, processed identifiers and the accumulated citation
//! graph. Two backends implement [`FrontierStore`]:
//!
//! - [`RedisStore`]: production backend; collections live under their full
//!   names so downstream consumers can read `GRAPH` and `OUT` directly
//! - [`MemoryStore`]: single-process backend for tests and dry runs
//!
//! All writes belonging to one crawl step are staged in a [`Changeset`] and
//! applied atomically.

pub mod changeset;
pub mod collection;
pub mod error;
pub mod memory;
pub mod redis_store;
pub mod store;

// Re-exports
pub use changeset::{Changeset, Mutation};
pub use collection::{Collection, CollectionKind};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use redis_store::{RedisConfig, RedisStore};
pub use store::{FrontierStore, Items};
