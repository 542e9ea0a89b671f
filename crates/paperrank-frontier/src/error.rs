//! Error type for frontier store operations

use paperrank_core::Retryable;

use crate::collection::Collection;

#[derive(Debug)]
pub enum StoreError {
    /// Name not in the collection table
    InvalidCollection(String),
    /// Operation not defined for the collection's kind (e.g. claim on a map)
    UnsupportedOperation {
        operation: &'static str,
        collection: Collection,
    },
    /// Backend could not be reached
    Unavailable(String),
    /// Command failed on the backend
    Backend(redis::RedisError),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCollection(name) => write!(f, "unknown collection '{name}'"),
            Self::UnsupportedOperation {
                operation,
                collection,
            } => write!(f, "{operation} is not supported on {collection}"),
            Self::Unavailable(msg) => write!(f, "store unavailable: {msg}"),
            Self::Backend(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Backend(e) => Some(e),
            _ => None,
        }
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        Self::Backend(e)
    }
}

impl Retryable for StoreError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::InvalidCollection(_) | Self::UnsupportedOperation { .. } => false,
            Self::Unavailable(_) => true,
            Self::Backend(e) => e.is_io_error() || e.is_timeout() || e.is_connection_dropped(),
        }
    }
}
