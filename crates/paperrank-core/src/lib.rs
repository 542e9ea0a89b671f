//! PaperRank Core - Common infrastructure for the citation crawler
//!
//! Logging, progress display, graceful shutdown, the shared HTTP client and
//! runtime, retry with backoff, and the in-flight worker counter.

pub mod inflight;
pub mod logging;
pub mod progress;
pub mod retry;
pub mod shutdown;
pub mod stream;

// Re-exports for convenience
pub use inflight::{InFlight, Slot};
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_num};
pub use retry::{Retryable, backoff_duration, retry_with_backoff};
pub use shutdown::{install_signal_handlers, shutdown_flag};
pub use stream::{
    HttpConfig, SHARED_RUNTIME, StreamError, get_text, http_config, set_http_config,
};
