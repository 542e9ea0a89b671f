//! Shared HTTP client and runtime for sync callers.
//!
//! Requests run on async reqwest inside a shared tokio runtime, but the
//! interface is blocking so rayon workers can call it directly.

use std::sync::{LazyLock, OnceLock};
use std::time::Duration;

use crate::retry::Retryable;

/// Connect timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Process-wide HTTP settings (config file defaults, CLI overrides)
#[derive(Debug, Clone, Copy)]
pub struct HttpConfig {
    /// Whole-request timeout, body included
    pub timeout: Duration,
    /// Maximum retry attempts for transient failures
    pub max_retries: u32,
    /// Milliseconds between consecutive batch dispatches
    pub stagger_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            stagger_ms: 0,
        }
    }
}

static HTTP_CONFIG: OnceLock<HttpConfig> = OnceLock::new();

/// Install the global HTTP settings. Only the first call wins.
pub fn set_http_config(config: HttpConfig) {
    if HTTP_CONFIG.set(config).is_err() {
        log::debug!("HTTP config already set, keeping existing values");
    }
}

/// Current HTTP settings, or defaults if none were installed.
pub fn http_config() -> HttpConfig {
    HTTP_CONFIG.get().copied().unwrap_or_default()
}

/// Error types for HTTP operations
#[derive(Debug)]
pub enum StreamError {
    /// HTTP error with optional status code (no status = transport failure)
    Http {
        status: Option<u16>,
        message: String,
    },
    /// No complete response within the configured timeout
    Timeout(Duration),
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Timeout(d) => write!(f, "request timed out after {}s", d.as_secs()),
        }
    }
}

impl std::error::Error for StreamError {}

impl StreamError {
    /// Create HTTP error from reqwest error.
    ///
    /// The URL is stripped first: E-utilities URLs carry the API key.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        let e = e.without_url();
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

impl Retryable for StreamError {
    fn is_retryable(&self) -> bool {
        match self {
            // Rate limit, server errors and transport failures
            Self::Http { status, .. } => {
                matches!(status, None | Some(429) | Some(500..=599))
            }
            Self::Timeout(_) => true,
        }
    }
}

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_max_idle_per_host(8)
        .build()
        .expect("failed to build HTTP client")
});

/// Shared tokio runtime for HTTP and Redis operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Blocking HTTP GET returning the body as text.
///
/// Non-2xx statuses become [`StreamError::Http`] with the status set.
pub fn get_text(url: &str, query: &[(&str, String)]) -> Result<String, StreamError> {
    let timeout = http_config().timeout;
    SHARED_RUNTIME.handle().block_on(async {
        let request = async {
            let response = SHARED_CLIENT
                .get(url)
                .query(query)
                .send()
                .await?
                .error_for_status()?;
            response.text().await
        };

        match tokio::time::timeout(timeout, request).await {
            Ok(result) => result.map_err(StreamError::from_reqwest),
            Err(_) => Err(StreamError::Timeout(timeout)),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_err(status: u16) -> StreamError {
        StreamError::Http {
            status: Some(status),
            message: "test".to_string(),
        }
    }

    #[test]
    fn http_429_retryable() {
        assert!(http_err(429).is_retryable());
    }

    #[test]
    fn http_500_retryable() {
        assert!(http_err(500).is_retryable());
        assert!(http_err(503).is_retryable());
    }

    #[test]
    fn http_400_not_retryable() {
        assert!(!http_err(400).is_retryable());
        assert!(!http_err(404).is_retryable());
    }

    #[test]
    fn http_none_status_retryable() {
        // Network error without status code should be retryable
        let err = StreamError::Http {
            status: None,
            message: "connection refused".to_string(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn timeout_retryable() {
        assert!(StreamError::Timeout(Duration::from_secs(5)).is_retryable());
    }

    #[test]
    fn display_http_with_status() {
        assert_eq!(format!("{}", http_err(404)), "HTTP 404: test");
    }

    #[test]
    fn display_timeout() {
        let err = StreamError::Timeout(Duration::from_secs(30));
        assert_eq!(format!("{err}"), "request timed out after 30s");
    }

    #[test]
    fn default_http_config() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.stagger_ms, 0);
    }
}
