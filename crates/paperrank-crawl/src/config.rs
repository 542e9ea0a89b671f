//! Crawl configuration

use std::time::Duration;

/// E-utilities `elink` endpoint and caller identity
#[derive(Debug, Clone)]
pub struct EutilsConfig {
    pub url: String,
    /// Registered tool name sent with every request
    pub tool: String,
    /// Contact address sent with every request
    pub email: String,
    /// Raises the NCBI rate limit from 3 to 10 requests per second
    pub api_key: Option<String>,
}

impl Default for EutilsConfig {
    fn default() -> Self {
        Self {
            url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/elink.fcgi".to_string(),
            tool: "paperrank".to_string(),
            email: String::new(),
            api_key: None,
        }
    }
}

/// Runtime configuration for the crawl manager
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Maximum concurrently running batches
    pub workers: usize,
    /// PMIDs claimed per batch
    pub batch_size: usize,
    /// Upper bound on the manager's wait between frontier checks
    pub poll_interval: Duration,
    /// Pause after each dispatch
    pub stagger: Duration,
    /// Retries for a failed batch commit
    pub commit_retries: u32,
    /// Move stranded claims back to the frontier before starting
    pub recover_claims: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            batch_size: 50,
            poll_interval: Duration::from_millis(100),
            stagger: Duration::ZERO,
            commit_retries: 3,
            recover_claims: false,
        }
    }
}

impl CrawlConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.workers > 0, "workers must be at least 1");
        anyhow::ensure!(self.batch_size > 0, "batch size must be at least 1");
        Ok(())
    }
}
