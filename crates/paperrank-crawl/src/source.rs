//! Citation lookup against NCBI E-utilities

use paperrank_core::{Retryable, StreamError, get_text, http_config, retry_with_backoff};

use crate::config::EutilsConfig;
use crate::elink::{LINK_CITED_IN, LINK_REFS, LinkSet, parse_elink_xml};

/// A batch lookup that failed as a whole
#[derive(Debug)]
pub enum LookupError {
    /// Transport failure or non-2xx status, after retries
    Request(StreamError),
    /// Body was not a usable `eLinkResult`
    Response(String),
}

impl std::fmt::Display for LookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request(e) => write!(f, "request failed: {e}"),
            Self::Response(msg) => write!(f, "malformed response: {msg}"),
        }
    }
}

impl std::error::Error for LookupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(e) => Some(e),
            Self::Response(_) => None,
        }
    }
}

impl Retryable for LookupError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Request(e) => e.is_retryable(),
            Self::Response(_) => false,
        }
    }
}

/// Anything that can answer "who cites and is cited by these PMIDs".
pub trait CitationSource: Send + Sync {
    /// One request for the whole batch; one linkset per resolvable PMID.
    fn fetch_linksets(&self, pmids: &[String]) -> Result<Vec<LinkSet>, LookupError>;
}

/// `elink` client over the shared HTTP runtime
pub struct EutilsClient {
    config: EutilsConfig,
}

impl EutilsClient {
    pub fn new(config: EutilsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EutilsConfig {
        &self.config
    }

    /// Query parameters; ids are repeated so each gets its own `LinkSet`.
    fn query_params(&self, pmids: &[String]) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("dbfrom", "pubmed".to_string()),
            ("linkname", format!("{LINK_CITED_IN},{LINK_REFS}")),
            ("tool", self.config.tool.clone()),
            ("email", self.config.email.clone()),
        ];
        if let Some(key) = &self.config.api_key {
            params.push(("api_key", key.clone()));
        }
        params.extend(pmids.iter().map(|id| ("id", id.clone())));
        params
    }
}

impl CitationSource for EutilsClient {
    fn fetch_linksets(&self, pmids: &[String]) -> Result<Vec<LinkSet>, LookupError> {
        let params = self.query_params(pmids);
        let label = format!("elink ({} PMIDs)", pmids.len());
        let body = retry_with_backoff(&label, http_config().max_retries, || {
            get_text(&self.config.url, &params)
        })
        .map_err(LookupError::Request)?;

        parse_elink_xml(&body).map_err(|e| LookupError::Response(format!("{e:#}")))
    }
}
