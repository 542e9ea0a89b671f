//! Configuration loading from TOML files

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use paperrank_crawl::EutilsConfig;
use paperrank_frontier::RedisConfig;
use serde::Deserialize;

/// Global configuration for paperrank
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub redis: RedisSection,
    pub ncbi: NcbiSection,
    pub crawl: CrawlSection,
    pub http: HttpSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisSection {
    pub host: String,
    pub port: u16,
    pub db: i64,
}

impl Default for RedisSection {
    fn default() -> Self {
        let defaults = RedisConfig::default();
        Self {
            host: defaults.host,
            port: defaults.port,
            db: defaults.db,
        }
    }
}

impl From<&RedisSection> for RedisConfig {
    fn from(section: &RedisSection) -> Self {
        Self {
            host: section.host.clone(),
            port: section.port,
            db: section.db,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NcbiSection {
    pub url: String,
    pub tool: String,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub email: Option<String>,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub api_key: Option<String>,
}

impl Default for NcbiSection {
    fn default() -> Self {
        let defaults = EutilsConfig::default();
        Self {
            url: defaults.url,
            tool: defaults.tool,
            email: std::env::var("NCBI_EMAIL").ok(),
            api_key: std::env::var("NCBI_API_KEY").ok(),
        }
    }
}

impl From<&NcbiSection> for EutilsConfig {
    fn from(section: &NcbiSection) -> Self {
        Self {
            url: section.url.clone(),
            tool: section.tool.clone(),
            email: section.email.clone().unwrap_or_default(),
            api_key: section.api_key.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CrawlSection {
    pub workers: usize,
    pub batch_size: usize,
    pub poll_ms: u64,
}

impl Default for CrawlSection {
    fn default() -> Self {
        Self {
            workers: 4,
            batch_size: 50,
            poll_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    /// Per-request timeout in seconds
    pub timeout: u64,
    pub max_retries: u32,
    pub stagger_ms: u64,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout: 30,
            max_retries: 3,
            stagger_ms: 0,
        }
    }
}

/// Deserialize a string that may contain environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./paperrank.toml (current directory)
    /// 2. ~/.config/paperrank/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("paperrank.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "paperrank") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}
