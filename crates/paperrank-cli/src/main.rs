//! paperrank - PubMed citation graph crawler
//!
//! Crawls the PubMed citation graph through NCBI E-utilities, starting from
//! seed PMIDs, and accumulates the graph in Redis.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "paperrank")]
#[command(about = "PubMed citation graph crawler")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./paperrank.toml or ~/.config/paperrank/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Also append log lines to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Maximum retry attempts for transient failures
    #[arg(long, global = true)]
    max_retries: Option<u32>,

    /// Milliseconds between batch dispatches
    #[arg(long, global = true)]
    stagger_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Crawl until the frontier is exhausted or interrupted
    Crawl(cmd::crawl::CrawlArgs),
    /// Add starting PMIDs to the frontier
    Seed(cmd::seed::SeedArgs),
    /// Show collection sizes
    Status(cmd::status::StatusArgs),
    /// Requeue claims left behind by an interrupted crawl
    Recover,
    /// Show current configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(paperrank_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug, the spinner shows activity
    //   non-TTY: info unless --debug, logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    if let Err(e) = paperrank_core::init_logging(quiet, cli.debug, multi, cli.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::from(2);
    }

    if let Err(e) = paperrank_core::install_signal_handlers() {
        log::warn!("Cannot install signal handlers: {e}");
    }

    match run(cli, &progress) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli, progress: &paperrank_core::SharedProgress) -> Result<ExitCode> {
    // Load configuration
    let config = if let Some(path) = &cli.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    // Apply HTTP settings (config file defaults, CLI overrides)
    let http_config = paperrank_core::HttpConfig {
        timeout: Duration::from_secs(config.http.timeout),
        max_retries: cli.max_retries.unwrap_or(config.http.max_retries),
        stagger_ms: cli.stagger_ms.unwrap_or(config.http.stagger_ms),
    };
    paperrank_core::set_http_config(http_config);

    match cli.command {
        Command::Crawl(args) => cmd::crawl::run(args, &config, progress),
        Command::Seed(args) => cmd::seed::run(args, &config).map(|()| ExitCode::SUCCESS),
        Command::Status(args) => cmd::status::run(args, &config).map(|()| ExitCode::SUCCESS),
        Command::Recover => cmd::recover::run(&config).map(|()| ExitCode::SUCCESS),
        Command::Config => {
            let http = paperrank_core::http_config();
            let redis = paperrank_frontier::RedisConfig::from(&config.redis);
            let table = cmd::table(
                "Setting",
                &[
                    ("Redis", redis.url()),
                    ("E-utilities URL", config.ncbi.url.clone()),
                    ("Tool", config.ncbi.tool.clone()),
                    (
                        "Email",
                        config.ncbi.email.clone().unwrap_or_else(|| "not set".into()),
                    ),
                    (
                        "API key",
                        if config.ncbi.api_key.is_some() {
                            "configured".into()
                        } else {
                            "not set".into()
                        },
                    ),
                    ("Workers", config.crawl.workers.to_string()),
                    ("Batch size", config.crawl.batch_size.to_string()),
                    ("Poll interval", format!("{}ms", config.crawl.poll_ms)),
                    ("Timeout", format!("{}s", http.timeout.as_secs())),
                    ("Max retries", http.max_retries.to_string()),
                    ("Stagger", format!("{}ms", http.stagger_ms)),
                ],
            );
            eprintln!("\n{table}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_crawl_with_overrides() {
        let cli = Cli::try_parse_from([
            "paperrank",
            "--stagger-ms",
            "350",
            "crawl",
            "--workers",
            "8",
            "--recover",
        ])
        .unwrap();
        assert_eq!(cli.stagger_ms, Some(350));
        match cli.command {
            Command::Crawl(args) => {
                assert_eq!(args.workers, Some(8));
                assert!(args.batch_size.is_none());
                assert!(args.recover);
            }
            _ => panic!("expected crawl"),
        }
    }

    #[test]
    fn status_accepts_codes_and_names() {
        let cli = Cli::try_parse_from(["paperrank", "status", "E", "INSTANCE"]).unwrap();
        match cli.command {
            Command::Status(args) => assert_eq!(
                args.collections,
                vec![
                    paperrank_frontier::Collection::Explore,
                    paperrank_frontier::Collection::Instance
                ]
            ),
            _ => panic!("expected status"),
        }
        assert!(Cli::try_parse_from(["paperrank", "status", "Q"]).is_err());
    }

    #[test]
    fn seed_requires_pmids() {
        assert!(Cli::try_parse_from(["paperrank", "seed"]).is_err());
        assert!(Cli::try_parse_from(["paperrank", "seed", "abc"]).is_err());
        let cli = Cli::try_parse_from(["paperrank", "seed", "1", "2"]).unwrap();
        match cli.command {
            Command::Seed(args) => assert_eq!(args.pmids, vec!["1", "2"]),
            _ => panic!("expected seed"),
        }
    }
}
