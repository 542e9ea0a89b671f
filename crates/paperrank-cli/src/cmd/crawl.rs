//! Crawl subcommand - run the citation crawl to exhaustion

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use paperrank_core::{SharedProgress, fmt_num, http_config};
use paperrank_crawl::{CrawlConfig, EutilsClient, EutilsConfig, Manager};

use crate::cmd::{connect, table};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// Maximum concurrent batches
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// PMIDs per batch
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Requeue claims left behind by a previous run before starting
    #[arg(long)]
    pub recover: bool,
}

pub fn run(args: CrawlArgs, config: &Config, progress: &SharedProgress) -> Result<ExitCode> {
    let store = connect(config)?;
    let eutils = EutilsConfig::from(&config.ncbi);
    if eutils.email.is_empty() {
        log::warn!("No NCBI contact email configured; set [ncbi] email in paperrank.toml");
    }
    if eutils.api_key.is_none() {
        log::info!("No NCBI API key; requests are limited to 3 per second");
    }
    let source = EutilsClient::new(eutils);

    let http = http_config();
    let crawl_config = CrawlConfig {
        workers: args.workers.unwrap_or(config.crawl.workers),
        batch_size: args.batch_size.unwrap_or(config.crawl.batch_size),
        poll_interval: Duration::from_millis(config.crawl.poll_ms),
        stagger: Duration::from_millis(http.stagger_ms),
        commit_retries: http.max_retries,
        recover_claims: args.recover,
    };

    let summary = Manager::new(&store, &source, crawl_config)
        .with_progress(progress.clone())
        .run()?;

    let crawl_table = table(
        "Crawl",
        &[
            (
                "Batches",
                format!(
                    "{} dispatched ({} committed, {} rolled back, {} released)",
                    fmt_num(summary.batches_dispatched),
                    fmt_num(summary.batches_committed),
                    fmt_num(summary.batches_rolled_back),
                    fmt_num(summary.batches_released)
                ),
            ),
            (
                "PMIDs",
                format!(
                    "{} processed, {} unresolved",
                    fmt_num(summary.pmids_processed),
                    fmt_num(summary.pmids_unresolved)
                ),
            ),
            ("State", summary.final_state.to_string()),
            ("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())),
        ],
    );
    progress.println(format!("\n{crawl_table}"));

    if summary.cancelled {
        log::warn!("Crawl interrupted; run again to continue from the stored frontier");
        return Ok(ExitCode::from(130));
    }
    Ok(ExitCode::SUCCESS)
}
