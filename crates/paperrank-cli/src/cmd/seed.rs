//! Seed subcommand - admit starting PMIDs to the frontier

use anyhow::{Context, Result};
use clap::Args;
use paperrank_frontier::{Collection, FrontierStore};

use crate::cmd::connect;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct SeedArgs {
    /// PMIDs to start crawling from
    #[arg(required = true, value_parser = parse_pmid)]
    pub pmids: Vec<String>,
}

/// PMIDs are positive decimal integers
fn parse_pmid(s: &str) -> Result<String, String> {
    let s = s.trim();
    match s.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n.to_string()),
        _ => Err(format!("not a PMID: {s:?}")),
    }
}

pub fn run(args: SeedArgs, config: &Config) -> Result<()> {
    let store = connect(config)?;
    let before = store.size(Collection::Explore)?;
    paperrank_crawl::seed(&store, &args.pmids).context("Failed to seed frontier")?;
    let after = store.size(Collection::Explore)?;

    eprintln!(
        "Seeded {} of {} PMIDs ({} to explore)",
        after.saturating_sub(before),
        args.pmids.len(),
        after
    );
    Ok(())
}
