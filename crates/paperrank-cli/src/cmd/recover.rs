//! Recover subcommand - requeue claims stranded by an interrupted crawl

use anyhow::{Context, Result};

use crate::cmd::connect;
use crate::config::Config;

pub fn run(config: &Config) -> Result<()> {
    let store = connect(config)?;
    let moved = paperrank_crawl::recover_claims(&store).context("Failed to recover claims")?;
    if moved == 0 {
        eprintln!("No stranded claims");
    } else {
        eprintln!("Requeued {moved} claims to EXPLORE");
    }
    Ok(())
}
