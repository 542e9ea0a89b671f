//! Status subcommand - frontier collection sizes

use anyhow::Result;
use clap::Args;
use comfy_table::Cell;
use paperrank_core::fmt_num;
use paperrank_frontier::{Collection, FrontierStore};

use crate::cmd::{connect, styled_table};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Collections to show, by name or one-letter code (default: all)
    #[arg(value_parser = parse_collection)]
    pub collections: Vec<Collection>,
}

fn parse_collection(s: &str) -> Result<Collection, String> {
    Collection::resolve(s).map_err(|e| e.to_string())
}

pub fn run(args: StatusArgs, config: &Config) -> Result<()> {
    let store = connect(config)?;
    let collections = if args.collections.is_empty() {
        Collection::ALL.to_vec()
    } else {
        args.collections
    };

    let mut table = styled_table(&["Collection", "Kind", "Size"]);

    for collection in collections {
        let size = store.size(collection)?;
        table.add_row(vec![
            Cell::new(collection.name()),
            Cell::new(format!("{:?}", collection.kind())),
            Cell::new(fmt_num(size)),
        ]);
    }

    let exhausted = paperrank_crawl::is_frontier_exhausted(&store)?;
    eprintln!("\n{table}");
    eprintln!(
        "Frontier {}",
        if exhausted { "exhausted" } else { "has work" }
    );
    Ok(())
}
