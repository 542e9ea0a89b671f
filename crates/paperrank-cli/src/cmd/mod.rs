pub mod crawl;
pub mod recover;
pub mod seed;
pub mod status;

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use paperrank_frontier::{RedisConfig, RedisStore};

use crate::config::Config;

/// Connect to the configured Redis frontier store
pub fn connect(config: &Config) -> Result<RedisStore> {
    let redis = RedisConfig::from(&config.redis);
    RedisStore::connect(&redis).with_context(|| format!("Frontier store {} unreachable", redis.url()))
}

/// Empty table with a cyan header row
pub fn styled_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(
            header
                .iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    table
}

/// Key-value table with a cyan header
pub fn table(title: &str, rows: &[(&str, String)]) -> Table {
    let mut table = styled_table(&[title, "Value"]);
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_value_table() {
        let rendered = table("Crawl", &[("State", "DONE".into())]).to_string();
        assert!(rendered.contains("Crawl"));
        assert!(rendered.contains("Value"));
        assert!(rendered.contains("DONE"));
    }

    #[test]
    fn styled_table_header() {
        let table = styled_table(&["Collection", "Kind", "Size"]);
        assert_eq!(table.header().map(|h| h.cell_count()), Some(3));
    }
}
