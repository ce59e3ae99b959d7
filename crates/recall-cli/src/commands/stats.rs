use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use recall::memory::{MemoryStore, MemoryTier};

use crate::error::CliResult;
use crate::output::{OutputFormat, print_json};

#[derive(Parser)]
pub struct StatsCommand {}

impl StatsCommand {
    pub async fn execute(&self, store: &MemoryStore, format: OutputFormat) -> CliResult<()> {
        let stats = store.stats().await;

        match format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "path": store.path().display().to_string(),
                    "episodic": stats.episodic,
                    "semantic": stats.semantic,
                    "procedural": stats.procedural,
                    "total": stats.total(),
                });
                print_json(&output)?;
            }
            OutputFormat::Table => {
                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["Tier", "Records"]);

                for tier in MemoryTier::ALL {
                    table.add_row([tier.to_string(), stats.count(tier).to_string()]);
                }
                table.add_row(["Total".to_string(), stats.total().to_string()]);

                println!("{table}");
                println!("\nStore: {}", store.path().display());
            }
        }

        Ok(())
    }
}
