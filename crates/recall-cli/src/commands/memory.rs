use std::collections::BTreeMap;

use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use recall::config::Config;
use recall::memory::{MemoryRecord, MemoryStore, MemoryTier};

use crate::error::CliResult;
use crate::output::{OutputFormat, format_timestamp, print_json, truncate_string};

#[derive(Parser)]
pub struct MemoryCommand {
    #[clap(subcommand)]
    pub command: MemorySubcommand,
}

#[derive(Subcommand)]
pub enum MemorySubcommand {
    #[clap(about = "List memories")]
    List(ListArgs),

    #[clap(about = "Search memories by token overlap")]
    Search(SearchArgs),

    #[clap(about = "Manually add a memory")]
    Add(AddArgs),

    #[clap(about = "Delete a memory")]
    Delete(DeleteArgs),
}

#[derive(Parser)]
pub struct ListArgs {
    #[clap(
        long,
        short,
        default_value = "20",
        help = "Maximum number of memories to display"
    )]
    pub limit: usize,

    #[clap(
        long,
        short,
        help = "Filter by memory type (episodic, semantic, procedural)"
    )]
    pub r#type: Option<String>,
}

#[derive(Parser)]
pub struct SearchArgs {
    #[clap(help = "Query text")]
    pub query: String,

    #[clap(
        long = "type",
        short,
        help = "Memory type to search, repeatable (default: all)"
    )]
    pub types: Vec<String>,
}

#[derive(Parser)]
pub struct AddArgs {
    #[clap(help = "Memory content text")]
    pub text: String,

    #[clap(
        long,
        default_value = "semantic",
        help = "Memory type (episodic, semantic, procedural)"
    )]
    pub r#type: String,

    #[clap(long, short, help = "User the memory belongs to")]
    pub user: Option<String>,
}

#[derive(Parser)]
pub struct DeleteArgs {
    #[clap(help = "Memory type (episodic, semantic, procedural)")]
    pub tier: String,

    #[clap(help = "Memory ID within its tier")]
    pub id: u64,
}

impl MemoryCommand {
    pub async fn execute(
        &self,
        store: &MemoryStore,
        config: &Config,
        format: OutputFormat,
    ) -> CliResult<()> {
        match &self.command {
            MemorySubcommand::List(args) => Self::list(store, args, format).await,
            MemorySubcommand::Search(args) => Self::search(store, args, format).await,
            MemorySubcommand::Add(args) => Self::add(store, config, args, format).await,
            MemorySubcommand::Delete(args) => Self::delete(store, args, format).await,
        }
    }

    async fn list(store: &MemoryStore, args: &ListArgs, format: OutputFormat) -> CliResult<()> {
        let mut memories = match args.r#type.as_deref() {
            Some(t) => store.list(parse_tier(t)?).await,
            None => store.snapshot().await,
        };

        memories.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        memories.truncate(args.limit);

        print_records(&memories, format)
    }

    async fn search(store: &MemoryStore, args: &SearchArgs, format: OutputFormat) -> CliResult<()> {
        let tiers = if args.types.is_empty() {
            MemoryTier::ALL.to_vec()
        } else {
            args.types
                .iter()
                .map(|t| parse_tier(t))
                .collect::<CliResult<Vec<_>>>()?
        };

        let memories = store.search(&args.query, &tiers).await;
        print_records(&memories, format)
    }

    async fn add(
        store: &MemoryStore,
        config: &Config,
        args: &AddArgs,
        format: OutputFormat,
    ) -> CliResult<()> {
        let user_id = args
            .user
            .clone()
            .unwrap_or_else(|| config.pipeline.default_user_id.clone());

        let record = match parse_tier(&args.r#type)? {
            MemoryTier::Semantic => store.add_fact(&args.text, "manual").await?,
            MemoryTier::Procedural => store.add_user_preference(&user_id, &args.text).await?,
            MemoryTier::Episodic => {
                let metadata = BTreeMap::from([
                    ("user_id".to_string(), user_id),
                    ("source".to_string(), "manual".to_string()),
                ]);
                store.write(args.text.clone(), MemoryTier::Episodic, metadata).await?
            }
        };

        match format {
            OutputFormat::Json => print_json(&record)?,
            OutputFormat::Table => {
                println!("Memory created successfully.");
                println!("ID: {} ({})", record.id, record.tier);
            }
        }

        Ok(())
    }

    async fn delete(store: &MemoryStore, args: &DeleteArgs, format: OutputFormat) -> CliResult<()> {
        let tier = parse_tier(&args.tier)?;
        let deleted = store.delete(tier, args.id).await?;

        match format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "tier": tier,
                    "id": args.id,
                    "deleted": deleted.is_some(),
                });
                print_json(&output)?;
            }
            OutputFormat::Table => {
                if deleted.is_some() {
                    println!("Memory {tier}/{} deleted successfully.", args.id);
                } else {
                    println!("Memory {tier}/{} not found.", args.id);
                }
            }
        }

        Ok(())
    }
}

fn parse_tier(value: &str) -> CliResult<MemoryTier> {
    value
        .parse::<MemoryTier>()
        .map_err(|e| format!("{e}. Use episodic, semantic, or procedural.").into())
}

fn print_records(memories: &[MemoryRecord], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(memories)?,
        OutputFormat::Table => {
            if memories.is_empty() {
                println!("No memories found.");
                return Ok(());
            }

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL_CONDENSED)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(["ID", "Type", "Content", "Created"]);

            for memory in memories {
                table.add_row([
                    memory.id.to_string(),
                    memory.tier.to_string(),
                    truncate_string(&memory.content, 60),
                    format_timestamp(&memory.timestamp),
                ]);
            }

            println!("{table}");
            println!("\nTotal: {} memories", memories.len());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tier_accepts_known_names() {
        assert_eq!(parse_tier("procedural").unwrap(), MemoryTier::Procedural);
    }

    #[test]
    fn test_parse_tier_rejects_unknown() {
        let err = parse_tier("hot").unwrap_err();
        assert!(err.to_string().contains("Use episodic, semantic, or procedural."));
    }
}
