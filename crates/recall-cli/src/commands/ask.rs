use std::sync::Arc;

use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use recall::config::Config;
use recall::oracle::RemoteOracle;
use recall::pipeline::{Orchestrator, Query, Trace};

use crate::error::{CliError, CliResult};
use crate::output::{OutputFormat, print_json, truncate_string};

#[derive(Parser)]
pub struct AskCommand {
    #[clap(help = "Question to answer")]
    pub query: String,

    #[clap(long, short, help = "User identifier recorded with the interaction")]
    pub user: Option<String>,

    #[clap(long, help = "Run without the memory store")]
    pub no_memory: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> CliResult<()> {
        let mut config = config.clone();
        if self.no_memory {
            config.pipeline.memory_enabled = false;
        }

        let oracle = Arc::new(RemoteOracle::new(&config.oracle)?);
        let orchestrator = Orchestrator::from_config(&config, oracle).await?;

        let query = match &self.user {
            Some(user) => Query::for_user(self.query.as_str(), user.as_str()),
            None => Query::new(self.query.as_str()),
        };

        match orchestrator.run(query).await {
            Ok(trace) => print_trace(&trace, format),
            Err(failure) => {
                print_trace(&failure.trace, format)?;
                Err(CliError::from(failure))
            }
        }
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn print_trace(trace: &Trace, format: OutputFormat) -> CliResult<()> {
    if format == OutputFormat::Json {
        return print_json(trace);
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(["Property", "Value"]);

    table.add_row(["Run ID".to_string(), trace.run_id.to_string()]);
    table.add_row(["User".to_string(), trace.user_id.clone()]);
    table.add_row(["Stage".to_string(), trace.stage.to_string()]);

    if let Some(routing) = &trace.routing {
        table.add_row([
            "Needs retrieval".to_string(),
            yes_no(routing.needs_retrieval).to_string(),
        ]);
        table.add_row(["Sources".to_string(), routing.sources.join(", ")]);
    }

    if let Some(retrieval) = &trace.retrieval {
        table.add_row(["Retrieved".to_string(), retrieval.items.len().to_string()]);
        if !retrieval.unknown.is_empty() {
            table.add_row(["Unknown sources".to_string(), retrieval.unknown.join(", ")]);
        }
        for failure in &retrieval.failures {
            table.add_row([
                format!("Failed: {}", failure.source_name),
                truncate_string(&failure.message, 60),
            ]);
        }
    }

    if let Some(verdict) = &trace.validation {
        table.add_row([
            "Validation".to_string(),
            format!(
                "{}/10, use: {}",
                verdict.relevance_score,
                yes_no(verdict.accept)
            ),
        ]);
    }
    table.add_row(["Context items".to_string(), trace.context.len().to_string()]);

    if let Some(decision) = &trace.memory_decision {
        let tiers: Vec<String> = decision
            .memory_types_to_search
            .iter()
            .map(|t| t.to_string())
            .collect();
        table.add_row([
            "Memory search".to_string(),
            format!("{} ({})", yes_no(decision.search_memory), tiers.join(", ")),
        ]);
        table.add_row([
            "Memories used".to_string(),
            trace.memory_context.len().to_string(),
        ]);
    }

    for record in &trace.new_memories {
        table.add_row([
            format!("New {} #{}", record.tier, record.id),
            truncate_string(&record.content, 60),
        ]);
    }

    if let Some(stats) = &trace.memory_stats {
        table.add_row([
            "Store".to_string(),
            format!(
                "{} episodic, {} semantic, {} procedural",
                stats.episodic, stats.semantic, stats.procedural
            ),
        ]);
    }

    println!("{table}");

    if let Some(answer) = &trace.answer {
        println!("\n{answer}");
    }

    Ok(())
}
