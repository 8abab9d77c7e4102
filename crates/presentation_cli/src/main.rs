//! Crucible CLI
//!
//! Command-line interface for running queries against local models.

#![allow(clippy::print_stdout)]

use std::sync::Arc;

use application::Orchestrator;
use clap::{Parser, Subcommand};
use domain::{Query, RunMode};
use infrastructure::{
    AppConfig, ChromaSearchAdapter, MokaAnswerCache, OllamaGenerationAdapter, init_telemetry,
};

/// Crucible CLI
#[derive(Parser)]
#[command(name = "crucible-cli")]
#[command(author, version, about = "Crucible reasoning engine CLI", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file name (without extension)
    #[arg(short, long, default_value = "config")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query through the engine
    Ask {
        /// The question to answer
        query: String,

        /// Run mode: arena or swarm
        #[arg(short, long, default_value = "swarm")]
        mode: RunMode,

        /// Print the full run trace as JSON
        #[arg(long)]
        trace: bool,
    },

    /// List models known to the inference server
    Models,

    /// Check that the inference server and vector store are reachable
    Health,
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn build_adapters(
    config: &AppConfig,
) -> anyhow::Result<(OllamaGenerationAdapter, ChromaSearchAdapter)> {
    let generation = OllamaGenerationAdapter::new(config.inference.clone())?;
    let embedder = ai_core::OllamaEmbeddingEngine::new(config.embedding.clone())?;
    let store = integration_chroma::ChromaClient::new(config.chroma.clone())?;
    Ok((generation, ChromaSearchAdapter::new(embedder, store)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from(&cli.config)?;
    if cli.verbose > 0 {
        config.telemetry.log_filter = log_filter_from_verbosity(cli.verbose).to_string();
    }
    init_telemetry(&config.telemetry);

    match cli.command {
        Commands::Ask { query, mode, trace } => {
            let query = Query::new(query, mode)?;
            let (generation, search) = build_adapters(&config)?;
            let mut orchestrator =
                Orchestrator::new(config.engine, Arc::new(generation), Arc::new(search))?;
            if config.cache.enabled {
                orchestrator = orchestrator
                    .with_answer_cache(Arc::new(MokaAnswerCache::new(&config.cache)));
            }

            match orchestrator.run_with_default_deadline(&query).await {
                Ok(report) => {
                    if let Some(arena) = &report.arena {
                        println!("⚔️  Arena: {} vs {}", arena.left, arena.right);
                        println!();
                    }
                    println!("{}", report.answer);

                    if trace {
                        println!();
                        println!("📜 Trace ({} entries):", report.trace.entries().len());
                        println!("{}", serde_json::to_string_pretty(&report.trace)?);
                    }
                },
                Err(failure) => {
                    println!("❌ {failure}");
                    if trace {
                        println!();
                        println!("📜 Partial trace ({} entries):", failure.trace.entries().len());
                        println!("{}", serde_json::to_string_pretty(&failure.trace)?);
                    }
                    std::process::exit(1);
                },
            }
        },

        Commands::Models => {
            let generation = OllamaGenerationAdapter::new(config.inference.clone())?;
            let models = generation.list_models().await?;

            println!("📦 Available Models:");
            for model in models {
                println!("  {model}");
            }
        },

        Commands::Health => {
            let (generation, search) = build_adapters(&config)?;

            let inference_ok = generation.health_check().await.unwrap_or(false);
            let store_ok = search.health_check().await;

            println!(
                "{} Inference server ({})",
                if inference_ok { "✅" } else { "❌" },
                config.inference.base_url
            );
            println!(
                "{} Vector store ({})",
                if store_ok { "✅" } else { "❌" },
                config.chroma.base_url
            );

            if !(inference_ok && store_ok) {
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_filter_verbosity_levels() {
        assert_eq!(log_filter_from_verbosity(0), "warn");
        assert_eq!(log_filter_from_verbosity(1), "info");
        assert_eq!(log_filter_from_verbosity(2), "debug");
        assert_eq!(log_filter_from_verbosity(3), "trace");
        assert_eq!(log_filter_from_verbosity(10), "trace");
    }

    #[test]
    fn cli_parses_ask_with_mode() {
        let cli = Cli::parse_from(["crucible-cli", "ask", "why is the sky blue", "--mode", "arena"]);
        match cli.command {
            Commands::Ask { query, mode, trace } => {
                assert_eq!(query, "why is the sky blue");
                assert_eq!(mode, RunMode::Arena);
                assert!(!trace);
            },
            _ => panic!("expected ask command"),
        }
    }

    #[test]
    fn cli_defaults_to_swarm() {
        let cli = Cli::parse_from(["crucible-cli", "ask", "question"]);
        match cli.command {
            Commands::Ask { mode, .. } => assert_eq!(mode, RunMode::Swarm),
            _ => panic!("expected ask command"),
        }
    }

    #[test]
    fn cli_rejects_unknown_mode() {
        let result = Cli::try_parse_from(["crucible-cli", "ask", "question", "--mode", "duet"]);
        assert!(result.is_err());
    }
}
