//! `annotext` CLI - annotate review texts with links, mentions and unicode escapes

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "annotext")]
#[command(about = "Annotate text with links, @mentions and unicode escapes")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/annotext/annotext.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate every text in a review payload
    Annotate {
        /// JSON file with {"reviews": [...]} or a string array (stdin if omitted or "-")
        input: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Maximum texts annotated at once
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Per-text timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Print results in input order instead of completion order
        #[arg(long)]
        ordered: bool,
    },

    /// List configured patterns in application order and check they compile
    Patterns,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line with text and style runs
    Json,
    /// Annotated text only
    Plain,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Annotate {
            input,
            format,
            jobs,
            timeout_ms,
            ordered,
        } => {
            cmd::annotate::cmd_annotate(config, input.as_deref(), format, jobs, timeout_ms, ordered)
                .await?;
        }
        Commands::Patterns => {
            cmd::patterns::cmd_patterns(config)?;
        }
    }

    Ok(())
}
