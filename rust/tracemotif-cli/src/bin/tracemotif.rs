//! tracemotif: inspect and prune the trace and motif files of a dataset.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser as ClapParser, Subcommand};
use serde::Serialize;
use tracemotif_cli::commands::{self, CliError, Workspace};
use tracemotif_cli::error_chain::chain_from_error;
use tracemotif_store::{MotifVariant, StoreConfig};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "tracemotif", version, about = "Inspect and prune execution-trace datasets")]
struct Cli {
    /// Path to a tracemotif.toml (default: search upward from the current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured data root
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the base ids of a dataset's traces
    List {
        dataset: String,
    },
    /// Summarize one trace file
    InspectTrace {
        dataset: String,
        base_id: String,
    },
    /// Summarize one motif file
    InspectMotifs {
        dataset: String,
        base_id: String,
        /// Motif file variant, e.g. complete, collapsed-pruned
        #[arg(long, default_value = "complete")]
        variant: MotifVariant,
    },
    /// Prune a complete motif file and write its pruned sibling
    Prune {
        dataset: String,
        base_id: String,
        /// Complete variant to prune, e.g. complete, fuzzy-collapsed-complete
        #[arg(long, default_value = "complete")]
        variant: MotifVariant,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(out) => {
            println!("{}", out);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", chain_from_error(&err).format_for_display());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<String, CliError> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load_from(path)?,
        None => StoreConfig::load()?,
    };
    if let Some(root) = cli.data_root {
        config.data_root = root;
    }
    let ws = Workspace::new(config);

    match cli.command {
        Commands::List { dataset } => {
            let ids = commands::list_traces(&ws, &dataset)?;
            Ok(if cli.json { to_json(&ids) } else { ids.join("\n") })
        }
        Commands::InspectTrace { dataset, base_id } => {
            let summary = commands::inspect_trace(&ws, &dataset, &base_id)?;
            Ok(render(&summary, cli.json))
        }
        Commands::InspectMotifs {
            dataset,
            base_id,
            variant,
        } => {
            let summary = commands::inspect_motifs(&ws, &dataset, &base_id, variant)?;
            Ok(render(&summary, cli.json))
        }
        Commands::Prune {
            dataset,
            base_id,
            variant,
        } => {
            let report = commands::prune(&ws, &dataset, &base_id, variant)?;
            Ok(render(&report, cli.json))
        }
    }
}

fn render<T: Serialize + std::fmt::Display>(value: &T, json: bool) -> String {
    if json {
        to_json(value)
    } else {
        value.to_string()
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}
