use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "modelschema")]
#[command(about = "Resolve and inspect model schemas declared in a type catalog")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./modelschema.toml when present)
    #[arg(short, long, global = true, env = "MODELSCHEMA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Type catalog file (overrides catalog.path from the configuration)
    #[arg(long, global = true, env = "MODELSCHEMA_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Log at debug level regardless of configuration
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve types and print their schemas (e.g. Node, "List<Node>")
    Inspect(InspectArgs),
    /// Resolve every managed type in the catalog and report failures
    Check,
    /// Report whether types are managed
    Managed(ManagedArgs),
}

#[derive(clap::Args)]
pub struct InspectArgs {
    /// Type keys to resolve
    #[arg(required = true)]
    pub types: Vec<String>,
    /// How many levels of nested schemas to expand in text output
    #[arg(long, default_value_t = 1)]
    pub depth: usize,
}

#[derive(clap::Args)]
pub struct ManagedArgs {
    /// Type keys to test
    #[arg(required = true)]
    pub types: Vec<String>,
}
