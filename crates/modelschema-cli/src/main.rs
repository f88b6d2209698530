mod cli;
mod commands;
mod config;
mod observability;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use modelschema_core::{SchemaStore, TypeCatalog};
use tracing::debug;

use cli::{Cli, Commands};
use output::print_error;

fn main() {
    if let Err(e) = run() {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let app_config = config::loader::load_config(cli.config.as_deref())?;

    let level = if cli.verbose {
        "debug"
    } else {
        app_config.logging.level.as_str()
    };
    observability::init_tracing_with_level(level);
    let format = cli.format.unwrap_or_default();

    let catalog_path = cli
        .catalog
        .clone()
        .or_else(|| app_config.catalog.path.clone())
        .context("No type catalog given; pass --catalog or set catalog.path")?;
    let catalog = TypeCatalog::load(&catalog_path)
        .with_context(|| format!("Failed to load catalog {}", catalog_path.display()))?;
    let store = SchemaStore::with_config(catalog, app_config.store.clone());

    match &cli.command {
        Commands::Inspect(args) => commands::inspect::inspect(&store, args, format)?,
        Commands::Check => commands::check::check(&store, format)?,
        Commands::Managed(args) => commands::managed::managed(&store, args, format)?,
    }

    let stats = store.stats();
    debug!(
        cached = stats.cached,
        extractions = stats.extractions,
        failures = stats.failures,
        hits = stats.hits,
        "Schema store statistics"
    );
    Ok(())
}
