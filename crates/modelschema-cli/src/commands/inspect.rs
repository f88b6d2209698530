use anyhow::{Context, Result};
use colored::Colorize;
use modelschema_core::{Extractor, SchemaStore};

use crate::cli::{InspectArgs, OutputFormat};
use crate::output::{self, SchemaView};

pub fn inspect<E: Extractor>(
    store: &SchemaStore<E>,
    args: &InspectArgs,
    format: OutputFormat,
) -> Result<()> {
    let keys = super::parse_keys(&args.types)?;
    let mut views = Vec::with_capacity(keys.len());

    for key in &keys {
        let schema = store
            .get_schema(key)
            .with_context(|| format!("Failed to resolve {key}"))?;
        match format {
            OutputFormat::Text => print!("{}", output::render_tree(store, &schema, args.depth)?),
            OutputFormat::Table => {
                println!("{} {}", "Schema:".cyan(), key.to_string().cyan());
                println!("{}", output::render_table(store, &schema)?);
            }
            OutputFormat::Json => views.push(SchemaView::new(&schema, store.is_managed(key))),
        }
    }

    if format == OutputFormat::Json {
        output::print_json(&views)?;
    }
    Ok(())
}
