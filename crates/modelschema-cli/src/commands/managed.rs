use anyhow::Result;
use modelschema_core::{Extractor, SchemaStore, TypeKey};
use serde::Serialize;

use crate::cli::{ManagedArgs, OutputFormat};
use crate::output;

#[derive(Debug, Serialize)]
struct ManagedEntry {
    #[serde(rename = "type")]
    type_key: TypeKey,
    managed: bool,
}

pub fn managed<E: Extractor>(
    store: &SchemaStore<E>,
    args: &ManagedArgs,
    format: OutputFormat,
) -> Result<()> {
    let entries: Vec<_> = super::parse_keys(&args.types)?
        .into_iter()
        .map(|key| ManagedEntry {
            managed: store.is_managed(&key),
            type_key: key,
        })
        .collect();

    match format {
        OutputFormat::Json => output::print_json(&entries)?,
        OutputFormat::Table => {
            let rows = entries
                .iter()
                .map(|e| [e.type_key.to_string(), e.managed.to_string()])
                .collect();
            println!("{}", output::render_rows(["Type", "Managed"], rows));
        }
        OutputFormat::Text => {
            for entry in &entries {
                let label = if entry.managed { "managed" } else { "not managed" };
                println!("{}: {label}", entry.type_key);
            }
        }
    }
    Ok(())
}
