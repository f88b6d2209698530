use anyhow::{Result, bail};
use modelschema_core::{SchemaStore, TypeCatalog, TypeKey};
use serde::Serialize;
use tracing::info;

use crate::cli::OutputFormat;
use crate::output::{self, print_error, print_success};

#[derive(Debug, Serialize)]
pub struct CheckEntry {
    #[serde(rename = "type")]
    pub type_key: TypeKey,
    pub properties: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckEntry {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Resolves every managed, non-generic catalog type.
pub fn collect(store: &SchemaStore<TypeCatalog>) -> Vec<CheckEntry> {
    store
        .extractor()
        .managed_types()
        .into_iter()
        .map(|key| match store.get_schema(&key) {
            Ok(schema) => CheckEntry {
                properties: schema.properties().map_or(0, |p| p.len()),
                type_key: key,
                error: None,
            },
            Err(err) => CheckEntry {
                type_key: key,
                properties: 0,
                error: Some(err.to_string()),
            },
        })
        .collect()
}

pub fn check(store: &SchemaStore<TypeCatalog>, format: OutputFormat) -> Result<()> {
    let entries = collect(store);
    let failed = entries.iter().filter(|e| !e.is_ok()).count();

    match format {
        OutputFormat::Json => output::print_json(&entries)?,
        OutputFormat::Table => {
            let rows = entries
                .iter()
                .map(|e| {
                    [
                        e.type_key.to_string(),
                        e.properties.to_string(),
                        e.error.clone().unwrap_or_else(|| "ok".to_string()),
                    ]
                })
                .collect();
            println!("{}", output::render_rows(["Type", "Properties", "Status"], rows));
        }
        OutputFormat::Text => {
            for entry in &entries {
                match &entry.error {
                    None => print_success(&format!(
                        "{} ({} properties)",
                        entry.type_key, entry.properties
                    )),
                    Some(err) => print_error(err),
                }
            }
        }
    }

    let stats = store.stats();
    info!(
        types = entries.len(),
        failed,
        cached = stats.cached,
        extractions = stats.extractions,
        "Catalog check finished"
    );

    if failed > 0 {
        bail!("{failed} of {} managed type(s) failed to resolve", entries.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_reports_each_managed_type() {
        let catalog = TypeCatalog::from_toml(
            r#"
            [[types]]
            name = "Order"
            properties = [{ name = "lines", type = "List<Line>" }, { name = "id", type = "Long" }]

            [[types]]
            name = "Line"
            properties = [{ name = "order", type = "Order" }]

            [[types]]
            name = "List"
            parameters = ["T"]
            properties = [{ name = "head", type = "T" }]

            [[types]]
            name = "Broken"
            properties = [{ name = "part", type = "Missing" }]
            "#,
        )
        .unwrap();
        let store = SchemaStore::new(catalog);

        let entries = collect(&store);
        let names: Vec<_> = entries.iter().map(|e| e.type_key.to_string()).collect();
        assert_eq!(names, vec!["Broken", "Line", "Order"]);

        assert!(!entries[0].is_ok());
        assert!(entries[0].error.as_deref().unwrap().contains("Missing"));
        assert_eq!(entries[1].properties, 1);
        assert_eq!(entries[2].properties, 2);
        assert!(entries[2].is_ok());

        assert!(store.lookup(&TypeKey::of("Broken")).is_none());
        assert!(check(&store, OutputFormat::Json).is_err());
    }
}
