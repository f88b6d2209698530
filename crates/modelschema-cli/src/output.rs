use colored::Colorize;
use modelschema_core::{
    ModelProperty, ModelSchema, Result, SchemaKind, SchemaResolver, SchemaState, TypeKey,
};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// JSON shape of one resolved schema.
#[derive(Debug, Serialize)]
pub struct SchemaView {
    #[serde(rename = "type")]
    pub type_key: TypeKey,
    pub kind: SchemaKind,
    pub state: SchemaState,
    pub managed: bool,
    pub properties: Vec<ModelProperty>,
}

impl SchemaView {
    pub fn new(schema: &ModelSchema, managed: bool) -> Self {
        let properties = schema
            .properties()
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default();
        Self {
            type_key: schema.key().clone(),
            kind: schema.kind(),
            state: schema.state(),
            managed,
            properties,
        }
    }
}

/// Renders `schema` as an indented property tree, expanding nested struct
/// schemas up to `depth` levels. A type already on the current path is
/// marked `(cycle)` and not expanded again.
pub fn render_tree(
    resolver: &dyn SchemaResolver,
    schema: &ModelSchema,
    depth: usize,
) -> Result<String> {
    let mut out = format!("{} ({})\n", schema.key(), schema.kind());
    let mut path = vec![schema.key().clone()];
    write_properties(resolver, schema, depth, 1, &mut path, &mut out)?;
    Ok(out)
}

fn write_properties(
    resolver: &dyn SchemaResolver,
    schema: &ModelSchema,
    remaining: usize,
    indent: usize,
    path: &mut Vec<TypeKey>,
    out: &mut String,
) -> Result<()> {
    if remaining == 0 {
        return Ok(());
    }
    let Some(properties) = schema.properties() else {
        return Ok(());
    };

    for property in properties.values() {
        let cycle = path.contains(property.type_key());
        out.push_str(&"  ".repeat(indent));
        out.push_str(property.name());
        out.push_str(": ");
        out.push_str(&property.type_key().to_string());
        if !property.is_writable() {
            out.push_str(" (read-only)");
        }
        if cycle {
            out.push_str(" (cycle)");
        }
        out.push('\n');

        if cycle || remaining == 1 {
            continue;
        }
        let nested = property.resolve(resolver)?;
        if nested.kind() == SchemaKind::Struct {
            path.push(nested.key().clone());
            write_properties(resolver, &nested, remaining - 1, indent + 1, path, out)?;
            path.pop();
        }
    }
    Ok(())
}

/// Renders the direct properties of `schema` as a table.
pub fn render_table(resolver: &dyn SchemaResolver, schema: &ModelSchema) -> Result<String> {
    let properties = schema.properties().unwrap_or_default();
    if properties.is_empty() {
        return Ok(format!("{} has no properties.", schema.key()));
    }

    let mut builder = Builder::default();
    builder.push_record(["Property", "Type", "Kind", "Getter", "Setter"]);
    for property in properties.values() {
        let nested = property.resolve(resolver)?;
        let accessor = property.accessor();
        builder.push_record([
            property.name().to_string(),
            property.type_key().to_string(),
            nested.kind().to_string(),
            accessor.getter.clone(),
            accessor.setter.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    Ok(builder.build().with(Style::rounded()).to_string())
}

/// Renders rows of `(header, values)` as a rounded table.
pub fn render_rows<const N: usize>(header: [&str; N], rows: Vec<[String; N]>) -> String {
    let mut builder = Builder::default();
    builder.push_record(header);
    for row in rows {
        builder.push_record(row);
    }
    builder.build().with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelschema_core::{SchemaStore, TypeCatalog};

    const CATALOG: &str = r#"
        [[types]]
        name = "Node"
        properties = [
          { name = "label", type = "String" },
          { name = "parent", type = "Node", writable = false },
          { name = "meta", type = "Meta" },
        ]

        [[types]]
        name = "Meta"
        properties = [
          { name = "owner", type = "Node" },
          { name = "visible", type = "Boolean" },
        ]
    "#;

    fn store() -> SchemaStore<TypeCatalog> {
        SchemaStore::new(TypeCatalog::from_toml(CATALOG).unwrap())
    }

    #[test]
    fn test_render_tree_depth_one() {
        let store = store();
        let node = store.get_schema(&TypeKey::of("Node")).unwrap();
        let text = render_tree(&store, &node, 1).unwrap();
        assert_eq!(
            text,
            "Node (struct)\n  label: String\n  meta: Meta\n  parent: Node (read-only) (cycle)\n"
        );
    }

    #[test]
    fn test_render_tree_marks_cycles() {
        let store = store();
        let node = store.get_schema(&TypeKey::of("Node")).unwrap();
        let text = render_tree(&store, &node, 3).unwrap();
        assert_eq!(
            text,
            "Node (struct)\n\
             \x20 label: String\n\
             \x20 meta: Meta\n\
             \x20   owner: Node (cycle)\n\
             \x20   visible: Boolean\n\
             \x20 parent: Node (read-only) (cycle)\n"
        );
    }

    #[test]
    fn test_render_tree_depth_zero_prints_header_only() {
        let store = store();
        let node = store.get_schema(&TypeKey::of("Node")).unwrap();
        assert_eq!(render_tree(&store, &node, 0).unwrap(), "Node (struct)\n");
    }

    #[test]
    fn test_schema_view_json() {
        let store = store();
        let meta = store.get_schema(&TypeKey::of("Meta")).unwrap();
        let view = SchemaView::new(&meta, store.is_managed(meta.key()));
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["type"], "Meta");
        assert_eq!(json["kind"], "struct");
        assert_eq!(json["state"], "complete");
        assert_eq!(json["managed"], true);
        assert_eq!(json["properties"][0]["name"], "owner");
        assert_eq!(json["properties"][0]["type"], "Node");
        assert_eq!(json["properties"][1]["accessor"]["getter"], "isVisible");
    }

    #[test]
    fn test_render_table() {
        let store = store();
        let meta = store.get_schema(&TypeKey::of("Meta")).unwrap();
        let table = render_table(&store, &meta).unwrap();
        assert!(table.contains("Property"));
        assert!(table.contains("isVisible"));
        assert!(table.contains("setOwner"));
        assert!(table.contains("value"));

        let string = store.get_schema(&TypeKey::of("String")).unwrap();
        assert_eq!(
            render_table(&store, &string).unwrap(),
            "String has no properties."
        );
    }
}
