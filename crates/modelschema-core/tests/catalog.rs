//! End-to-end resolution of catalog-declared types through the store.

use std::sync::Arc;

use modelschema_core::{
    CatalogError, SchemaError, SchemaKind, SchemaStore, TypeCatalog, TypeKey,
};

const GRAPH_CATALOG: &str = r#"
    [[types]]
    name = "Graph"
    properties = [
      { name = "root", type = "Node" },
      { name = "name", type = "String" },
    ]

    [[types]]
    name = "Node"
    properties = [
      { name = "label", type = "String" },
      { name = "children", type = "List<Node>" },
      { name = "owner", type = "Graph", writable = false },
    ]

    [[types]]
    name = "List"
    parameters = ["T"]
    properties = [
      { name = "head", type = "T" },
      { name = "tail", type = "List<T>" },
      { name = "empty", type = "Boolean" },
    ]

    [[types]]
    name = "Broken"
    properties = [{ name = "part", type = "Missing" }]
"#;

fn store() -> SchemaStore<TypeCatalog> {
    SchemaStore::new(TypeCatalog::from_toml(GRAPH_CATALOG).unwrap())
}

fn key(text: &str) -> TypeKey {
    text.parse().unwrap()
}

#[test]
fn node_holding_a_collection_of_itself_terminates() {
    let store = store();
    let node = store.get_schema(&key("Node")).unwrap();
    assert_eq!(node.property_names(), vec!["children", "label", "owner"]);

    let children = node.property("children").unwrap();
    assert_eq!(children.type_key(), &key("List<Node>"));

    let list = children.resolve(&store).unwrap();
    assert!(list.is_complete());
    let head = list.property("head").unwrap().resolve(&store).unwrap();
    assert!(Arc::ptr_eq(&head, &node));
    let tail = list.property("tail").unwrap().resolve(&store).unwrap();
    assert!(Arc::ptr_eq(&tail, &list));

    let owner = node.property("owner").unwrap();
    assert!(!owner.is_writable());
    let graph = owner.resolve(&store).unwrap();
    let root = graph.property("root").unwrap().resolve(&store).unwrap();
    assert!(Arc::ptr_eq(&root, &node));
}

#[test]
fn parameterizations_are_distinct_schemas() {
    let store = store();
    let nodes = store.get_schema(&key("List<Node>")).unwrap();
    let strings = store.get_schema(&key("List< String >")).unwrap();

    assert!(!Arc::ptr_eq(&nodes, &strings));
    assert_eq!(
        strings.property("head").unwrap().type_key(),
        &key("String")
    );
    assert_eq!(store.get_schema(&key("String")).unwrap().kind(), SchemaKind::Value);
}

#[test]
fn boolean_properties_use_is_getters() {
    let store = store();
    let list = store.get_schema(&key("List<String>")).unwrap();
    assert_eq!(list.property("empty").unwrap().accessor().getter, "isEmpty");
}

#[test]
fn unknown_nested_type_fails_whole_extraction() {
    let store = store();
    let err = store.get_schema(&key("Broken")).unwrap_err();
    match &err {
        SchemaError::Extraction(inner) => {
            assert_eq!(inner.key, key("Missing"));
            assert_eq!(inner.reason, "unknown type");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(store.lookup(&key("Broken")).is_none());
}

#[test]
fn wrong_parameterization_is_an_extraction_error() {
    let store = store();
    let err = store.get_schema(&key("List")).unwrap_err();
    assert!(matches!(err, SchemaError::Extraction(_)));

    let err = store.get_schema(&key("Node<String>")).unwrap_err();
    assert!(matches!(err, SchemaError::Extraction(_)));
}

#[test]
fn managed_predicate_follows_catalog() {
    let store = store();
    assert!(store.is_managed(&key("Node")));
    assert!(store.is_managed(&key("List<Node>")));
    assert!(!store.is_managed(&key("String")));
    assert!(!store.is_managed(&key("Missing")));
    assert!(store.is_empty());
}

#[test]
fn malformed_catalog_is_rejected() {
    let err = TypeCatalog::from_toml("[[types]]\nname = \"Box\"\nproperties = [{ name = \"x\", type = \"List<\" }]\n")
        .unwrap_err();
    assert!(matches!(err, CatalogError::InvalidPropertyType { .. }));
}

#[test]
fn ever_growing_generic_stops_at_depth_limit() {
    let catalog = TypeCatalog::from_toml(
        r#"
        [[types]]
        name = "Nest"
        parameters = ["T"]
        properties = [
          { name = "value", type = "T" },
          { name = "inner", type = "Nest<Nest<T>>" },
        ]
        "#,
    )
    .unwrap();
    let store = SchemaStore::new(catalog);
    let limit = store.config().max_depth;

    let err = store.get_schema(&key("Nest<String>")).unwrap_err();
    match &err {
        SchemaError::Extraction(inner) => {
            assert_eq!(inner.key.name(), "Nest");
            assert!(inner.reason.contains(&format!("maximum depth of {limit}")));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(store.is_empty());
    assert_eq!(store.stats().failures as usize, limit);
}
