//! # modelschema-core
//!
//! Cycle-safe schema cache for managed model types.
//!
//! A [`SchemaStore`] computes, once per [`TypeKey`], a [`ModelSchema`]
//! describing the named, typed properties of a model type. Extraction is
//! delegated to an [`Extractor`]; the store publishes each schema as a stub
//! before resolving its properties so recursive and mutually recursive type
//! graphs terminate and every type is extracted at most once.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use modelschema_core::{SchemaStore, TypeCatalog, TypeKey};
//!
//! let catalog = TypeCatalog::from_toml(r#"
//!     [[types]]
//!     name = "Node"
//!     properties = [
//!       { name = "label", type = "String" },
//!       { name = "parent", type = "Node" },
//!     ]
//! "#).unwrap();
//! let store = SchemaStore::new(catalog);
//!
//! let node = store.get_schema(&TypeKey::of("Node")).unwrap();
//! assert_eq!(node.property_names(), vec!["label", "parent"]);
//!
//! let parent = node.property("parent").unwrap().resolve(&store).unwrap();
//! assert!(Arc::ptr_eq(&node, &parent));
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod extractor;
pub mod materializer;
pub mod property;
pub mod schema;
pub mod store;
pub mod type_key;

pub use catalog::{CatalogError, PropertyDeclaration, TypeCatalog, TypeDeclaration};
pub use config::{DuplicatePropertyPolicy, StoreConfig};
pub use error::{ErrorCategory, ExtractionError, Result, SchemaError, TypeKeyParseError};
pub use extractor::{ExtractedSchema, Extractor};
pub use materializer::PropertyMaterializer;
pub use property::{ModelProperty, PropertyAccessor, PropertyFactory};
pub use schema::{ModelSchema, PropertyMap, SchemaKind, SchemaState};
pub use store::{SchemaResolver, SchemaStore, StoreStats};
pub use type_key::TypeKey;
