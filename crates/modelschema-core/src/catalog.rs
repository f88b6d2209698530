//! Declarative extractor backed by a TOML type catalog.
//!
//! The catalog lists model types and their properties instead of discovering
//! them reflectively:
//!
//! ```toml
//! [[types]]
//! name = "Pair"
//! parameters = ["A", "B"]
//! properties = [
//!   { name = "first", type = "A" },
//!   { name = "second", type = "B", writable = false },
//! ]
//!
//! [[types]]
//! name = "Money"
//! kind = "value"
//! ```
//!
//! Common scalar types are always available as value types.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{ExtractionError, TypeKeyParseError};
use crate::extractor::{ExtractedSchema, Extractor};
use crate::property::{PropertyAccessor, PropertyFactory, capitalize};
use crate::schema::{ModelSchema, SchemaKind};
use crate::type_key::TypeKey;

/// Scalar value types every catalog knows.
pub const BUILTIN_VALUE_TYPES: &[&str] = &[
    "String",
    "Boolean",
    "Integer",
    "Long",
    "Double",
    "Float",
    "Character",
    "Byte",
    "Short",
    "BigDecimal",
    "BigInteger",
];

/// Errors raised while loading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Type '{0}' is declared more than once")]
    DuplicateType(String),

    #[error("'{0}' is not a valid type name")]
    InvalidTypeName(String),

    #[error("Property '{property}' of '{owner}' has an invalid type: {source}")]
    InvalidPropertyType {
        owner: String,
        property: String,
        #[source]
        source: TypeKeyParseError,
    },

    #[error("Type parameter '{parameter}' of '{owner}' shadows a declared type")]
    ParameterShadowsType { owner: String, parameter: String },

    #[error("Value type '{0}' cannot declare properties")]
    ValueWithProperties(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    types: Vec<TypeDeclaration>,
}

/// One type as written in the catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDeclaration {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default = "default_kind")]
    pub kind: SchemaKind,
    /// Defaults to `true` for structs; value types are never managed.
    #[serde(default)]
    pub managed: Option<bool>,
    #[serde(default)]
    pub properties: Vec<PropertyDeclaration>,
}

fn default_kind() -> SchemaKind {
    SchemaKind::Struct
}

impl TypeDeclaration {
    pub fn structure(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            kind: SchemaKind::Struct,
            managed: None,
            properties: Vec::new(),
        }
    }

    pub fn value(name: impl Into<String>) -> Self {
        Self {
            kind: SchemaKind::Value,
            ..Self::structure(name)
        }
    }

    pub fn with_parameters(mut self, parameters: &[&str]) -> Self {
        self.parameters = parameters.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_property(mut self, name: &str, type_expr: &str) -> Self {
        self.properties.push(PropertyDeclaration {
            name: name.to_string(),
            type_expr: type_expr.to_string(),
            writable: true,
        });
        self
    }

    pub fn unmanaged(mut self) -> Self {
        self.managed = Some(false);
        self
    }
}

/// One property as written in the catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub type_expr: String,
    #[serde(default = "default_writable")]
    pub writable: bool,
}

fn default_writable() -> bool {
    true
}

#[derive(Debug)]
struct CatalogProperty {
    name: String,
    declared_type: TypeKey,
    accessor: PropertyAccessor,
}

#[derive(Debug)]
struct CatalogEntry {
    parameters: Vec<String>,
    kind: SchemaKind,
    managed: bool,
    properties: Vec<CatalogProperty>,
}

/// Extractor that answers from declared types.
#[derive(Debug)]
pub struct TypeCatalog {
    entries: HashMap<String, CatalogEntry>,
}

impl Default for TypeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TypeCatalog {
    /// A catalog holding only the built-in value types.
    pub fn builtin() -> Self {
        let entries = BUILTIN_VALUE_TYPES
            .iter()
            .map(|name| {
                let entry = CatalogEntry {
                    parameters: Vec::new(),
                    kind: SchemaKind::Value,
                    managed: false,
                    properties: Vec::new(),
                };
                (name.to_string(), entry)
            })
            .collect();
        Self { entries }
    }

    /// Parses a catalog from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content)?;
        Self::from_declarations(file.types)
    }

    /// Reads and parses a catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_toml(&content)?;
        debug!(path = %path.display(), types = catalog.len(), "Loaded type catalog");
        Ok(catalog)
    }

    pub fn from_declarations(
        declarations: impl IntoIterator<Item = TypeDeclaration>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::builtin();
        let mut declared = Vec::new();
        for declaration in declarations {
            declared.push(declaration.name.clone());
            catalog.insert(declaration)?;
        }
        // Parameters are checked once every name is known.
        for name in &declared {
            catalog.check_parameters(name)?;
        }
        Ok(catalog)
    }

    /// Adds one declaration to the catalog.
    pub fn declare(&mut self, declaration: TypeDeclaration) -> Result<(), CatalogError> {
        let name = declaration.name.clone();
        self.insert(declaration)?;
        if let Err(err) = self.check_parameters(&name) {
            self.entries.remove(&name);
            return Err(err);
        }
        Ok(())
    }

    /// Number of known types, built-ins included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Managed, non-generic types, sorted by name.
    pub fn managed_types(&self) -> Vec<TypeKey> {
        let mut names: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.managed && entry.parameters.is_empty())
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names.into_iter().map(TypeKey::of).collect()
    }

    fn insert(&mut self, declaration: TypeDeclaration) -> Result<(), CatalogError> {
        let TypeDeclaration {
            name,
            parameters,
            kind,
            managed,
            properties: declared_properties,
        } = declaration;

        match name.parse::<TypeKey>() {
            Ok(key) if !key.is_parameterized() && key.name() == name => {}
            _ => return Err(CatalogError::InvalidTypeName(name)),
        }
        if self.entries.contains_key(&name) {
            return Err(CatalogError::DuplicateType(name));
        }
        if kind == SchemaKind::Value && !declared_properties.is_empty() {
            return Err(CatalogError::ValueWithProperties(name));
        }

        let mut properties = Vec::with_capacity(declared_properties.len());
        for property in declared_properties {
            let declared_type = match property.type_expr.parse::<TypeKey>() {
                Ok(key) => key,
                Err(source) => {
                    return Err(CatalogError::InvalidPropertyType {
                        owner: name,
                        property: property.name,
                        source,
                    });
                }
            };
            let accessor = accessor_for(&property.name, &declared_type, property.writable);
            properties.push(CatalogProperty {
                name: property.name,
                declared_type,
                accessor,
            });
        }

        let entry = CatalogEntry {
            parameters,
            kind,
            managed: kind == SchemaKind::Struct && managed.unwrap_or(true),
            properties,
        };
        self.entries.insert(name, entry);
        Ok(())
    }

    fn check_parameters(&self, name: &str) -> Result<(), CatalogError> {
        let Some(entry) = self.entries.get(name) else {
            return Ok(());
        };
        match entry
            .parameters
            .iter()
            .find(|p| p.as_str() == name || self.entries.contains_key(p.as_str()))
        {
            Some(parameter) => Err(CatalogError::ParameterShadowsType {
                owner: name.to_string(),
                parameter: parameter.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn accessor_for(name: &str, declared_type: &TypeKey, writable: bool) -> PropertyAccessor {
    let suffix = capitalize(name);
    let getter = if declared_type.name() == "Boolean" && !declared_type.is_parameterized() {
        format!("is{suffix}")
    } else {
        format!("get{suffix}")
    };
    if writable {
        PropertyAccessor::read_write(getter, format!("set{suffix}"))
    } else {
        PropertyAccessor::read_only(getter)
    }
}

impl Extractor for TypeCatalog {
    fn extract(&self, key: &TypeKey) -> Result<ExtractedSchema, ExtractionError> {
        let entry = self
            .entries
            .get(key.name())
            .ok_or_else(|| ExtractionError::new(key.clone(), "unknown type"))?;

        if key.arity() != entry.parameters.len() {
            return Err(ExtractionError::new(
                key.clone(),
                format!(
                    "expected {} type argument(s), found {}",
                    entry.parameters.len(),
                    key.arity()
                ),
            ));
        }

        match entry.kind {
            SchemaKind::Value => Ok(ExtractedSchema::new(
                ModelSchema::new(key.clone(), SchemaKind::Value),
                Vec::new(),
            )),
            SchemaKind::Struct => {
                if !entry.managed {
                    return Err(ExtractionError::new(key.clone(), "type is not managed"));
                }
                let bindings: HashMap<&str, TypeKey> = entry
                    .parameters
                    .iter()
                    .map(String::as_str)
                    .zip(key.arguments().iter().cloned())
                    .collect();
                let factories = entry
                    .properties
                    .iter()
                    .map(|property| {
                        PropertyFactory::new(
                            property.name.clone(),
                            property.declared_type.substitute(&bindings),
                            property.accessor.clone(),
                        )
                    })
                    .collect();
                Ok(ExtractedSchema::new(
                    ModelSchema::new(key.clone(), SchemaKind::Struct),
                    factories,
                ))
            }
        }
    }

    fn is_managed(&self, key: &TypeKey) -> bool {
        self.entries
            .get(key.name())
            .is_some_and(|entry| entry.managed)
    }
}
