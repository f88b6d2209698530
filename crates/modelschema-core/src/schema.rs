//! Schema of a single managed model type.
//!
//! A [`ModelSchema`] is created as a stub in the [`SchemaState::Extracting`]
//! state and published into the store before its properties are resolved.
//! Completion swaps in the property map exactly once; after that the schema
//! is immutable.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::property::ModelProperty;
use crate::type_key::TypeKey;

/// Properties of a complete schema, keyed and ordered by property name.
pub type PropertyMap = BTreeMap<String, ModelProperty>;

/// Construction state of a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaState {
    /// Published as a stub; properties are still being resolved.
    Extracting,
    /// Properties assigned; the schema will not change again.
    Complete,
}

/// Structural kind of a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    /// Leaf type without properties (strings, numbers, ...).
    Value,
    /// Managed type exposing named properties.
    Struct,
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => write!(f, "value"),
            Self::Struct => write!(f, "struct"),
        }
    }
}

enum Phase {
    Extracting,
    Complete(Arc<PropertyMap>),
}

/// Cached structural description of one type.
///
/// Schemas are shared as `Arc<ModelSchema>`; the store guarantees a single
/// instance per [`TypeKey`], so `Arc::ptr_eq` is a valid identity check.
pub struct ModelSchema {
    key: TypeKey,
    kind: SchemaKind,
    phase: ArcSwap<Phase>,
}

impl ModelSchema {
    /// Creates a bare schema in the `Extracting` state.
    ///
    /// Only the store can complete a schema.
    pub fn new(key: TypeKey, kind: SchemaKind) -> Self {
        Self {
            key,
            kind,
            phase: ArcSwap::from_pointee(Phase::Extracting),
        }
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn kind(&self) -> SchemaKind {
        self.kind
    }

    pub fn state(&self) -> SchemaState {
        match **self.phase.load() {
            Phase::Extracting => SchemaState::Extracting,
            Phase::Complete(_) => SchemaState::Complete,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state() == SchemaState::Complete
    }

    /// The property map, or `None` while the schema is still extracting.
    pub fn properties(&self) -> Option<Arc<PropertyMap>> {
        match &**self.phase.load() {
            Phase::Extracting => None,
            Phase::Complete(properties) => Some(Arc::clone(properties)),
        }
    }

    /// A single property by name. `None` if absent or still extracting.
    pub fn property(&self, name: &str) -> Option<ModelProperty> {
        self.properties()
            .and_then(|properties| properties.get(name).cloned())
    }

    /// Property names in iteration order. Empty while extracting.
    pub fn property_names(&self) -> Vec<String> {
        self.properties()
            .map(|properties| properties.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Assigns the properties and moves the schema to `Complete`.
    ///
    /// Fails if the schema was already completed.
    pub(crate) fn complete(&self, properties: PropertyMap) -> Result<()> {
        let current = self.phase.load_full();
        if matches!(*current, Phase::Complete(_)) {
            return Err(SchemaError::AlreadyComplete {
                key: self.key.clone(),
            });
        }
        let previous = self
            .phase
            .compare_and_swap(&current, Arc::new(Phase::Complete(Arc::new(properties))));
        if !Arc::ptr_eq(&*previous, &current) {
            return Err(SchemaError::AlreadyComplete {
                key: self.key.clone(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for ModelSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Properties are listed by name only: printing nested types in full
        // would recurse through cyclic graphs.
        f.debug_struct("ModelSchema")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("state", &self.state())
            .field("properties", &self.property_names())
            .finish()
    }
}
