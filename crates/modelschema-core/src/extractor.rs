//! Contract between the store and whatever discovers a type's structure.

use std::sync::Arc;

use crate::error::ExtractionError;
use crate::property::PropertyFactory;
use crate::schema::ModelSchema;
use crate::type_key::TypeKey;

/// A bare schema stub plus the factories for its properties.
#[derive(Debug)]
pub struct ExtractedSchema {
    /// Bare schema, still in the `Extracting` state.
    pub schema: ModelSchema,
    /// Property descriptors in the order the extractor discovered them.
    pub factories: Vec<PropertyFactory>,
}

impl ExtractedSchema {
    pub fn new(schema: ModelSchema, factories: Vec<PropertyFactory>) -> Self {
        Self { schema, factories }
    }
}

/// Discovers the structure of model types.
///
/// Implementations decide which types are manageable and which properties
/// they declare. The store calls [`extract`](Extractor::extract) at most once
/// per successfully cached key; it must be a pure function of the type.
pub trait Extractor: Send + Sync {
    /// Builds a bare schema and its property factories for `key`.
    ///
    /// # Errors
    ///
    /// Returns an [`ExtractionError`] when the type cannot be interpreted as
    /// a schema (unknown type, unsupported shape, wrong parameterization).
    fn extract(&self, key: &TypeKey) -> Result<ExtractedSchema, ExtractionError>;

    /// Whether `key` is a managed type. Must not have side effects.
    fn is_managed(&self, key: &TypeKey) -> bool;
}

impl<E: Extractor + ?Sized> Extractor for Arc<E> {
    fn extract(&self, key: &TypeKey) -> Result<ExtractedSchema, ExtractionError> {
        (**self).extract(key)
    }

    fn is_managed(&self, key: &TypeKey) -> bool {
        (**self).is_managed(key)
    }
}

impl<E: Extractor + ?Sized> Extractor for Box<E> {
    fn extract(&self, key: &TypeKey) -> Result<ExtractedSchema, ExtractionError> {
        (**self).extract(key)
    }

    fn is_managed(&self, key: &TypeKey) -> bool {
        (**self).is_managed(key)
    }
}
