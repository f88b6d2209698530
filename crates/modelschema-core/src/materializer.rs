//! Turns property factories into properties.
//!
//! Materializing a property resolves its declared type through the store.
//! That call is where extraction recurses: the nested type may be extracted
//! on the spot, may already be cached, or may be a stub still being built
//! further up the call stack (a cycle).

use std::collections::btree_map::Entry;

use tracing::{debug, trace};

use crate::config::DuplicatePropertyPolicy;
use crate::error::{Result, SchemaError};
use crate::property::{ModelProperty, PropertyFactory};
use crate::schema::PropertyMap;
use crate::store::SchemaResolver;
use crate::type_key::TypeKey;

/// Materializes the property factories of one owning type.
pub struct PropertyMaterializer<'a> {
    resolver: &'a dyn SchemaResolver,
    owner: &'a TypeKey,
    duplicates: DuplicatePropertyPolicy,
}

impl<'a> PropertyMaterializer<'a> {
    pub fn new(
        resolver: &'a dyn SchemaResolver,
        owner: &'a TypeKey,
        duplicates: DuplicatePropertyPolicy,
    ) -> Self {
        Self {
            resolver,
            owner,
            duplicates,
        }
    }

    /// Asks the factory for its property, then resolves the property type.
    ///
    /// The nested schema may come back still `Extracting` when the property
    /// closes a cycle; the property only keeps its key, so it observes the
    /// completed schema later through the store.
    pub fn materialize(&self, factory: &PropertyFactory) -> Result<ModelProperty> {
        let property = factory.create(self.resolver, self.owner)?;
        let nested = self.resolver.get_schema(property.type_key())?;
        if !nested.is_complete() {
            trace!(
                owner = %self.owner,
                property = property.name(),
                target = %nested.key(),
                "Property refers back to a schema under construction"
            );
        }
        Ok(property)
    }

    /// Materializes every factory, in order, into a name-ordered map.
    ///
    /// # Errors
    ///
    /// Fails on the first factory or nested resolution error, or with
    /// [`SchemaError::PropertyConflict`] when a name repeats under
    /// [`DuplicatePropertyPolicy::Reject`].
    pub fn materialize_all(&self, factories: &[PropertyFactory]) -> Result<PropertyMap> {
        let mut properties = PropertyMap::new();
        for factory in factories {
            // Plain factories name their property up front.
            if self.duplicates == DuplicatePropertyPolicy::Reject
                && !factory.is_custom()
                && properties.contains_key(factory.name())
            {
                return Err(SchemaError::property_conflict(
                    self.owner.clone(),
                    factory.name(),
                ));
            }

            let property = self.materialize(factory)?;
            match properties.entry(property.name().to_string()) {
                Entry::Vacant(slot) => {
                    slot.insert(property);
                }
                Entry::Occupied(slot) if self.duplicates == DuplicatePropertyPolicy::Reject => {
                    return Err(SchemaError::property_conflict(
                        self.owner.clone(),
                        slot.key().as_str(),
                    ));
                }
                Entry::Occupied(mut slot) => {
                    debug!(
                        owner = %self.owner,
                        property = property.name(),
                        "Duplicate property replaced by later declaration"
                    );
                    slot.insert(property);
                }
            }
        }
        Ok(properties)
    }
}
