//! Properties of a schema and the deferred descriptors that produce them.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;
use crate::schema::ModelSchema;
use crate::store::SchemaResolver;
use crate::type_key::TypeKey;

/// How a property is read and written on the model object.
///
/// The store never interprets accessor metadata; it is carried through for
/// the code that binds schemas to model instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyAccessor {
    pub getter: String,
    pub setter: Option<String>,
}

impl PropertyAccessor {
    /// Accessor with a getter only.
    pub fn read_only(getter: impl Into<String>) -> Self {
        Self {
            getter: getter.into(),
            setter: None,
        }
    }

    /// Accessor with both a getter and a setter.
    pub fn read_write(getter: impl Into<String>, setter: impl Into<String>) -> Self {
        Self {
            getter: getter.into(),
            setter: Some(setter.into()),
        }
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }
}

/// A named, typed property of a model schema.
///
/// The property type is stored as a [`TypeKey`], not as a schema. Navigate to
/// the nested schema with [`ModelProperty::resolve`], which goes through the
/// store and therefore sees the same instance every other caller sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelProperty {
    name: String,
    #[serde(rename = "type")]
    type_key: TypeKey,
    declared_by: TypeKey,
    accessor: PropertyAccessor,
}

impl ModelProperty {
    pub fn new(
        name: impl Into<String>,
        type_key: TypeKey,
        declared_by: TypeKey,
        accessor: PropertyAccessor,
    ) -> Self {
        Self {
            name: name.into(),
            type_key,
            declared_by,
            accessor,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key of the property's declared type.
    pub fn type_key(&self) -> &TypeKey {
        &self.type_key
    }

    /// Key of the schema that owns this property.
    pub fn declared_by(&self) -> &TypeKey {
        &self.declared_by
    }

    pub fn accessor(&self) -> &PropertyAccessor {
        &self.accessor
    }

    pub fn is_writable(&self) -> bool {
        self.accessor.is_writable()
    }

    /// Looks up the schema of this property's type through `resolver`.
    pub fn resolve(&self, resolver: &dyn SchemaResolver) -> Result<Arc<ModelSchema>> {
        resolver.get_schema(&self.type_key)
    }
}

type BuildFn = dyn Fn(&dyn SchemaResolver, &TypeKey) -> Result<ModelProperty> + Send + Sync;

/// Deferred property descriptor emitted by an [`Extractor`](crate::Extractor).
///
/// The store turns factories into properties once the owning stub is
/// published, by calling [`PropertyFactory::create`] with itself as the
/// resolver. Plain factories build the property from their name, declared
/// type and accessor; [`PropertyFactory::custom`] lets an extractor take over
/// construction. Either way the store resolves the resulting property type
/// afterwards, so nested types are extracted before the owner completes.
/// Extractors hand factories over in declaration order.
#[derive(Clone)]
pub struct PropertyFactory {
    name: String,
    declared_type: TypeKey,
    accessor: PropertyAccessor,
    build: Option<Arc<BuildFn>>,
}

impl PropertyFactory {
    pub fn new(name: impl Into<String>, declared_type: TypeKey, accessor: PropertyAccessor) -> Self {
        Self {
            name: name.into(),
            declared_type,
            accessor,
            build: None,
        }
    }

    /// Factory for a read-write property using bean-style accessor names.
    pub fn bean(name: impl Into<String>, declared_type: TypeKey) -> Self {
        let name = name.into();
        let suffix = capitalize(&name);
        let accessor =
            PropertyAccessor::read_write(format!("get{suffix}"), format!("set{suffix}"));
        Self::new(name, declared_type, accessor)
    }

    /// Factory whose property is produced by `build`, given the resolver and
    /// the owning type. The owner is published as an `Extracting` stub while
    /// `build` runs.
    pub fn custom<F>(name: impl Into<String>, declared_type: TypeKey, build: F) -> Self
    where
        F: Fn(&dyn SchemaResolver, &TypeKey) -> Result<ModelProperty> + Send + Sync + 'static,
    {
        let name = name.into();
        let accessor = PropertyAccessor::read_only(format!("get{}", capitalize(&name)));
        Self {
            build: Some(Arc::new(build)),
            ..Self::new(name, declared_type, accessor)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_type(&self) -> &TypeKey {
        &self.declared_type
    }

    pub fn accessor(&self) -> &PropertyAccessor {
        &self.accessor
    }

    pub fn is_custom(&self) -> bool {
        self.build.is_some()
    }

    /// Produces the property owned by `owner`.
    pub fn create(&self, resolver: &dyn SchemaResolver, owner: &TypeKey) -> Result<ModelProperty> {
        match &self.build {
            Some(build) => build(resolver, owner),
            None => Ok(ModelProperty::new(
                self.name.clone(),
                self.declared_type.clone(),
                owner.clone(),
                self.accessor.clone(),
            )),
        }
    }
}

impl fmt::Debug for PropertyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyFactory")
            .field("name", &self.name)
            .field("declared_type", &self.declared_type)
            .field("accessor", &self.accessor)
            .field("custom", &self.is_custom())
            .finish()
    }
}

/// Upper-cases the first character of a property name.
pub(crate) fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bean_factory_accessors() {
        let factory = PropertyFactory::bean("firstName", TypeKey::of("String"));
        assert_eq!(factory.accessor().getter, "getFirstName");
        assert_eq!(factory.accessor().setter.as_deref(), Some("setFirstName"));
        assert!(factory.accessor().is_writable());
    }

    #[test]
    fn test_plain_factory_creates_property_for_owner() {
        struct NoResolver;
        impl SchemaResolver for NoResolver {
            fn get_schema(&self, key: &TypeKey) -> Result<Arc<ModelSchema>> {
                Err(crate::ExtractionError::new(key.clone(), "unknown type").into())
            }
            fn is_managed(&self, _key: &TypeKey) -> bool {
                false
            }
            fn lookup(&self, _key: &TypeKey) -> Option<Arc<ModelSchema>> {
                None
            }
        }

        let owner = TypeKey::of("Person");
        let factory = PropertyFactory::bean("name", TypeKey::of("String"));
        assert!(!factory.is_custom());

        let property = factory.create(&NoResolver, &owner).unwrap();
        assert_eq!(property.name(), "name");
        assert_eq!(property.type_key(), &TypeKey::of("String"));
        assert_eq!(property.declared_by(), &owner);
        assert!(property.is_writable());

        let custom = PropertyFactory::custom("id", TypeKey::of("Long"), |_, owner| {
            Ok(ModelProperty::new(
                "id",
                TypeKey::of("Long"),
                owner.clone(),
                PropertyAccessor::read_only("id"),
            ))
        });
        assert!(custom.is_custom());
        assert!(format!("{custom:?}").contains("custom: true"));
        assert_eq!(custom.create(&NoResolver, &owner).unwrap().accessor().getter, "id");
    }

    #[test]
    fn test_read_only_accessor() {
        let accessor = PropertyAccessor::read_only("getId");
        assert!(!accessor.is_writable());
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("name"), "Name");
        assert_eq!(capitalize("éclair"), "Éclair");
        assert_eq!(capitalize(""), "");
    }
}
