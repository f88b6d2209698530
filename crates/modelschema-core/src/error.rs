//! Error types for schema extraction and caching.

use thiserror::Error;

use crate::type_key::TypeKey;

/// Failure to parse the textual form of a [`TypeKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeKeyParseError {
    #[error("expected a type name at position {position} in '{input}'")]
    ExpectedName { input: String, position: usize },

    #[error("unexpected character '{found}' at position {position} in '{input}'")]
    UnexpectedChar {
        input: String,
        position: usize,
        found: char,
    },

    #[error("unterminated type argument list in '{input}'")]
    Unterminated { input: String },

    #[error("type arguments nested deeper than {limit} levels at position {position}")]
    TooDeep { position: usize, limit: usize },
}

impl TypeKeyParseError {
    pub fn expected_name(input: impl Into<String>, position: usize) -> Self {
        Self::ExpectedName {
            input: input.into(),
            position,
        }
    }

    pub fn unexpected(input: impl Into<String>, position: usize, found: char) -> Self {
        Self::UnexpectedChar {
            input: input.into(),
            position,
            found,
        }
    }

    pub fn unterminated(input: impl Into<String>) -> Self {
        Self::Unterminated {
            input: input.into(),
        }
    }

    pub fn too_deep(position: usize) -> Self {
        Self::TooDeep {
            position,
            limit: crate::type_key::MAX_KEY_DEPTH,
        }
    }
}

/// The extractor could not interpret a type as a schema.
///
/// Returned by [`Extractor::extract`](crate::Extractor::extract) and surfaced
/// unchanged to the caller of [`SchemaStore::get_schema`](crate::SchemaStore::get_schema).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot extract schema for {key}: {reason}")]
pub struct ExtractionError {
    /// The type that failed to extract.
    pub key: TypeKey,
    /// Why the type shape is unsupported.
    pub reason: String,
}

impl ExtractionError {
    pub fn new(key: TypeKey, reason: impl Into<String>) -> Self {
        Self {
            key,
            reason: reason.into(),
        }
    }
}

/// Errors returned by the schema store.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Property '{property}' of {owner} is declared more than once")]
    PropertyConflict { owner: TypeKey, property: String },

    #[error("Inconsistent cache key {key}: {reason}")]
    CacheConsistency { key: TypeKey, reason: String },

    #[error("Schema for {key} is already complete")]
    AlreadyComplete { key: TypeKey },

    #[error("Invalid type key: {0}")]
    InvalidTypeKey(#[from] TypeKeyParseError),
}

impl SchemaError {
    /// Create a new PropertyConflict error
    pub fn property_conflict(owner: TypeKey, property: impl Into<String>) -> Self {
        Self::PropertyConflict {
            owner,
            property: property.into(),
        }
    }

    /// Create a new CacheConsistency error
    pub fn cache_consistency(key: TypeKey, reason: impl Into<String>) -> Self {
        Self::CacheConsistency {
            key,
            reason: reason.into(),
        }
    }

    /// The type key the error is about, when there is one.
    pub fn key(&self) -> Option<&TypeKey> {
        match self {
            Self::Extraction(e) => Some(&e.key),
            Self::PropertyConflict { owner, .. } => Some(owner),
            Self::CacheConsistency { key, .. } | Self::AlreadyComplete { key } => Some(key),
            Self::InvalidTypeKey(_) => None,
        }
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Extraction(_) => ErrorCategory::Extraction,
            Self::PropertyConflict { .. } => ErrorCategory::Conflict,
            Self::CacheConsistency { .. } | Self::AlreadyComplete { .. } => {
                ErrorCategory::Consistency
            }
            Self::InvalidTypeKey(_) => ErrorCategory::Validation,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Extraction,
    Conflict,
    Consistency,
    Validation,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extraction => write!(f, "extraction"),
            Self::Conflict => write!(f, "conflict"),
            Self::Consistency => write!(f, "consistency"),
            Self::Validation => write!(f, "validation"),
        }
    }
}

/// Convenience result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_error_is_transparent() {
        let err: SchemaError = ExtractionError::new(TypeKey::of("Broken"), "no getters").into();
        assert_eq!(
            err.to_string(),
            "Cannot extract schema for Broken: no getters"
        );
        assert_eq!(err.category(), ErrorCategory::Extraction);
        assert_eq!(err.key(), Some(&TypeKey::of("Broken")));
    }

    #[test]
    fn test_property_conflict_error() {
        let err = SchemaError::property_conflict(TypeKey::of("Person"), "name");
        assert_eq!(
            err.to_string(),
            "Property 'name' of Person is declared more than once"
        );
        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert_eq!(err.category().to_string(), "conflict");
    }

    #[test]
    fn test_invalid_type_key_has_no_key() {
        let err: SchemaError = TypeKeyParseError::unterminated("List<").into();
        assert!(err.key().is_none());
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(
            err.to_string(),
            "Invalid type key: unterminated type argument list in 'List<'"
        );
    }
}
