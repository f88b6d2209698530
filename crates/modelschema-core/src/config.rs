use serde::{Deserialize, Serialize};

/// What to do when two factories of one type produce the same property name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePropertyPolicy {
    /// Fail the extraction with `SchemaError::PropertyConflict`.
    #[default]
    Reject,
    /// Keep the property produced by the later factory.
    LastWins,
}

/// Behaviour switches for a [`SchemaStore`](crate::SchemaStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub duplicate_properties: DuplicatePropertyPolicy,
    /// Reject keys whose generic arity disagrees with a cached key of the
    /// same raw name, and extractor stubs whose key differs from the request.
    #[serde(default = "default_verify_key_consistency")]
    pub verify_key_consistency: bool,
    /// Deepest chain of nested extractions one request may start. Generic
    /// types whose properties keep growing their own arguments
    /// (`Nest<T>` holding a `Nest<Nest<T>>`) never reach a cached key and
    /// fail here instead of recursing without end. Must be at least 1.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_verify_key_consistency() -> bool {
    true
}

fn default_max_depth() -> usize {
    64
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            duplicate_properties: DuplicatePropertyPolicy::default(),
            verify_key_consistency: default_verify_key_consistency(),
            max_depth: default_max_depth(),
        }
    }
}

impl StoreConfig {
    pub fn with_duplicate_properties(mut self, policy: DuplicatePropertyPolicy) -> Self {
        self.duplicate_properties = policy;
        self
    }

    pub fn with_key_consistency(mut self, verify: bool) -> Self {
        self.verify_key_consistency = verify;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
