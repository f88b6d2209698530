//! The schema cache.
//!
//! [`SchemaStore`] hands out exactly one [`ModelSchema`] per [`TypeKey`].
//! On a miss it asks the [`Extractor`] for a bare stub, publishes the stub,
//! and only then materializes the stub's properties. Property types are
//! resolved through the store again, so a type that refers to itself (or to
//! a type that refers back to it) receives the stub that is still being
//! built instead of starting a second extraction.
//!
//! # Threads
//!
//! Only one thread extracts at a time. The thread that starts an extraction
//! owns the *extraction gate* until its outermost extraction returns; its
//! reentrant calls see in-progress stubs. Everything published while the gate
//! is held stays provisional until the outermost extraction commits, because
//! a later failure evicts it again. Other threads wait for the gate before
//! reading a provisional schema; schemas committed by earlier extractions are
//! returned without waiting. An extractor must therefore not hand work that
//! calls back into the store to another thread and wait for it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};

use indexmap::IndexMap;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};

use crate::config::StoreConfig;
use crate::error::{ExtractionError, Result, SchemaError};
use crate::extractor::{ExtractedSchema, Extractor};
use crate::materializer::PropertyMaterializer;
use crate::schema::ModelSchema;
use crate::type_key::TypeKey;

/// Read access to schemas, as seen by property materialization.
///
/// Implemented by [`SchemaStore`]; materializers and properties only depend
/// on this trait so they can be driven by any resolver.
pub trait SchemaResolver {
    /// Returns the schema for `key`, extracting it on first request.
    fn get_schema(&self, key: &TypeKey) -> Result<Arc<ModelSchema>>;

    /// Whether `key` is a managed type. Never touches the cache.
    fn is_managed(&self, key: &TypeKey) -> bool;

    /// Returns an already cached schema without extracting.
    fn lookup(&self, key: &TypeKey) -> Option<Arc<ModelSchema>>;
}

/// Counters describing store activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Schemas currently cached, in any state.
    pub cached: usize,
    /// Calls made to `Extractor::extract`.
    pub extractions: u64,
    /// Extractions that failed and were evicted.
    pub failures: u64,
    /// Requests answered from the cache.
    pub hits: u64,
}

/// Cache contents, guarded by the store mutex.
#[derive(Default)]
struct SchemaCache {
    /// Schemas in publication order. Order matters: a failed extraction
    /// evicts its own stub and everything published after it.
    schemas: IndexMap<TypeKey, Arc<ModelSchema>>,
    /// Raw name -> (arity, number of cached keys with that name).
    arities: HashMap<Box<str>, (usize, usize)>,
    /// Thread currently holding the extraction gate.
    gate_owner: Option<ThreadId>,
    /// Index of the first schema published under the current gate owner.
    gate_mark: usize,
    /// Extraction frames open on the gate-owning thread.
    depth: usize,
}

impl SchemaCache {
    /// Whether the schema at `index` survives any failure still pending.
    fn is_committed(&self, index: usize) -> bool {
        self.gate_owner.is_none() || index < self.gate_mark
    }

    fn check_arity(&self, key: &TypeKey) -> Result<()> {
        match self.arities.get(key.name()) {
            Some(&(arity, _)) if arity != key.arity() => Err(SchemaError::cache_consistency(
                key.clone(),
                format!(
                    "'{}' is cached with {arity} type argument(s) but was requested with {}",
                    key.name(),
                    key.arity()
                ),
            )),
            _ => Ok(()),
        }
    }

    fn publish(&mut self, key: TypeKey, schema: Arc<ModelSchema>) {
        self.arities
            .entry(key.name().into())
            .or_insert((key.arity(), 0))
            .1 += 1;
        self.schemas.insert(key, schema);
    }

    /// Removes every schema published at or after `mark`.
    fn evict_from(&mut self, mark: usize) -> usize {
        if mark >= self.schemas.len() {
            return 0;
        }
        let mut evicted = 0;
        for (key, _) in self.schemas.drain(mark..) {
            evicted += 1;
            let unused = match self.arities.get_mut(key.name()) {
                Some(entry) => {
                    entry.1 -= 1;
                    entry.1 == 0
                }
                None => false,
            };
            if unused {
                self.arities.remove(key.name());
            }
        }
        evicted
    }
}

/// Caching schema store with a constructed, session-scoped lifetime.
///
/// # Example
///
/// ```ignore
/// let store = SchemaStore::new(TypeCatalog::from_toml(catalog_toml)?);
///
/// let node = store.get_schema(&"Node".parse()?)?;
/// let children = node.property("children").unwrap();
///
/// // Navigation goes through the store, so cycles resolve to the same instance.
/// let nested = children.resolve(&store)?;
/// ```
pub struct SchemaStore<E> {
    extractor: E,
    config: StoreConfig,
    cache: Mutex<SchemaCache>,
    gate_released: Condvar,
    extractions: AtomicU64,
    failures: AtomicU64,
    hits: AtomicU64,
}

impl<E: Extractor> SchemaStore<E> {
    /// Creates an empty store with the default configuration.
    pub fn new(extractor: E) -> Self {
        Self::with_config(extractor, StoreConfig::default())
    }

    /// Creates an empty store with the given configuration.
    pub fn with_config(extractor: E, config: StoreConfig) -> Self {
        Self {
            extractor,
            config,
            cache: Mutex::new(SchemaCache::default()),
            gate_released: Condvar::new(),
            extractions: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Returns the schema for `key`, extracting it on first request.
    ///
    /// Repeated calls return the same `Arc`. A call made while `key` is being
    /// extracted further up the same call stack returns the in-progress stub.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::Extraction`] if `key` or any type reachable through
    ///   its properties cannot be extracted, or if nested extractions exceed
    ///   [`StoreConfig::max_depth`].
    /// - [`SchemaError::PropertyConflict`] for repeated property names under
    ///   the `Reject` policy.
    /// - [`SchemaError::CacheConsistency`] when the key disagrees with the
    ///   cached parameterization of the same raw type.
    ///
    /// On error nothing published by the failed extraction stays cached; the
    /// next request extracts again.
    pub fn get_schema(&self, key: &TypeKey) -> Result<Arc<ModelSchema>> {
        let current = thread::current().id();
        let mut cache = self.cache.lock();
        loop {
            let owns_gate = cache.gate_owner == Some(current);
            let visible = match cache.schemas.get_full(key) {
                Some((index, _, schema)) if owns_gate || cache.is_committed(index) => {
                    Some(Arc::clone(schema))
                }
                Some(_) => None,
                None if owns_gate || cache.gate_owner.is_none() => break,
                None => None,
            };
            if let Some(schema) = visible {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(type_key = %key, state = ?schema.state(), "Schema cache hit");
                return Ok(schema);
            }
            // Provisional or missing while another thread extracts; the owner
            // commits or evicts before releasing the gate.
            self.gate_released.wait(&mut cache);
        }

        if self.config.verify_key_consistency {
            cache.check_arity(key)?;
        }
        if cache.depth >= self.config.max_depth {
            return Err(ExtractionError::new(
                key.clone(),
                format!(
                    "nested extraction exceeds the maximum depth of {}",
                    self.config.max_depth
                ),
            )
            .into());
        }

        let mark = cache.schemas.len();
        let outermost = cache.gate_owner.is_none();
        if outermost {
            cache.gate_owner = Some(current);
            cache.gate_mark = mark;
        }
        cache.depth += 1;
        let frame = ExtractionFrame {
            store: self,
            key,
            mark,
            outermost,
            committed: false,
        };
        drop(cache);

        let schema = self.extract(key)?;
        frame.commit();
        Ok(schema)
    }

    /// Whether `key` is a managed type, as decided by the extractor.
    pub fn is_managed(&self, key: &TypeKey) -> bool {
        self.extractor.is_managed(key)
    }

    /// Returns a cached schema in any state without extracting.
    pub fn lookup(&self, key: &TypeKey) -> Option<Arc<ModelSchema>> {
        self.cache.lock().schemas.get(key).cloned()
    }

    /// Number of cached schemas.
    pub fn len(&self) -> usize {
        self.cache.lock().schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cached keys in publication order.
    pub fn cached_keys(&self) -> Vec<TypeKey> {
        self.cache.lock().schemas.keys().cloned().collect()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            cached: self.len(),
            extractions: self.extractions.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
        }
    }

    /// Runs the two-phase protocol for one key. The caller holds the gate.
    fn extract(&self, key: &TypeKey) -> Result<Arc<ModelSchema>> {
        debug!(type_key = %key, "Extracting model schema");
        self.extractions.fetch_add(1, Ordering::Relaxed);

        let ExtractedSchema { schema, factories } = self.extractor.extract(key)?;
        if self.config.verify_key_consistency && schema.key() != key {
            return Err(SchemaError::cache_consistency(
                key.clone(),
                format!("extractor returned a schema for {}", schema.key()),
            ));
        }

        // Publish the stub first: materializing properties may request this
        // very key again.
        let schema = Arc::new(schema);
        self.cache.lock().publish(key.clone(), Arc::clone(&schema));

        let properties = PropertyMaterializer::new(self, key, self.config.duplicate_properties)
            .materialize_all(&factories)?;
        let count = properties.len();
        schema.complete(properties)?;

        debug!(type_key = %key, properties = count, "Model schema complete");
        Ok(schema)
    }
}

impl<E: Extractor> SchemaResolver for SchemaStore<E> {
    fn get_schema(&self, key: &TypeKey) -> Result<Arc<ModelSchema>> {
        SchemaStore::get_schema(self, key)
    }

    fn is_managed(&self, key: &TypeKey) -> bool {
        SchemaStore::is_managed(self, key)
    }

    fn lookup(&self, key: &TypeKey) -> Option<Arc<ModelSchema>> {
        SchemaStore::lookup(self, key)
    }
}

impl<E> fmt::Debug for SchemaStore<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.cache.lock();
        f.debug_struct("SchemaStore")
            .field("config", &self.config)
            .field("cached", &cache.schemas.len())
            .field("gate_owner", &cache.gate_owner)
            .finish()
    }
}

/// Bookkeeping for one extraction on the gate-owning thread.
///
/// Dropping an uncommitted frame (error return or panic) evicts everything
/// published since the frame started. The outermost frame releases the gate.
struct ExtractionFrame<'a, E> {
    store: &'a SchemaStore<E>,
    key: &'a TypeKey,
    mark: usize,
    outermost: bool,
    committed: bool,
}

impl<E> ExtractionFrame<'_, E> {
    fn commit(mut self) {
        self.committed = true;
    }
}

impl<E> Drop for ExtractionFrame<'_, E> {
    fn drop(&mut self) {
        let mut cache = self.store.cache.lock();
        cache.depth -= 1;
        if !self.committed {
            let evicted = cache.evict_from(self.mark);
            self.store.failures.fetch_add(1, Ordering::Relaxed);
            if self.outermost {
                warn!(type_key = %self.key, evicted, "Schema extraction failed");
            } else {
                debug!(type_key = %self.key, evicted, "Nested schema extraction failed");
            }
        }
        if self.outermost {
            cache.gate_owner = None;
            cache.gate_mark = 0;
            drop(cache);
            self.store.gate_released.notify_all();
        }
    }
}
