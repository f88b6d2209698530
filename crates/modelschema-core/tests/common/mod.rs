//! Shared fixtures for store integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use modelschema_core::{
    ExtractedSchema, ExtractionError, Extractor, ModelSchema, PropertyFactory, SchemaKind,
    TypeKey,
};

pub fn key(text: &str) -> TypeKey {
    text.parse().expect("valid type key")
}

type Hook = Box<dyn FnOnce() + Send>;

/// Extractor driven by a fixed script, recording every call.
#[derive(Default)]
pub struct ScriptedExtractor {
    types: HashMap<TypeKey, (SchemaKind, Vec<PropertyFactory>)>,
    failures: Mutex<HashMap<TypeKey, usize>>,
    panics: Mutex<HashMap<TypeKey, usize>>,
    renamed: HashMap<TypeKey, TypeKey>,
    delay: Option<Duration>,
    hooks: Mutex<HashMap<TypeKey, Hook>>,
    calls: Mutex<HashMap<TypeKey, usize>>,
}

impl ScriptedExtractor {
    pub fn new() -> Self {
        Self::default().with_value("String")
    }

    /// Declares a managed struct with `(property, type)` pairs in emission order.
    pub fn with_type(mut self, name: &str, properties: &[(&str, &str)]) -> Self {
        let factories = properties
            .iter()
            .map(|(property, ty)| PropertyFactory::bean(*property, key(ty)))
            .collect();
        self.types.insert(key(name), (SchemaKind::Struct, factories));
        self
    }

    /// Declares a managed struct emitting the given factories.
    pub fn with_factories(mut self, name: &str, factories: Vec<PropertyFactory>) -> Self {
        self.types.insert(key(name), (SchemaKind::Struct, factories));
        self
    }

    pub fn with_value(mut self, name: &str) -> Self {
        self.types.insert(key(name), (SchemaKind::Value, Vec::new()));
        self
    }

    /// The next `times` extractions of `name` fail.
    pub fn failing(self, name: &str, times: usize) -> Self {
        self.failures.lock().unwrap().insert(key(name), times);
        self
    }

    /// The next `times` extractions of `name` panic.
    pub fn panicking(self, name: &str, times: usize) -> Self {
        self.panics.lock().unwrap().insert(key(name), times);
        self
    }

    /// Extracting `requested` yields a stub keyed `actual`.
    pub fn returning_key(mut self, requested: &str, actual: &str) -> Self {
        self.renamed.insert(key(requested), key(actual));
        self
    }

    /// Every extraction sleeps for `delay` first.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Runs `hook` inside the next extraction of `name`, before its result
    /// is decided.
    pub fn on_extract(self, name: &str, hook: impl FnOnce() + Send + 'static) -> Self {
        self.hooks.lock().unwrap().insert(key(name), Box::new(hook));
        self
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&key(name))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    fn take(counter: &Mutex<HashMap<TypeKey, usize>>, key: &TypeKey) -> bool {
        let mut counter = counter.lock().unwrap();
        match counter.get_mut(key) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

impl Extractor for ScriptedExtractor {
    fn extract(&self, key: &TypeKey) -> Result<ExtractedSchema, ExtractionError> {
        *self.calls.lock().unwrap().entry(key.clone()).or_default() += 1;
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        let hook = self.hooks.lock().unwrap().remove(key);
        if let Some(hook) = hook {
            hook();
        }
        if Self::take(&self.panics, key) {
            panic!("scripted panic extracting {key}");
        }
        if Self::take(&self.failures, key) {
            return Err(ExtractionError::new(key.clone(), "scripted failure"));
        }

        let (kind, factories) = self
            .types
            .get(key)
            .ok_or_else(|| ExtractionError::new(key.clone(), "unknown type"))?;
        let stub_key = self.renamed.get(key).cloned().unwrap_or_else(|| key.clone());
        Ok(ExtractedSchema::new(
            ModelSchema::new(stub_key, *kind),
            factories.clone(),
        ))
    }

    fn is_managed(&self, key: &TypeKey) -> bool {
        matches!(self.types.get(key), Some((SchemaKind::Struct, _)))
    }
}
