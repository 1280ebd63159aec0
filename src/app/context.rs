//! Shared state handed to controllers.
//!
//! Both maps are shared handles: controllers and request handlers keep a clone
//! and observe later writes.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{Map, Value};
use thiserror::Error;

/// Keys reserved for controller wiring.
pub const BLACKLISTED_KEYS: [&str; 2] = ["ctx", "prefix"];

/// Mutable bag of values shared across the server's lifetime.
#[derive(Debug, Clone, Default)]
pub struct SharedContext {
    values: Arc<RwLock<HashMap<String, Value>>>,
}

impl SharedContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context pre-filled from a JSON object (`controller_context`).
    pub fn seeded(seed: &Map<String, Value>) -> Self {
        let values = seed.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        Self {
            values: Arc::new(RwLock::new(values)),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value);
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Why an injection was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InjectError {
    #[error("key \"{0}\" is reserved for controller wiring")]
    Blacklisted(String),

    #[error("need to specify a value for injected key \"{0}\"")]
    MissingValue(String),

    #[error("cannot inject once the application has started")]
    AlreadyStarted,
}

/// Named dependencies visible to controllers. Read-only from the outside.
#[derive(Debug, Clone, Default)]
pub struct Injected {
    values: Arc<RwLock<HashMap<String, Value>>>,
}

impl Injected {
    pub fn get(&self, key: &str) -> Option<Value> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Validate every entry, then apply all of them.
    pub(crate) fn insert_all(&self, entries: Vec<(String, Value)>) -> Result<(), InjectError> {
        for (key, value) in &entries {
            check_entry(key, value)?;
        }
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.extend(entries);
        Ok(())
    }
}

fn check_entry(key: &str, value: &Value) -> Result<(), InjectError> {
    if BLACKLISTED_KEYS.contains(&key) {
        return Err(InjectError::Blacklisted(key.to_string()));
    }
    if value.is_null() {
        return Err(InjectError::MissingValue(key.to_string()));
    }
    Ok(())
}
