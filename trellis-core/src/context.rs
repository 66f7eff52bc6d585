// Application context shared with every constructed service

use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::trace;

/// The single injected dependency: every controller and service
/// constructor receives this context and nothing else.
///
/// It replaces the ambient global application object of classic
/// annotation frameworks with an explicit handle that the compiler
/// threads through and hands, once, to the registry.
pub struct AppContext {
    settings: RwLock<HashMap<String, Value>>,
}

impl AppContext {
    pub fn new() -> Self {
        Self {
            settings: RwLock::new(HashMap::new()),
        }
    }

    /// Store a configuration value under a key.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        trace!(key = %key, "Storing context value");
        self.settings.write().unwrap().insert(key, value);
    }

    /// Fetch a configuration value by key.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.settings.read().unwrap().get(key).cloned()
    }

    pub fn has(&self, key: &str) -> bool {
        self.settings.read().unwrap().contains_key(key)
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}
