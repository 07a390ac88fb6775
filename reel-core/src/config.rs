//! # Configuration
//!
//! A minimal string key/value store. Applications set defaults, then
//! layer environment overrides on top:
//!
//! ```rust
//! use reel_core::ReelConfig;
//! let mut config = ReelConfig::new();
//!
//! config.set("http.port", "3030");
//! config.set("upload.max_mb", "200");
//!
//! assert_eq!(config.get("http.port"), Some("3030"));
//! ```
//!
//! ## Environment overrides
//! `load_env` maps prefixed variables onto dotted keys:
//!
//! ```bash
//! export REEL__HTTP__PORT=8080        # http.port
//! export REEL__STORAGE__CHUNK_SIZE=65536  # storage.chunk_size
//! ```

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ReelConfig {
    values: HashMap<String, String>,
}

impl ReelConfig {
    /// Create an empty config store.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Set a key only if nothing has set it yet.
    pub fn set_default<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.entry(key.into()).or_insert_with(|| value.into());
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Apply overrides from the process environment.
    pub fn load_env(&mut self, prefix: &str) {
        self.load_vars(prefix, std::env::vars());
    }

    /// Apply overrides from any `(name, value)` source.
    ///
    /// `PREFIX` + `STORAGE__CHUNK_SIZE` becomes `storage.chunk_size`.
    pub fn load_vars<I>(&mut self, prefix: &str, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                self.set(normalized, value);
            }
        }
    }

    pub fn snapshot(&self) -> ReelConfigSnapshot {
        ReelConfigSnapshot::new(self.values.clone())
    }
}

/// Immutable, cheaply cloneable view with typed getters.
#[derive(Debug, Clone, Default)]
pub struct ReelConfigSnapshot {
    map: HashMap<String, String>,
}

impl ReelConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.trim().parse::<bool>().ok())
    }
}
