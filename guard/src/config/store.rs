use std::env;

use config::Config as ConfigBuilder;
use config::Environment;
use config::File;
use serde::de::DeserializeOwned;
use serde_json::Map;
use serde_json::Value;

use super::defaults::default_tree;
use super::errors::ConfigError;
use super::settings::Settings;

/// Nested configuration addressed by dotted paths.
///
/// Starts out holding the built-in defaults. The first [`ConfigStore::init`]
/// merges caller overrides onto them; later calls are ignored unless forced.
/// Components receive the store by reference instead of reading a process-wide
/// singleton.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    tree: Value,
    initialized: bool,
}

impl ConfigStore {
    /// Create a store holding the built-in defaults.
    pub fn new() -> Self {
        Self {
            tree: default_tree(),
            initialized: false,
        }
    }

    /// Create and initialize a store in one step.
    pub fn with_overrides(overrides: Value) -> Self {
        let mut store = Self::new();
        store.init(overrides, false);
        store
    }

    /// Deep-merge `overrides` onto the built-in defaults.
    ///
    /// # Arguments
    /// * `overrides` - Partial configuration tree
    /// * `force` - Re-initialize even if the store was already initialized
    ///
    /// # Returns
    /// True if the overrides were applied, false if the call was a no-op
    pub fn init(&mut self, overrides: Value, force: bool) -> bool {
        if self.initialized && !force {
            tracing::debug!("Configuration already initialized, ignoring init");
            return false;
        }

        let mut tree = default_tree();
        match overrides {
            Value::Object(_) => deep_merge(&mut tree, overrides),
            Value::Null => {}
            other => {
                tracing::warn!(
                    kind = kind_of(&other),
                    "Ignoring non-mapping configuration overrides"
                );
            }
        }
        self.tree = tree;
        self.initialized = true;

        true
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Look up a value by dotted path.
    ///
    /// Returns `None` when any segment is missing or an intermediate value is
    /// not a mapping.
    pub fn get(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return None;
        }

        path.split('.')
            .try_fold(&self.tree, |value, segment| value.as_object()?.get(segment))
    }

    /// Look up a value by dotted path and deserialize it.
    ///
    /// # Errors
    /// * `Invalid` - The value exists but does not have the requested shape
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ConfigError> {
        match self.get(path) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| ConfigError::invalid(path, e)),
        }
    }

    /// Store a value at a dotted path.
    ///
    /// Absent or null intermediate segments are created as empty mappings.
    ///
    /// # Errors
    /// * `EmptyPath` - The path has no segments
    /// * `NotAMapping` - An intermediate segment holds a non-mapping value
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), ConfigError> {
        if path.is_empty() {
            return Err(ConfigError::EmptyPath);
        }

        let segments: Vec<&str> = path.split('.').collect();
        let (last, parents) = segments.split_last().ok_or(ConfigError::EmptyPath)?;

        let mut current = &mut self.tree;
        for (index, segment) in parents.iter().enumerate() {
            let map = match current {
                Value::Object(map) => map,
                other => {
                    return Err(ConfigError::NotAMapping {
                        path: segments[..index].join("."),
                        actual: kind_of(other),
                    })
                }
            };

            let next = map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if next.is_null() {
                *next = Value::Object(Map::new());
            }
            if !next.is_object() {
                return Err(ConfigError::NotAMapping {
                    path: segments[..=index].join("."),
                    actual: kind_of(next),
                });
            }

            current = next;
        }

        match current {
            Value::Object(map) => {
                map.insert(last.to_string(), value);
                Ok(())
            }
            other => Err(ConfigError::NotAMapping {
                path: parents.join("."),
                actual: kind_of(other),
            }),
        }
    }

    /// Deserialize the whole tree into a typed snapshot.
    ///
    /// # Errors
    /// * `Invalid` - A setting has the wrong shape (unknown algorithm, bad duration, ...)
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        serde_json::from_value(self.tree.clone()).map_err(|e| ConfigError::invalid("<root>", e))
    }

    /// Build an override tree from configuration files and the environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT_GUARD__JWT__SECRET, JWT_GUARD__JWT__USE_BLACKLIST, ...)
    /// 2. Environment-specific config file (config/{RUN_MODE}.toml)
    /// 3. Default config file (config/default.toml)
    ///
    /// # Errors
    /// * `Source` - A source could not be read or parsed
    pub fn load_overrides() -> Result<Value, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(Environment::with_prefix("JWT_GUARD").separator("__"))
            .build()?;

        let mut overrides: Value = configuration.try_deserialize()?;
        coerce_to_defaults(&mut overrides, &default_tree());

        Ok(overrides)
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge `overrides` into `base`: mappings merge recursively, anything else overwrites.
pub fn deep_merge(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            for (key, value) in override_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overrides) => *base = overrides,
    }
}

/// Parse string leaves whose default at the same path is a boolean or a number.
///
/// Environment values always arrive as strings. Only the paths the defaults type
/// as scalars are converted, so secrets and other string settings keep their text
/// even when it looks like `42` or `true`.
fn coerce_to_defaults(value: &mut Value, defaults: &Value) {
    if let (Value::Object(map), Value::Object(default_map)) = (&mut *value, defaults) {
        for (key, child) in map.iter_mut() {
            if let Some(default) = default_map.get(key) {
                coerce_to_defaults(child, default);
            }
        }
        return;
    }

    let Value::String(raw) = value else {
        return;
    };
    let coerced = match defaults {
        Value::Bool(_) => raw.trim().parse::<bool>().ok().map(Value::Bool),
        Value::Number(_) => raw.trim().parse::<u64>().ok().map(Value::from),
        _ => None,
    };
    if let Some(coerced) = coerced {
        *value = coerced;
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::Algorithm;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_init_merges_over_defaults() {
        let mut store = ConfigStore::new();
        assert!(!store.is_initialized());

        let applied = store.init(json!({ "jwt": { "secret": "P@ssw0rd" } }), false);

        assert!(applied);
        assert!(store.is_initialized());
        assert_eq!(store.get("jwt.secret"), Some(&json!("P@ssw0rd")));
        assert_eq!(store.get("jwt.options.algorithm"), Some(&json!("HS256")));
        assert_eq!(store.get("jwt.options.expires_in"), Some(&json!("5m")));
    }

    #[test]
    fn test_second_init_without_force_is_noop() {
        let mut store = ConfigStore::new();
        store.init(json!({ "jwt": { "secret": "first" } }), false);

        let applied = store.init(json!({ "jwt": { "secret": "second" } }), false);

        assert!(!applied);
        assert_eq!(store.get("jwt.secret"), Some(&json!("first")));
    }

    #[test]
    fn test_forced_init_replaces_configuration() {
        let mut store = ConfigStore::new();
        store.init(
            json!({ "jwt": { "secret": "first", "use_blacklist": true } }),
            false,
        );

        let applied = store.init(json!({ "jwt": { "secret": "second" } }), true);

        assert!(applied);
        assert_eq!(store.get("jwt.secret"), Some(&json!("second")));
        // Forced init starts again from the defaults, not from the previous tree
        assert_eq!(store.get("jwt.use_blacklist"), Some(&json!(false)));
    }

    #[test]
    fn test_get_missing_path_returns_none() {
        let store = ConfigStore::new();

        assert!(store.get("jwt.nothing.here").is_none());
        assert!(store.get("jwt.options.algorithm.deeper").is_none());
        assert!(store.get("").is_none());
    }

    #[test]
    fn test_get_as_typed() {
        let store = ConfigStore::new();

        let key: Option<String> = store
            .get_as("jwt.middleware.token_payload_key")
            .expect("Failed to read setting");
        assert_eq!(key.as_deref(), Some("user"));

        let missing: Option<String> = store.get_as("jwt.absent").expect("Failed to read setting");
        assert!(missing.is_none());

        let wrong: Result<Option<u64>, _> = store.get_as("jwt.middleware.token_payload_key");
        assert!(matches!(wrong, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_set_creates_intermediate_mappings() {
        let mut store = ConfigStore::new();

        store
            .set("custom.nested.value", json!(42))
            .expect("Failed to set value");

        assert_eq!(store.get("custom.nested.value"), Some(&json!(42)));
        assert!(store.get("custom.nested").is_some_and(Value::is_object));
    }

    #[test]
    fn test_set_replaces_null_intermediate() {
        let mut store = ConfigStore::new();

        store
            .set("encryption.secret.inner", json!("x"))
            .expect("Failed to set value");

        assert_eq!(store.get("encryption.secret.inner"), Some(&json!("x")));
    }

    #[test]
    fn test_set_through_scalar_fails() {
        let mut store = ConfigStore::new();

        let result = store.set("jwt.options.algorithm.name", json!("HS512"));

        match result {
            Err(ConfigError::NotAMapping { path, actual }) => {
                assert_eq!(path, "jwt.options.algorithm");
                assert_eq!(actual, "string");
            }
            other => panic!("Expected NotAMapping, got {:?}", other),
        }
        assert_eq!(store.get("jwt.options.algorithm"), Some(&json!("HS256")));
    }

    #[test]
    fn test_set_empty_path_fails() {
        let mut store = ConfigStore::new();
        assert!(matches!(
            store.set("", json!(1)),
            Err(ConfigError::EmptyPath)
        ));
    }

    #[test]
    fn test_deep_merge_overwrites_non_mappings() {
        let mut base = json!({ "a": { "b": 1, "c": [1, 2] }, "d": "x" });
        deep_merge(&mut base, json!({ "a": { "c": [3] }, "d": { "e": true } }));

        assert_eq!(base, json!({ "a": { "b": 1, "c": [3] }, "d": { "e": true } }));
    }

    #[test]
    fn test_default_settings_deserialize() {
        let store = ConfigStore::with_overrides(json!({ "jwt": { "secret": "s" } }));
        let settings = store.settings().expect("Failed to build settings");

        assert_eq!(settings.jwt.secret.as_deref(), Some("s"));
        assert_eq!(settings.jwt.middleware.token_payload_key, "user");
        assert_eq!(settings.jwt.extract.scheme.as_deref(), Some("Bearer"));
        assert!(settings.jwt.refresh.extract.scheme.is_none());
        assert!(!settings.jwt.use_blacklist);
    }

    #[test]
    fn test_coerce_keeps_secrets_as_strings() {
        let mut overrides = json!({
            "jwt": {
                "secret": "12345678901234567890123456789012",
                "use_blacklist": "true",
                "refresh": { "secret": "true" }
            },
            "encryption": { "secret": "42" },
            "localization": {
                "responses": {
                    "MISSING_TOKEN": { "http_code": "401", "message": "404" }
                }
            }
        });

        coerce_to_defaults(&mut overrides, &default_tree());

        assert_eq!(overrides["jwt"]["secret"], json!("12345678901234567890123456789012"));
        assert_eq!(overrides["jwt"]["use_blacklist"], json!(true));
        assert_eq!(overrides["jwt"]["refresh"]["secret"], json!("true"));
        assert_eq!(overrides["encryption"]["secret"], json!("42"));
        let entry = &overrides["localization"]["responses"]["MISSING_TOKEN"];
        assert_eq!(entry["http_code"], json!(401));
        assert_eq!(entry["message"], json!("404"));
    }

    #[test]
    fn test_coerce_leaves_unparsable_values() {
        let mut overrides = json!({ "jwt": { "use_encrypt": "maybe", "unknown": "7" } });

        coerce_to_defaults(&mut overrides, &default_tree());

        assert_eq!(overrides["jwt"]["use_encrypt"], json!("maybe"));
        assert_eq!(overrides["jwt"]["unknown"], json!("7"));
    }

    #[test]
    fn test_load_overrides_from_environment() {
        env::set_var("JWT_GUARD__JWT__SECRET", "12345678901234567890123456789012");
        env::set_var("JWT_GUARD__JWT__USE_BLACKLIST", "true");
        let overrides = ConfigStore::load_overrides();
        env::remove_var("JWT_GUARD__JWT__SECRET");
        env::remove_var("JWT_GUARD__JWT__USE_BLACKLIST");

        let overrides = overrides.expect("Failed to load overrides");
        let settings = ConfigStore::with_overrides(overrides)
            .settings()
            .expect("Failed to deserialize settings");

        assert_eq!(
            settings.jwt.secret.as_deref(),
            Some("12345678901234567890123456789012")
        );
        assert!(settings.jwt.use_blacklist);
        assert_eq!(settings.jwt.options.algorithm, Some(Algorithm::HS256));
    }
}
