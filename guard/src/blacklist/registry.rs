use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::driver::BlacklistDriver;
use super::errors::BlacklistError;
use super::memory::MemoryBlacklist;
use super::memory::MemoryDriverParams;

/// Builds a driver from its `driver_params` configuration value.
pub type DriverConstructor =
    Arc<dyn Fn(&Value) -> Result<Arc<dyn BlacklistDriver>, BlacklistError> + Send + Sync>;

/// Name → constructor table used to select the configured blacklist driver.
#[derive(Clone)]
pub struct DriverRegistry {
    constructors: HashMap<String, DriverConstructor>,
}

impl DriverRegistry {
    /// Create a registry with no drivers.
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Register (or replace) the constructor for `name`.
    pub fn register<F>(&mut self, name: impl ToString, constructor: F) -> &mut Self
    where
        F: Fn(&Value) -> Result<Arc<dyn BlacklistDriver>, BlacklistError> + Send + Sync + 'static,
    {
        self.constructors
            .insert(name.to_string(), Arc::new(constructor));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Instantiate the driver registered under `name`.
    ///
    /// # Errors
    /// * `UnknownDriver` - Nothing is registered under `name`
    /// * `InvalidParams` - The driver rejected its parameters
    pub fn create(
        &self,
        name: &str,
        params: &Value,
    ) -> Result<Arc<dyn BlacklistDriver>, BlacklistError> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| BlacklistError::UnknownDriver(name.to_string()))?;

        let driver = constructor(params)?;
        tracing::info!(driver = name, "Blacklist driver created");

        Ok(driver)
    }
}

impl Default for DriverRegistry {
    /// Registry knowing the built-in `memory` driver.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("memory", memory_driver);
        registry
    }
}

fn memory_driver(params: &Value) -> Result<Arc<dyn BlacklistDriver>, BlacklistError> {
    let params: MemoryDriverParams = if params.is_null() {
        MemoryDriverParams::default()
    } else {
        serde_json::from_value(params.clone()).map_err(|e| BlacklistError::InvalidParams {
            driver: "memory".to_string(),
            reason: e.to_string(),
        })?
    };

    Ok(Arc::new(MemoryBlacklist::with_sweeper(&params)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct DenyAll;

    impl BlacklistDriver for DenyAll {
        fn is_exists(&self, _key: &str) -> bool {
            true
        }

        fn set(&self, _key: &str, _expires_at: i64) {}
    }

    #[test]
    fn test_default_registry_creates_memory_driver() {
        let registry = DriverRegistry::default();

        let driver = registry
            .create("memory", &json!({ "clear_expired_items_interval": "1m" }))
            .expect("Failed to create driver");

        driver.set("token", chrono::Utc::now().timestamp() + 60);
        assert!(driver.is_exists("token"));
    }

    #[test]
    fn test_unknown_driver() {
        let registry = DriverRegistry::default();

        let result = registry.create("redis", &Value::Null);
        assert!(matches!(result, Err(BlacklistError::UnknownDriver(name)) if name == "redis"));
    }

    #[test]
    fn test_invalid_memory_params() {
        let registry = DriverRegistry::default();

        let result = registry.create(
            "memory",
            &json!({ "clear_expired_items_interval": "whenever" }),
        );
        assert!(matches!(result, Err(BlacklistError::InvalidParams { .. })));
    }

    #[test]
    fn test_register_custom_driver() {
        let mut registry = DriverRegistry::empty();
        assert!(!registry.contains("deny"));

        registry.register("deny", |_params: &Value| {
            Ok(Arc::new(DenyAll) as Arc<dyn BlacklistDriver>)
        });

        let driver = registry
            .create("deny", &Value::Null)
            .expect("Failed to create driver");
        assert!(driver.is_exists("anything"));
    }
}
