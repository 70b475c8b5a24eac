//! Read-only configuration view scoped to a single plugin namespace.

use {serde::de::DeserializeOwned, serde_json::Value, tracing::warn};

#[derive(Debug, Clone)]
pub struct PluginConfig {
    namespace: String,
    values: Option<Value>,
}

impl PluginConfig {
    pub fn new(namespace: impl Into<String>, values: Option<Value>) -> Self {
        Self {
            namespace: namespace.into(),
            values,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Whole namespace, or `None` if the config file has no section for it.
    pub fn get_all(&self) -> Option<&Value> {
        self.values.as_ref().filter(|v| !v.is_null())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.get_all()?.get(key).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }

    /// Deserialize one key into `T`. A value of the wrong shape is logged and
    /// treated as absent.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(namespace = %self.namespace, key, error = %e, "ignoring malformed plugin setting");
                None
            },
        }
    }
}
