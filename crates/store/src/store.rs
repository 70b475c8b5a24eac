use {async_trait::async_trait, serde_json::Value};

use crate::Result;

/// Backend for plugin key-value data.
///
/// `subject` partitions the key space; the framework passes the plugin
/// name so plugins cannot read each other's values.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get_value(&self, subject: &str, key: &str) -> Result<Option<Value>>;
    async fn store_value(&self, subject: &str, key: &str, value: Value) -> Result<()>;
    /// Returns the removed value, if any.
    async fn delete_value(&self, subject: &str, key: &str) -> Result<Option<Value>>;
    async fn keys(&self, subject: &str) -> Result<Vec<String>>;
}
