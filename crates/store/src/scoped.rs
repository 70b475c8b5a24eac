use std::sync::Arc;

use {
    serde::{Serialize, de::DeserializeOwned},
    serde_json::Value,
    tracing::warn,
};

use crate::{KvStore, Result};

/// A [`KvStore`] handle bound to one subject (a plugin name).
#[derive(Clone)]
pub struct ScopedStore {
    subject: String,
    inner: Arc<dyn KvStore>,
}

impl ScopedStore {
    #[must_use]
    pub fn new(subject: impl Into<String>, inner: Arc<dyn KvStore>) -> Self {
        Self {
            subject: subject.into(),
            inner,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub async fn get_value(&self, key: &str) -> Result<Option<Value>> {
        self.inner.get_value(&self.subject, key).await
    }

    pub async fn store_value(&self, key: &str, value: Value) -> Result<()> {
        self.inner.store_value(&self.subject, key, value).await
    }

    pub async fn delete_value(&self, key: &str) -> Result<Option<Value>> {
        self.inner.delete_value(&self.subject, key).await
    }

    pub async fn keys(&self) -> Result<Vec<String>> {
        self.inner.keys(&self.subject).await
    }

    /// Typed read. A stored value of the wrong shape is logged and treated
    /// as absent.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(value) = self.get_value(key).await? else {
            return Ok(None);
        };
        match serde_json::from_value(value) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                warn!(subject = %self.subject, key, error = %e, "stored value has unexpected shape");
                Ok(None)
            },
        }
    }

    pub async fn store_as<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.store_value(key, serde_json::to_value(value)?).await
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::MemoryStore, serde_json::json};

    #[tokio::test]
    async fn scopes_share_backend_but_not_keys() {
        let backend: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let a = ScopedStore::new("a", Arc::clone(&backend));
        let b = ScopedStore::new("b", backend);

        a.store_as("seen", &vec![1u32, 2]).await.unwrap();
        assert_eq!(a.get_as::<Vec<u32>>("seen").await.unwrap(), Some(vec![1, 2]));
        assert_eq!(b.get_value("seen").await.unwrap(), None);
    }

    #[tokio::test]
    async fn wrong_shape_reads_as_none() {
        let scoped = ScopedStore::new("a", Arc::new(MemoryStore::new()));
        scoped.store_value("n", json!("text")).await.unwrap();
        assert_eq!(scoped.get_as::<u64>("n").await.unwrap(), None);
    }
}
