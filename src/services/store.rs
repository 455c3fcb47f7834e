use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use crate::errors::StoreResult;

/// JSON documents grouped in named collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<String>>;

    /// Inserts or replaces a document.
    async fn put(&self, collection: &str, id: &str, doc: &str) -> StoreResult<()>;

    /// Inserts only when no document has this id. Returns whether it was created.
    async fn insert_new(&self, collection: &str, id: &str, doc: &str) -> StoreResult<bool>;

    /// Replaces a document only while it still reads `expected`. Returns whether it was replaced.
    async fn compare_and_swap(&self, collection: &str, id: &str, expected: &str, doc: &str) -> StoreResult<bool>;

    /// Returns whether a document was removed.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool>;

    /// All documents of a collection, in no particular order.
    async fn list(&self, collection: &str) -> StoreResult<Vec<String>>;

    fn backend_name(&self) -> &'static str;
}

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<String>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|c| c.get(id)).cloned())
    }

    async fn put(&self, collection: &str, id: &str, doc: &str) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc.to_string());
        Ok(())
    }

    async fn insert_new(&self, collection: &str, id: &str, doc: &str) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(id) {
            return Ok(false);
        }
        docs.insert(id.to_string(), doc.to_string());
        Ok(true)
    }

    async fn compare_and_swap(&self, collection: &str, id: &str, expected: &str, doc: &str) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        match collections.get_mut(collection).and_then(|c| c.get_mut(id)) {
            Some(current) if current == expected => {
                *current = doc.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .map(|c| c.remove(id).is_some())
            .unwrap_or(false))
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<String>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_new_does_not_overwrite() {
        let store = MemoryStore::new();
        assert!(store.insert_new("c", "1", "first").await.unwrap());
        assert!(!store.insert_new("c", "1", "second").await.unwrap());
        assert_eq!(store.get("c", "1").await.unwrap().as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_compare_and_swap_needs_current_value() {
        let store = MemoryStore::new();
        assert!(!store.compare_and_swap("c", "1", "x", "y").await.unwrap());

        store.put("c", "1", "x").await.unwrap();
        assert!(!store.compare_and_swap("c", "1", "stale", "y").await.unwrap());
        assert!(store.compare_and_swap("c", "1", "x", "y").await.unwrap());
        assert_eq!(store.get("c", "1").await.unwrap().as_deref(), Some("y"));
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = MemoryStore::new();
        store.put("a", "1", "x").await.unwrap();
        store.put("b", "1", "y").await.unwrap();

        assert_eq!(store.list("a").await.unwrap(), vec!["x".to_string()]);
        assert!(store.delete("b", "1").await.unwrap());
        assert!(!store.delete("b", "1").await.unwrap());
        assert!(store.get("b", "1").await.unwrap().is_none());
        assert!(store.list("missing").await.unwrap().is_empty());
    }
}
