use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use std::sync::Arc;
use crate::errors::StoreResult;
use super::store::DocumentStore;

// KEYS: document, id set. ARGV: expected, replacement, id.
const COMPARE_AND_SWAP: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    redis.call('SET', KEYS[1], ARGV[2])
    redis.call('SADD', KEYS[2], ARGV[3])
    return 1
end
return 0
"#;

/// Documents live at `{collection}:{id}`; the set `{collection}:ids` indexes them.
pub struct RedisStore {
    client: Arc<Client>,
}

impl RedisStore {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    fn doc_key(collection: &str, id: &str) -> String {
        format!("{}:{}", collection, id)
    }

    fn ids_key(collection: &str) -> String {
        format!("{}:ids", collection)
    }
}

#[async_trait]
impl DocumentStore for RedisStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<String>> {
        let mut conn = self.client.get_async_connection().await?;
        let doc: Option<String> = conn.get(Self::doc_key(collection, id)).await?;
        Ok(doc)
    }

    async fn put(&self, collection: &str, id: &str, doc: &str) -> StoreResult<()> {
        let mut conn = self.client.get_async_connection().await?;
        redis::pipe()
            .atomic()
            .set(Self::doc_key(collection, id), doc)
            .ignore()
            .sadd(Self::ids_key(collection), id)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn insert_new(&self, collection: &str, id: &str, doc: &str) -> StoreResult<bool> {
        let mut conn = self.client.get_async_connection().await?;
        let created: bool = conn.set_nx(Self::doc_key(collection, id), doc).await?;
        if created {
            let _: () = conn.sadd(Self::ids_key(collection), id).await?;
        }
        Ok(created)
    }

    async fn compare_and_swap(&self, collection: &str, id: &str, expected: &str, doc: &str) -> StoreResult<bool> {
        let mut conn = self.client.get_async_connection().await?;
        let swapped: i64 = redis::Script::new(COMPARE_AND_SWAP)
            .key(Self::doc_key(collection, id))
            .key(Self::ids_key(collection))
            .arg(expected)
            .arg(doc)
            .arg(id)
            .invoke_async(&mut conn)
            .await?;
        Ok(swapped == 1)
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let mut conn = self.client.get_async_connection().await?;
        let (removed, _): (i64, i64) = redis::pipe()
            .atomic()
            .del(Self::doc_key(collection, id))
            .srem(Self::ids_key(collection), id)
            .query_async(&mut conn)
            .await?;
        Ok(removed > 0)
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.client.get_async_connection().await?;
        let ids: Vec<String> = conn.smembers(Self::ids_key(collection)).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.iter().map(|id| Self::doc_key(collection, id)).collect();
        // MGET always replies with an array, even for a single key
        let docs: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await?;

        if docs.iter().any(Option::is_none) {
            tracing::warn!("Collection {} indexes ids without a document", collection);
        }
        Ok(docs.into_iter().flatten().collect())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(RedisStore::doc_key("usuarios", "abc"), "usuarios:abc");
        assert_eq!(RedisStore::ids_key("usuarios"), "usuarios:ids");
    }
}
