use thiserror::Error;
use redis::RedisError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Too many concurrent updates of {collection}:{id}")]
    Contention { collection: String, id: String },
}

pub type StoreResult<T> = Result<T, StoreError>;
