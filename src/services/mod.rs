mod store;
mod redis_store;
mod repository;
pub mod passwords;

pub use store::{DocumentStore, MemoryStore};
pub use redis_store::RedisStore;
pub use repository::Repository;
