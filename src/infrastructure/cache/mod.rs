pub mod factory;
pub mod memory;
pub mod redis;

pub use factory::{CacheBackend, CacheFactory, CacheSettings};
pub use memory::{MemoryStore, MemoryStoreConfig};
pub use redis::{RedisStore, RedisStoreConfig};
