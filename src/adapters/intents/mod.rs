//! Intent history adapters.

mod in_memory;
mod redis;

pub use in_memory::InMemoryIntentHistory;
pub use redis::RedisIntentHistory;
