//! Session store adapters.

mod in_memory;
mod redis;

pub use in_memory::InMemorySessionStore;
pub use redis::RedisSessionStore;
