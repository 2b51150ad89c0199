//! Draft store adapters.

mod in_memory;
mod redis;

pub use in_memory::InMemoryDraftStore;
pub use redis::RedisDraftStore;
