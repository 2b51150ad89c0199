//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the registration engine to external systems:
//! - `session` - Session stores (in-memory, Redis)
//! - `drafts` - Draft stores (in-memory, Redis)
//! - `intents` - Intent history (in-memory, Redis)
//! - `records` - Record API clients (in-memory, HTTP)
//! - `messaging` - Outbound channels (recording, console)

pub mod drafts;
pub mod intents;
pub mod messaging;
pub mod records;
pub mod session;

mod expiring;
mod redis_keys;

pub use drafts::{InMemoryDraftStore, RedisDraftStore};
pub use expiring::{evict_expired, Expiring};
pub use intents::{InMemoryIntentHistory, RedisIntentHistory};
pub use messaging::{ConsoleChannel, InMemoryChannel, SentMessage};
pub use records::{HttpRecordApi, HttpRecordApiConfig, InMemoryRecordApi, StoredRecord};
pub use redis_keys::RedisKeys;
pub use session::{InMemorySessionStore, RedisSessionStore};
