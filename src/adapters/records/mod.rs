//! Record API adapters.

mod http;
mod in_memory;

pub use http::{HttpRecordApi, HttpRecordApiConfig};
pub use in_memory::{InMemoryRecordApi, StoredRecord};
