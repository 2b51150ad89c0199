//! Messaging channel adapters.

mod console;
mod in_memory;

pub use console::ConsoleChannel;
pub use in_memory::{InMemoryChannel, SentMessage};
