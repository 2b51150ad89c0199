//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the registration engine and the outside world. Adapters implement these
//! ports.
//!
//! ## Storage Ports
//!
//! - `SessionStore` - Per-user session documents (shallow-merge writes)
//! - `DraftStore` - Per-user, per-flow partial records
//! - `IntentHistory` - Recent language-model intents
//!
//! ## Domain Ports
//!
//! - `DomainService` - Draft merging, summaries and record CRUD for one flow
//! - `FieldPrompts` - Missing-field handlers and field editors
//! - `RecordApi` - External backing store of records
//!
//! ## Delivery Ports
//!
//! - `MessagingChannel` - Outbound text and choice messages

mod domain_service;
mod draft_store;
mod field_prompts;
mod intent_history;
mod messaging_channel;
mod record_api;
mod session_store;

pub use domain_service::DomainService;
pub use draft_store::{DraftStore, DraftStoreError};
pub use field_prompts::{FieldPrompt, FieldPrompts, MissingFieldPrompt};
pub use intent_history::{IntentEntry, IntentHistory, IntentHistoryError};
pub use messaging_channel::{ChannelError, MessagingChannel};
pub use record_api::{RecordApi, RecordApiError};
pub use session_store::{SessionStore, SessionStoreError};
