//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, state machine trait, errors)
//! - `registration` - The generic multi-turn registration vocabulary
//! - `flows` - Reference domains (expense, livestock death)

pub mod flows;
pub mod foundation;
pub mod registration;
