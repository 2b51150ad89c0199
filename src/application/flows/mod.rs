//! Concrete flows: domain services and prompts for each registration type.

mod death;
mod draft_repository;
mod expense;

pub use death::{death_definition, death_messages, DeathPrompts, DeathService};
pub use draft_repository::DraftRepository;
pub use expense::{
    expense_definition, expense_messages, ExpensePrompts, ExpenseService, EXPENSE_CATEGORIES,
};
