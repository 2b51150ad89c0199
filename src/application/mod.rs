//! Application layer - the registration engine and its wiring.
//!
//! - `engine` - Generic multi-turn engine, one instance per flow type
//! - `flow` - Type-erased flow interface used for routing
//! - `router` - Dispatches commands to the user's active flow
//! - `flows` - Concrete domain services and prompts

pub mod engine;
pub mod flow;
pub mod flows;
pub mod router;

pub use engine::{FlowDefinition, FlowEngine, FlowError, FlowHooks, FlowPorts};
pub use flow::RegistrationFlow;
pub use router::{FlowCommand, FlowRouter, FlowRouterBuilder, RouterError};
