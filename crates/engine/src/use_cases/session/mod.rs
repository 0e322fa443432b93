//! Session use cases.
//!
//! Maps each player state to the grammar that classifies their next message.

mod state_machine;

pub use state_machine::{Intent, SessionStateMachine};
