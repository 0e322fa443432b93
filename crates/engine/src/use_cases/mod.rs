//! Use cases - User story orchestration.
//!
//! The orchestrator classifies each chat line, runs the matching game
//! handler inside one store session, and hands the produced messages to
//! the broadcaster.

pub mod broadcast;
pub mod game;
pub mod orchestrator;
pub mod session;

pub use broadcast::{Broadcaster, Delivery, DeliveryReport};
pub use game::GameError;
pub use orchestrator::GameOrchestrator;
pub use session::{Intent, SessionStateMachine};
