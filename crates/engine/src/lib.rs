//! Zavalinka Engine library.
//!
//! Server side of the "Intellectual Zavalinka" chat game.
//!
//! ## Structure
//!
//! - `intent/` - Keyword intent extractors
//! - `use_cases/` - Session state machine, game handlers, orchestration, broadcast
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - HTTP and WebSocket entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod intent;
pub mod use_cases;

/// Test fixtures shared by unit tests.
#[cfg(test)]
pub mod test_fixtures;

pub use app::App;
