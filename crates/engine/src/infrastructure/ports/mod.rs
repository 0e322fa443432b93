//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Game/player persistence (SQLite in production, in-memory for tests)
//! - Outbound chat messages (WebSocket today, any messenger tomorrow)
//! - Clock (for testing)

mod error;
mod external;
mod repos;
mod testing;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{GameSession, GameStore};

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::MessengerPort;

#[cfg(test)]
pub use external::MockMessengerPort;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::ClockPort;

#[cfg(test)]
pub use testing::MockClockPort;

// =============================================================================
// Error Types
// =============================================================================
pub use error::{MessagingError, RepoError};
