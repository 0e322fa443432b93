//! Zavalinka domain layer.
//!
//! Pure vocabulary for the chat game: players, games, the per-player session
//! state, and validated string values. Nothing in this crate performs I/O.

extern crate self as zavalinka_domain;

pub mod common;
pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use entities::{Game, GameKind, Player, PlayerState};

pub use error::DomainError;

// Re-export ID types
pub use ids::{GameId, PlayerId};

// Re-export value objects (explicit list in value_objects/mod.rs)
pub use value_objects::{
    GameTag, GameText, Nickname, Prolog, MAX_GAME_TAG_LENGTH, MAX_GAME_TEXT_LENGTH,
    MAX_NICKNAME_LENGTH, MAX_PROLOG_LENGTH,
};
