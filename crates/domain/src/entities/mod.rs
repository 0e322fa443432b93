//! Domain entities - Core business objects with identity

mod game;
mod player;

pub use game::{Game, GameKind};
pub use player::{Player, PlayerState};
