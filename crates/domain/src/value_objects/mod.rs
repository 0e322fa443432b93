//! Value objects - Immutable objects defined by their attributes

mod tag;
mod text;

pub use tag::{GameTag, MAX_GAME_TAG_LENGTH};
pub use text::{
    GameText, Nickname, Prolog, MAX_GAME_TEXT_LENGTH, MAX_NICKNAME_LENGTH, MAX_PROLOG_LENGTH,
};
