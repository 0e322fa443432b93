//! Game aggregate - one active play session, found by its tag
//!
//! The player set is not stored on the game; it is whatever players currently
//! reference this game's id, queried through the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::value_objects::{GameTag, Prolog};
use zavalinka_domain::GameId;

/// Which game variant is played. Fixes which handlers apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    /// Players guess the true continuation of a poem's opening lines
    Poetic,
    /// Players invent definitions for an obscure word
    Dictionary,
}

impl GameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::Poetic => "poetic",
            GameKind::Dictionary => "dictionary",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "poetic" => Ok(Self::Poetic),
            "dictionary" => Ok(Self::Dictionary),
            _ => Err(DomainError::parse(format!("Unknown game kind: {}", s))),
        }
    }
}

/// A game session.
///
/// # Invariants
///
/// - `tag` is normalized and unique across games (uniqueness is enforced by
///   the store when the game is created)
/// - `prolog` is <= 300 characters (enforced by `Prolog`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    id: GameId,
    tag: GameTag,
    kind: GameKind,
    prolog: Option<Prolog>,
    created_at: DateTime<Utc>,
}

impl Game {
    /// Create a new game with a fresh id.
    pub fn new(tag: GameTag, kind: GameKind, created_at: DateTime<Utc>) -> Self {
        Self {
            id: GameId::new(),
            tag,
            kind,
            prolog: None,
            created_at,
        }
    }

    #[inline]
    pub fn id(&self) -> GameId {
        self.id
    }

    #[inline]
    pub fn tag(&self) -> &GameTag {
        &self.tag
    }

    #[inline]
    pub fn kind(&self) -> GameKind {
        self.kind
    }

    #[inline]
    pub fn prolog(&self) -> Option<&Prolog> {
        self.prolog.as_ref()
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Set the game's ID (used when loading from storage).
    pub fn with_id(mut self, id: GameId) -> Self {
        self.id = id;
        self
    }

    /// Set the prolog (used when loading from storage).
    pub fn with_prolog(mut self, prolog: Option<Prolog>) -> Self {
        self.prolog = prolog;
        self
    }

    /// Record the host's prolog.
    pub fn set_prolog(&mut self, prolog: Prolog) {
        self.prolog = Some(prolog);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> GameTag {
        GameTag::new(s).expect("valid tag")
    }

    #[test]
    fn new_game_has_no_prolog() {
        let game = Game::new(tag("evening"), GameKind::Poetic, Utc::now());
        assert_eq!(game.tag().as_str(), "evening");
        assert_eq!(game.kind(), GameKind::Poetic);
        assert!(game.prolog().is_none());
    }

    #[test]
    fn set_prolog_replaces_prolog() {
        let mut game = Game::new(tag("evening"), GameKind::Poetic, Utc::now());
        game.set_prolog(Prolog::new("Мороз и солнце").expect("prolog"));
        assert_eq!(game.prolog().map(Prolog::as_str), Some("Мороз и солнце"));
    }

    #[test]
    fn game_kind_parses_stored_values() {
        assert_eq!("poetic".parse::<GameKind>(), Ok(GameKind::Poetic));
        assert_eq!("DICTIONARY".parse::<GameKind>(), Ok(GameKind::Dictionary));
        assert!("chess".parse::<GameKind>().is_err());
    }
}
