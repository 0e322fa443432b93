//! Validated free-text newtypes typed by players.
//!
//! These newtypes ensure that text is valid by construction:
//! - Trimmed of leading/trailing whitespace
//! - Non-empty
//! - Within the length limit, counted in characters (not bytes)

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Maximum length for a player's nickname
pub const MAX_NICKNAME_LENGTH: usize = 64;

/// Maximum length for the host's prolog
pub const MAX_PROLOG_LENGTH: usize = 300;

/// Maximum length for a submitted game text
pub const MAX_GAME_TEXT_LENGTH: usize = 300;

macro_rules! bounded_text {
    ($(#[$meta:meta])* $name:ident, $max:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create a new validated value.
            ///
            /// # Errors
            ///
            /// - `DomainError::EmptyText` if the text is empty after trimming
            /// - `DomainError::TextTooLong` if it exceeds the limit after trimming
            pub fn new(text: impl Into<String>) -> Result<Self, DomainError> {
                let text = text.into();
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::EmptyText);
                }
                if trimmed.chars().count() > $max {
                    return Err(DomainError::TextTooLong { max: $max });
                }
                Ok(Self(trimmed.to_string()))
            }

            /// Returns the text as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = DomainError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.0
            }
        }
    };
}

bounded_text!(
    /// A player's display name (non-empty, <=64 chars, trimmed)
    Nickname,
    MAX_NICKNAME_LENGTH
);

bounded_text!(
    /// The opening lines the host sets for a poetic game (<=300 chars)
    Prolog,
    MAX_PROLOG_LENGTH
);

bounded_text!(
    /// A player's contribution to the game, e.g. a guessed continuation (<=300 chars)
    GameText,
    MAX_GAME_TEXT_LENGTH
);
