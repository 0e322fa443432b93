//! Game tag - the human-chosen label players use to find a game.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::normalize_str;
use crate::error::DomainError;

/// Maximum number of characters in a normalized game tag.
pub const MAX_GAME_TAG_LENGTH: usize = 64;

/// A normalized game tag (non-empty, lower-case alphabetic, <=64 chars).
///
/// Tags are compared by their normalized form, so "Poets Club" and
/// "poets-club!" name the same game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GameTag(String);

impl GameTag {
    /// Normalize free chat text into a tag, truncating to the maximum length.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EmptyTag` if nothing alphabetic survives.
    pub fn normalize(text: &str) -> Result<Self, DomainError> {
        let tag = normalize_str(text, Some(MAX_GAME_TAG_LENGTH));
        if tag.is_empty() {
            return Err(DomainError::EmptyTag);
        }
        Ok(Self(tag))
    }

    /// Accept an already-normalized tag, e.g. one read back from storage.
    ///
    /// # Errors
    ///
    /// - `DomainError::EmptyTag` if the tag is empty
    /// - `DomainError::TagTooLong` if it exceeds 64 characters
    /// - `DomainError::Validation` if it is not in normalized form
    pub fn new(tag: impl Into<String>) -> Result<Self, DomainError> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(DomainError::EmptyTag);
        }
        if tag.chars().count() > MAX_GAME_TAG_LENGTH {
            return Err(DomainError::TagTooLong {
                max: MAX_GAME_TAG_LENGTH,
            });
        }
        if normalize_str(&tag, None) != tag {
            return Err(DomainError::validation(format!(
                "Game tag is not normalized: {}",
                tag
            )));
        }
        Ok(Self(tag))
    }

    /// Returns the tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for GameTag {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<GameTag> for String {
    fn from(tag: GameTag) -> String {
        tag.0
    }
}
