//! Errors raised by game handlers.

use zavalinka_domain::DomainError;

use crate::infrastructure::ports::RepoError;
use crate::intent::IntentError;

const GENERIC_FAILURE: &str = "Something went wrong, please try again";

/// Why a handler refused or failed to act.
///
/// Every variant aborts the handler's session; nothing it wrote is committed.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Player is already in a game")]
    AlreadyInGame,

    #[error("Game tag is empty after normalization")]
    EmptyTag,

    #[error("Game tag exceeds {max} characters")]
    TagTooLong { max: usize },

    #[error("No game with tag {0}")]
    GameNotFound(String),

    #[error("Game tag {0} is already taken")]
    DuplicateTag(String),

    #[error("Game {0} has already started")]
    GameAlreadyStarted(String),

    #[error("Game already has a host")]
    HostAlreadyTaken,

    #[error("Only the host can do this")]
    NotHost,

    #[error("Text exceeds {max} characters")]
    TextTooLong { max: usize },

    #[error("Text is empty")]
    EmptyText,

    #[error("Invalid vote: {0}")]
    InvalidVote(String),

    #[error("Player voted for their own variant")]
    CannotVoteForSelf,

    #[error("Player is not in a game")]
    NotInGame,

    #[error("Domain error: {0}")]
    Domain(DomainError),

    #[error("Intent error: {0}")]
    Intent(#[from] IntentError),

    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

impl From<DomainError> for GameError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::EmptyTag => GameError::EmptyTag,
            DomainError::TagTooLong { max } => GameError::TagTooLong { max },
            DomainError::EmptyText => GameError::EmptyText,
            DomainError::TextTooLong { max } => GameError::TextTooLong { max },
            other => GameError::Domain(other),
        }
    }
}

impl GameError {
    /// The reply sent to the player whose message caused this error.
    pub fn user_message(&self) -> String {
        match self {
            GameError::AlreadyInGame => "You are already in game".into(),
            GameError::EmptyTag => "Please provide non-zero alphabetic tag for game".into(),
            GameError::TagTooLong { max } => {
                format!("Game tag is too long, use at most {} letters", max)
            }
            GameError::GameNotFound(_) => "There is no game with this tag".into(),
            GameError::DuplicateTag(_) => {
                "A game with this tag already exists, please choose another".into()
            }
            GameError::GameAlreadyStarted(_) => {
                "This game has already started, please join another one".into()
            }
            GameError::HostAlreadyTaken => "Someone else is already the host".into(),
            GameError::NotHost => "Only the host can do this".into(),
            GameError::TextTooLong { max } => {
                format!("Too long, please keep it within {} characters", max)
            }
            GameError::EmptyText => "Please send some text".into(),
            GameError::InvalidVote(_) => {
                "Please send the number of the variant you vote for".into()
            }
            GameError::CannotVoteForSelf => "You cannot vote for your own variant".into(),
            GameError::NotInGame => "You are not in a game".into(),
            GameError::Domain(_) | GameError::Intent(_) | GameError::Repo(_) => {
                GENERIC_FAILURE.into()
            }
        }
    }

    /// Lost a race against another player's concurrent message.
    pub fn is_race(&self) -> bool {
        matches!(
            self,
            GameError::HostAlreadyTaken | GameError::DuplicateTag(_)
        )
    }

    /// Infrastructure or programming fault rather than a user mistake.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            GameError::Domain(_) | GameError::Intent(_) | GameError::Repo(_)
        )
    }

    pub(crate) fn generic_message() -> &'static str {
        GENERIC_FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_keep_their_kind() {
        assert!(matches!(
            GameError::from(DomainError::EmptyTag),
            GameError::EmptyTag
        ));
        assert!(matches!(
            GameError::from(DomainError::TextTooLong { max: 300 }),
            GameError::TextTooLong { max: 300 }
        ));
        assert!(matches!(
            GameError::from(DomainError::constraint("nope")),
            GameError::Domain(_)
        ));
    }

    #[test]
    fn internal_errors_get_the_generic_reply() {
        let err = GameError::from(RepoError::database("commit", "disk full"));
        assert!(err.is_internal());
        assert_eq!(err.user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn user_errors_explain_themselves() {
        assert_eq!(
            GameError::EmptyTag.user_message(),
            "Please provide non-zero alphabetic tag for game"
        );
        assert_eq!(
            GameError::GameNotFound("poets".into()).user_message(),
            "There is no game with this tag"
        );
        assert!(GameError::HostAlreadyTaken.is_race());
        assert!(!GameError::EmptyText.is_internal());
    }
}
