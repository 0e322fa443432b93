//! Player entity - one per chat identity
//!
//! A player is created on first contact and carries the session state that
//! decides which commands are currently legal for them.
//!
//! The player's submitted game text is not a field here: it is
//! only needed when voting starts, so the store exposes it through dedicated
//! queries instead of loading it on every message.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::value_objects::Nickname;
use zavalinka_domain::{GameId, PlayerId};

/// Where a player is in the conversation with the bot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    #[default]
    Default,
    TypingNickname,
    TypingTagForGameToCreate,
    TypingTagForGameToJoin,
    WaitingForHostToAppear,
    WaitingForHostToTypeProlog,
    TypingProlog,
    TypingGameText,
    WaitingForVotingFinish,
    Voting,
}

impl PlayerState {
    /// Every state, in declaration order.
    pub const ALL: [PlayerState; 10] = [
        PlayerState::Default,
        PlayerState::TypingNickname,
        PlayerState::TypingTagForGameToCreate,
        PlayerState::TypingTagForGameToJoin,
        PlayerState::WaitingForHostToAppear,
        PlayerState::WaitingForHostToTypeProlog,
        PlayerState::TypingProlog,
        PlayerState::TypingGameText,
        PlayerState::WaitingForVotingFinish,
        PlayerState::Voting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerState::Default => "default",
            PlayerState::TypingNickname => "typing_nickname",
            PlayerState::TypingTagForGameToCreate => "typing_tag_for_game_to_create",
            PlayerState::TypingTagForGameToJoin => "typing_tag_for_game_to_join",
            PlayerState::WaitingForHostToAppear => "waiting_for_host_to_appear",
            PlayerState::WaitingForHostToTypeProlog => "waiting_for_host_to_type_prolog",
            PlayerState::TypingProlog => "typing_prolog",
            PlayerState::TypingGameText => "typing_game_text",
            PlayerState::WaitingForVotingFinish => "waiting_for_voting_finish",
            PlayerState::Voting => "voting",
        }
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayerState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlayerState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| DomainError::parse(format!("Unknown player state: {}", s)))
    }
}

/// A chat participant.
///
/// # Invariants
///
/// - `is_host` implies `game_id` is set (enforced by `become_host`)
/// - `for_whom_votes`, if set, names another player of the same game
///   (enforced by `vote_for`)
/// - at most one host per game is a cross-player invariant; the engine keeps
///   it by checking the game's other players inside one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    id: PlayerId,
    nickname: Option<Nickname>,
    game_id: Option<GameId>,
    is_host: bool,
    for_whom_votes: Option<PlayerId>,
    state: PlayerState,
}

impl Player {
    // =========================================================================
    // Constructor
    // =========================================================================

    /// A freshly seen player: no game, no nickname, `Default` state.
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            nickname: None,
            game_id: None,
            is_host: false,
            for_whom_votes: None,
            state: PlayerState::Default,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> PlayerId {
        self.id
    }

    #[inline]
    pub fn nickname(&self) -> Option<&Nickname> {
        self.nickname.as_ref()
    }

    #[inline]
    pub fn game_id(&self) -> Option<GameId> {
        self.game_id
    }

    #[inline]
    pub fn is_host(&self) -> bool {
        self.is_host
    }

    #[inline]
    pub fn for_whom_votes(&self) -> Option<PlayerId> {
        self.for_whom_votes
    }

    #[inline]
    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// How the player is named in messages to others.
    pub fn label(&self) -> String {
        match &self.nickname {
            Some(nickname) => nickname.to_string(),
            None => format!("player {}", self.id),
        }
    }

    // =========================================================================
    // Builder Methods (used when loading from storage)
    // =========================================================================

    pub fn with_nickname(mut self, nickname: Option<Nickname>) -> Self {
        self.nickname = nickname;
        self
    }

    pub fn with_game(mut self, game_id: Option<GameId>, is_host: bool) -> Self {
        self.game_id = game_id;
        self.is_host = is_host && game_id.is_some();
        self
    }

    pub fn with_vote(mut self, for_whom_votes: Option<PlayerId>) -> Self {
        self.for_whom_votes = for_whom_votes;
        self
    }

    pub fn with_state(mut self, state: PlayerState) -> Self {
        self.state = state;
        self
    }

    // =========================================================================
    // Mutation Methods
    // =========================================================================

    pub fn set_state(&mut self, state: PlayerState) {
        self.state = state;
    }

    pub fn set_nickname(&mut self, nickname: Nickname) {
        self.nickname = Some(nickname);
    }

    /// Attach the player to a game.
    ///
    /// # Errors
    ///
    /// `DomainError::Constraint` if the player already belongs to a game.
    pub fn join_game(&mut self, game_id: GameId) -> Result<(), DomainError> {
        if self.game_id.is_some() {
            return Err(DomainError::constraint("player is already in a game"));
        }
        self.game_id = Some(game_id);
        self.is_host = false;
        self.for_whom_votes = None;
        Ok(())
    }

    /// Mark the player as the host of their game.
    ///
    /// # Errors
    ///
    /// `DomainError::Constraint` if the player is not in a game.
    pub fn become_host(&mut self) -> Result<(), DomainError> {
        if self.game_id.is_none() {
            return Err(DomainError::constraint("only a player in a game can host"));
        }
        self.is_host = true;
        Ok(())
    }

    /// Vote for another player's text.
    ///
    /// # Errors
    ///
    /// `DomainError::Constraint` if the target is this player or plays a
    /// different game.
    pub fn vote_for(&mut self, target: &Player) -> Result<(), DomainError> {
        if target.id == self.id {
            return Err(DomainError::constraint("a player cannot vote for themselves"));
        }
        if self.game_id.is_none() || target.game_id != self.game_id {
            return Err(DomainError::constraint(
                "vote target must be in the same game",
            ));
        }
        self.for_whom_votes = Some(target.id);
        Ok(())
    }

    /// Detach from the current game, dropping host flag and vote.
    pub fn leave_game(&mut self) {
        self.game_id = None;
        self.is_host = false;
        self.for_whom_votes = None;
        self.state = PlayerState::Default;
    }
}
