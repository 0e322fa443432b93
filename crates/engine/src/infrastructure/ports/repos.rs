//! Repository port traits for game and player persistence.
//!
//! Every handler runs inside exactly one [`GameSession`]. The session is the
//! transaction: writes become visible on [`GameSession::commit`], and
//! dropping an uncommitted session discards them.
//!
//! Opening a session takes no lock. A handler that reads a game's player set
//! and then writes based on it calls [`GameSession::lock_game`] first; reads
//! made after the lock see every committed write to that game.

use async_trait::async_trait;
use zavalinka_domain::{Game, GameId, GameKind, GameTag, GameText, Player, PlayerId};

use super::error::RepoError;

// =============================================================================
// Store
// =============================================================================

#[async_trait]
pub trait GameStore: Send + Sync {
    /// Open a unit of work.
    async fn begin(&self) -> Result<Box<dyn GameSession>, RepoError>;
}

// =============================================================================
// Session (one transaction)
// =============================================================================

#[async_trait]
pub trait GameSession: Send {
    /// Serialize this session against every other session that locks the
    /// same game, until commit or rollback.
    ///
    /// This is what makes "check nobody else is host, then become host"
    /// atomic. Sessions that neither lock nor write are never held up. A
    /// store may serialize writers more coarsely than per game.
    async fn lock_game(&mut self, id: GameId) -> Result<(), RepoError>;

    // Players
    async fn load_player(&mut self, id: PlayerId) -> Result<Option<Player>, RepoError>;
    /// Create the player if absent; returns the stored row either way.
    async fn create_player(&mut self, id: PlayerId) -> Result<Player, RepoError>;
    async fn save_player(&mut self, player: &Player) -> Result<(), RepoError>;
    /// All players whose `game_id` is this game, ordered by id.
    async fn players_in_game(&mut self, game_id: GameId) -> Result<Vec<Player>, RepoError>;
    /// Players whose vote targets `id` (the derived "voted by" relation).
    async fn voters_for(&mut self, id: PlayerId) -> Result<Vec<Player>, RepoError>;

    // Deferred player text
    async fn save_player_text(
        &mut self,
        id: PlayerId,
        text: Option<&GameText>,
    ) -> Result<(), RepoError>;
    /// Texts submitted by players of this game, ordered by player id.
    async fn player_texts(&mut self, game_id: GameId)
        -> Result<Vec<(PlayerId, GameText)>, RepoError>;

    // Games
    async fn load_game(&mut self, id: GameId) -> Result<Option<Game>, RepoError>;
    async fn load_game_by_tag(&mut self, tag: &GameTag) -> Result<Option<Game>, RepoError>;
    /// Fails with [`RepoError::Duplicate`] if the tag is taken.
    async fn create_game(&mut self, tag: GameTag, kind: GameKind) -> Result<Game, RepoError>;
    async fn save_game(&mut self, game: &Game) -> Result<(), RepoError>;
    async fn delete_game(&mut self, id: GameId) -> Result<(), RepoError>;

    // Transaction boundary
    async fn commit(self: Box<Self>) -> Result<(), RepoError>;
    async fn rollback(self: Box<Self>) -> Result<(), RepoError>;
}
