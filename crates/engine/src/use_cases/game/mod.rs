//! Game handlers.
//!
//! Each handler runs inside the session the orchestrator opened for the
//! incoming message. Handlers write through the session and return the
//! messages to send; they never commit, roll back or deliver themselves. An
//! `Err` means the orchestrator rolls the whole session back.
//!
//! Handlers that act on the sender's game run with that game locked by the
//! orchestrator. `join_game` locks the game it joins itself.

mod create;
mod error;
mod host;
mod join;
mod leave;
mod lobby;
mod nickname;
mod prolog;
mod text;
mod voting;

pub use error::GameError;

pub(crate) use create::create_game;
pub(crate) use host::take_host;
pub(crate) use join::join_game;
pub(crate) use leave::leave_game;
pub(crate) use lobby::{
    cancel, dont_understand, init_create_game, init_join_game, wait_for_host, wait_for_others,
};
pub(crate) use nickname::{init_set_nickname, set_nickname};
pub(crate) use prolog::enter_prolog;
pub(crate) use text::submit_game_text;
pub(crate) use voting::cast_vote;

use zavalinka_domain::{GameId, Player, PlayerId};

use crate::use_cases::broadcast::Delivery;

/// What a handler hands back to the orchestrator.
pub type HandlerResult = Result<Vec<Delivery>, GameError>;

fn require_game(player: &Player) -> Result<GameId, GameError> {
    player.game_id().ok_or(GameError::NotInGame)
}

/// Everyone in `players` except `id`.
fn others(players: Vec<Player>, id: PlayerId) -> Vec<Player> {
    players.into_iter().filter(|p| p.id() != id).collect()
}
