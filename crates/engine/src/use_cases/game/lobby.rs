//! Handlers that only move the sender between lobby states.

use zavalinka_domain::{Player, PlayerState};

use super::{GameError, HandlerResult};
use crate::infrastructure::ports::GameSession;
use crate::use_cases::broadcast::Delivery;

pub(crate) fn dont_understand(player: &Player) -> HandlerResult {
    Ok(vec![Delivery::new(player.id(), "I don't understand you")])
}

pub(crate) fn wait_for_host(player: &Player) -> HandlerResult {
    Ok(vec![Delivery::new(
        player.id(),
        "The host is writing the prolog, please wait",
    )])
}

pub(crate) fn wait_for_others(player: &Player) -> HandlerResult {
    Ok(vec![Delivery::new(player.id(), "Waiting for the other players")])
}

pub(crate) async fn init_create_game(
    session: &mut dyn GameSession,
    mut player: Player,
) -> HandlerResult {
    if player.game_id().is_some() {
        return Err(GameError::AlreadyInGame);
    }
    player.set_state(PlayerState::TypingTagForGameToCreate);
    session.save_player(&player).await?;
    Ok(vec![Delivery::new(player.id(), "Enter name for new game")])
}

pub(crate) async fn init_join_game(
    session: &mut dyn GameSession,
    mut player: Player,
) -> HandlerResult {
    if player.game_id().is_some() {
        return Err(GameError::AlreadyInGame);
    }
    player.set_state(PlayerState::TypingTagForGameToJoin);
    session.save_player(&player).await?;
    Ok(vec![Delivery::new(
        player.id(),
        "Enter name for the game to join",
    )])
}

pub(crate) async fn cancel(session: &mut dyn GameSession, mut player: Player) -> HandlerResult {
    player.set_state(PlayerState::Default);
    session.save_player(&player).await?;
    Ok(vec![Delivery::new(player.id(), "Cancelled")])
}
