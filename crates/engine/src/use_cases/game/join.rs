use zavalinka_domain::{GameTag, Player, PlayerState};

use super::{others, GameError, HandlerResult};
use crate::infrastructure::ports::GameSession;
use crate::use_cases::broadcast::Delivery;

/// Attach the sender to the game with the normalized tag.
///
/// A game whose host is already chosen is closed to newcomers: they would
/// have no prolog to respond to and would stall the vote.
pub(crate) async fn join_game(
    session: &mut dyn GameSession,
    mut player: Player,
    text: &str,
) -> HandlerResult {
    if player.game_id().is_some() {
        return Err(GameError::AlreadyInGame);
    }
    let tag = GameTag::normalize(text)?;

    let game = session
        .load_game_by_tag(&tag)
        .await?
        .ok_or_else(|| GameError::GameNotFound(tag.to_string()))?;
    session.lock_game(game.id()).await?;
    // The last member may have left and reaped the game meanwhile
    if session.load_game(game.id()).await?.is_none() {
        return Err(GameError::GameNotFound(tag.to_string()));
    }

    let members = others(session.players_in_game(game.id()).await?, player.id());
    if members.iter().any(|p| p.is_host()) {
        return Err(GameError::GameAlreadyStarted(tag.to_string()));
    }

    player.join_game(game.id())?;
    player.set_state(PlayerState::WaitingForHostToAppear);
    session.save_player(&player).await?;

    tracing::info!(
        player_id = %player.id(),
        game_id = %game.id(),
        tag = %game.tag(),
        "Player joined game"
    );

    let mut deliveries = vec![Delivery::new(player.id(), "Successfully joined!")];
    let notice = format!("{} joined the game", player.label());
    deliveries.extend(members.iter().map(|p| Delivery::new(p.id(), notice.clone())));
    Ok(deliveries)
}
