use zavalinka_domain::{Player, PlayerState};

use super::{others, require_game, GameError, HandlerResult};
use crate::infrastructure::ports::GameSession;
use crate::use_cases::broadcast::Delivery;

/// Make the sender the host of their game.
///
/// The sender is marked host before the other players are read. If any of
/// them already holds the flag the handler fails and the session is rolled
/// back, so the speculative flag never reaches the store. The orchestrator
/// holds the game's lock for the session, which keeps two concurrent
/// attempts from both succeeding.
pub(crate) async fn take_host(session: &mut dyn GameSession, mut player: Player) -> HandlerResult {
    let game_id = require_game(&player)?;

    player.become_host()?;
    player.set_state(PlayerState::TypingProlog);

    let mut members = others(session.players_in_game(game_id).await?, player.id());
    if let Some(host) = members.iter().find(|p| p.is_host()) {
        tracing::warn!(
            player_id = %player.id(),
            host_id = %host.id(),
            game_id = %game_id,
            "Host already taken"
        );
        return Err(GameError::HostAlreadyTaken);
    }

    for member in &mut members {
        member.set_state(PlayerState::WaitingForHostToTypeProlog);
        session.save_player(member).await?;
    }
    session.save_player(&player).await?;

    tracing::info!(player_id = %player.id(), game_id = %game_id, "Host taken");

    let mut deliveries = vec![Delivery::new(
        player.id(),
        "You are the host! Please type the prolog: the opening lines of the poem",
    )];
    let notice = format!(
        "{} is the host now, please wait for the prolog",
        player.label()
    );
    deliveries.extend(members.iter().map(|p| Delivery::new(p.id(), notice.clone())));
    Ok(deliveries)
}
