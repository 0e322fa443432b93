use zavalinka_domain::{Player, PlayerState, Prolog};

use super::{others, require_game, GameError, HandlerResult};
use crate::infrastructure::ports::GameSession;
use crate::use_cases::broadcast::Delivery;

/// Store the host's prolog and open the writing round for everyone.
pub(crate) async fn enter_prolog(
    session: &mut dyn GameSession,
    mut player: Player,
    text: &str,
) -> HandlerResult {
    let game_id = require_game(&player)?;
    if !player.is_host() {
        return Err(GameError::NotHost);
    }
    let prolog = Prolog::new(text)?;

    let mut game = session
        .load_game(game_id)
        .await?
        .ok_or_else(|| GameError::GameNotFound(game_id.to_string()))?;
    game.set_prolog(prolog.clone());
    player.set_state(PlayerState::TypingGameText);

    let mut members = others(session.players_in_game(game_id).await?, player.id());
    if members.iter().any(|p| p.is_host()) {
        tracing::warn!(
            player_id = %player.id(),
            game_id = %game_id,
            "Second host found while entering prolog"
        );
        return Err(GameError::HostAlreadyTaken);
    }

    for member in &mut members {
        member.set_state(PlayerState::TypingGameText);
        session.save_player(member).await?;
    }
    session.save_player(&player).await?;
    session.save_game(&game).await?;

    tracing::info!(player_id = %player.id(), game_id = %game_id, "Prolog entered");

    let mut deliveries = vec![Delivery::new(
        player.id(),
        "Prolog saved. Now type the true ending of the poem",
    )];
    let instruction = format!(
        "The prolog is:\n\n{}\n\nType your variant of the ending",
        prolog
    );
    deliveries.extend(
        members
            .iter()
            .map(|p| Delivery::new(p.id(), instruction.clone())),
    );
    Ok(deliveries)
}
