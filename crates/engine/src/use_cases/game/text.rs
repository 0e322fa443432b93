use zavalinka_domain::{GameText, Player, PlayerState};

use super::{require_game, voting, GameError, HandlerResult};
use crate::infrastructure::ports::GameSession;
use crate::use_cases::broadcast::Delivery;

/// Store the sender's variant; the last one in starts the vote.
pub(crate) async fn submit_game_text(
    session: &mut dyn GameSession,
    mut player: Player,
    text: &str,
) -> HandlerResult {
    let game_id = require_game(&player)?;
    let text = GameText::new(text)?;

    session.save_player_text(player.id(), Some(&text)).await?;
    player.set_state(PlayerState::WaitingForVotingFinish);
    session.save_player(&player).await?;

    let players = session.players_in_game(game_id).await?;
    let texts = session.player_texts(game_id).await?;
    if texts.len() < players.len() {
        tracing::debug!(
            player_id = %player.id(),
            game_id = %game_id,
            submitted = texts.len(),
            total = players.len(),
            "Variant stored"
        );
        return Ok(vec![Delivery::new(
            player.id(),
            "Your variant is saved, waiting for the other players",
        )]);
    }

    let game = session
        .load_game(game_id)
        .await?
        .ok_or_else(|| GameError::GameNotFound(game_id.to_string()))?;
    voting::start_voting(session, &game, players, texts).await
}
