use zavalinka_domain::Player;

use super::{require_game, HandlerResult};
use crate::infrastructure::ports::GameSession;
use crate::use_cases::broadcast::Delivery;

/// Detach the sender; the game is deleted once nobody is left in it.
pub(crate) async fn leave_game(
    session: &mut dyn GameSession,
    mut player: Player,
) -> HandlerResult {
    let game_id = require_game(&player)?;

    player.leave_game();
    session.save_player(&player).await?;
    session.save_player_text(player.id(), None).await?;

    let remaining = session.players_in_game(game_id).await?;
    if remaining.is_empty() {
        session.delete_game(game_id).await?;
        tracing::info!(game_id = %game_id, "Deleted empty game");
    }

    tracing::info!(player_id = %player.id(), game_id = %game_id, "Player left game");

    let mut deliveries = vec![Delivery::new(player.id(), "You left the game")];
    let notice = format!("{} left the game", player.label());
    deliveries.extend(remaining.iter().map(|p| Delivery::new(p.id(), notice.clone())));
    Ok(deliveries)
}
