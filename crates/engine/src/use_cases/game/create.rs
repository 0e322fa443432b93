use zavalinka_domain::{GameKind, GameTag, Player, PlayerState};

use super::{GameError, HandlerResult};
use crate::infrastructure::ports::GameSession;
use crate::use_cases::broadcast::Delivery;

/// Create a poetic game under the normalized tag and attach the sender.
pub(crate) async fn create_game(
    session: &mut dyn GameSession,
    mut player: Player,
    text: &str,
) -> HandlerResult {
    if player.game_id().is_some() {
        return Err(GameError::AlreadyInGame);
    }
    let tag = GameTag::normalize(text)?;

    let game = session
        .create_game(tag.clone(), GameKind::Poetic)
        .await
        .map_err(|e| {
            if e.is_duplicate() {
                GameError::DuplicateTag(tag.to_string())
            } else {
                e.into()
            }
        })?;

    player.join_game(game.id())?;
    player.set_state(PlayerState::WaitingForHostToAppear);
    session.save_player(&player).await?;

    tracing::info!(
        player_id = %player.id(),
        game_id = %game.id(),
        tag = %game.tag(),
        "Game created"
    );
    Ok(vec![Delivery::new(player.id(), "Successfully created!")])
}
