use zavalinka_domain::{Nickname, Player, PlayerState};

use super::HandlerResult;
use crate::infrastructure::ports::GameSession;
use crate::use_cases::broadcast::Delivery;

pub(crate) async fn init_set_nickname(
    session: &mut dyn GameSession,
    mut player: Player,
) -> HandlerResult {
    player.set_state(PlayerState::TypingNickname);
    session.save_player(&player).await?;
    Ok(vec![Delivery::new(player.id(), "Enter your nickname")])
}

pub(crate) async fn set_nickname(
    session: &mut dyn GameSession,
    mut player: Player,
    text: &str,
) -> HandlerResult {
    let nickname = Nickname::new(text)?;
    player.set_nickname(nickname);
    player.set_state(PlayerState::Default);
    session.save_player(&player).await?;

    tracing::info!(player_id = %player.id(), nickname = %player.label(), "Nickname set");
    Ok(vec![Delivery::new(
        player.id(),
        format!("Nice to meet you, {}!", player.label()),
    )])
}
