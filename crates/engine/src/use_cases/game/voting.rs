//! Ballots, votes and results.

use sha2::{Digest, Sha256};
use zavalinka_domain::{Game, GameId, GameText, Player, PlayerId, PlayerState};

use super::{require_game, GameError, HandlerResult};
use crate::infrastructure::ports::GameSession;
use crate::use_cases::broadcast::Delivery;

/// Variants in the order they are shown on the ballot.
///
/// The order is a hash of game and author, so it is stable for the whole
/// vote but says nothing about who wrote what.
pub(crate) fn ballot(
    game_id: GameId,
    mut texts: Vec<(PlayerId, GameText)>,
) -> Vec<(PlayerId, GameText)> {
    texts.sort_by_cached_key(|(author, _)| ballot_key(game_id, *author));
    texts
}

fn ballot_key(game_id: GameId, author: PlayerId) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(game_id.as_uuid().as_bytes());
    hasher.update(author.get().to_be_bytes());
    hasher.finalize().to_vec()
}

fn render_ballot(ballot: &[(PlayerId, GameText)]) -> String {
    ballot
        .iter()
        .enumerate()
        .map(|(i, (_, text))| format!("{}. {}", i + 1, text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// First run of ASCII digits in `text`, as a 1-based ballot position.
fn parse_choice(text: &str) -> Option<usize> {
    text.split(|c: char| !c.is_ascii_digit())
        .find(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

/// Move every non-host into `Voting` and hand out the ballot.
pub(crate) async fn start_voting(
    session: &mut dyn GameSession,
    game: &Game,
    players: Vec<Player>,
    texts: Vec<(PlayerId, GameText)>,
) -> HandlerResult {
    let (hosts, mut voters): (Vec<Player>, Vec<Player>) =
        players.into_iter().partition(|p| p.is_host());

    if voters.is_empty() {
        tracing::info!(game_id = %game.id(), "No one to vote, finishing game");
        return finish_game(session, game, hosts).await;
    }

    let ballot = ballot(game.id(), texts);
    let prolog = game.prolog().map(|p| p.to_string()).unwrap_or_default();
    let invitation = format!(
        "Voting time!\n\n{}\n\n{}\n\nSend the number of the variant you believe is the true ending",
        prolog,
        render_ballot(&ballot)
    );

    for voter in &mut voters {
        voter.set_state(PlayerState::Voting);
        session.save_player(voter).await?;
    }

    tracing::info!(
        game_id = %game.id(),
        voters = voters.len(),
        "Voting started"
    );

    let mut deliveries: Vec<Delivery> = hosts
        .iter()
        .map(|h| Delivery::new(h.id(), "All variants are in, voting has started"))
        .collect();
    deliveries.extend(voters.iter().map(|v| Delivery::new(v.id(), invitation.clone())));
    Ok(deliveries)
}

/// Record the sender's vote; the last vote in finishes the game.
pub(crate) async fn cast_vote(
    session: &mut dyn GameSession,
    mut player: Player,
    text: &str,
) -> HandlerResult {
    let game_id = require_game(&player)?;
    let texts = session.player_texts(game_id).await?;
    let ballot = ballot(game_id, texts);

    let choice = parse_choice(text)
        .filter(|n| (1..=ballot.len()).contains(n))
        .ok_or_else(|| GameError::InvalidVote(text.trim().to_string()))?;
    let (author, _) = &ballot[choice - 1];
    if *author == player.id() {
        return Err(GameError::CannotVoteForSelf);
    }

    let target = session
        .load_player(*author)
        .await?
        .ok_or_else(|| GameError::InvalidVote(format!("author {} is gone", author)))?;
    player.vote_for(&target)?;
    player.set_state(PlayerState::WaitingForVotingFinish);
    session.save_player(&player).await?;

    tracing::debug!(player_id = %player.id(), game_id = %game_id, choice, "Vote cast");

    let players = session.players_in_game(game_id).await?;
    let all_voted = players
        .iter()
        .filter(|p| !p.is_host())
        .all(|p| p.for_whom_votes().is_some());
    if !all_voted {
        return Ok(vec![Delivery::new(
            player.id(),
            "Your vote is counted, waiting for the other players",
        )]);
    }

    let game = session
        .load_game(game_id)
        .await?
        .ok_or_else(|| GameError::GameNotFound(game_id.to_string()))?;
    finish_game(session, &game, players).await
}

/// Announce results, detach everyone and delete the game.
async fn finish_game(
    session: &mut dyn GameSession,
    game: &Game,
    players: Vec<Player>,
) -> HandlerResult {
    let ballot = ballot(game.id(), session.player_texts(game.id()).await?);

    let mut lines = vec!["Voting is over!".to_string()];
    if let Some(prolog) = game.prolog() {
        lines.push(format!("\n{}\n", prolog));
    }
    for (i, (author, text)) in ballot.iter().enumerate() {
        let Some(writer) = players.iter().find(|p| p.id() == *author) else {
            continue;
        };
        let votes = session
            .voters_for(*author)
            .await?
            .iter()
            .filter(|v| v.game_id() == Some(game.id()))
            .count();
        let marker = if writer.is_host() { " - the true ending" } else { "" };
        lines.push(format!(
            "{}. {} (by {}, votes: {}){}",
            i + 1,
            text,
            writer.label(),
            votes,
            marker
        ));
    }
    let results = lines.join("\n");

    for mut player in players.iter().cloned() {
        player.leave_game();
        session.save_player(&player).await?;
        session.save_player_text(player.id(), None).await?;
    }
    session.delete_game(game.id()).await?;

    tracing::info!(game_id = %game.id(), tag = %game.tag(), "Game finished");

    Ok(players
        .iter()
        .map(|p| Delivery::new(p.id(), results.clone()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> GameText {
        GameText::new(s).expect("text")
    }

    #[test]
    fn ballot_order_is_stable_per_game() {
        let game = GameId::new();
        let texts: Vec<_> = (1..=5)
            .map(|i| (PlayerId::new(i), text(&format!("variant {}", i))))
            .collect();

        let first = ballot(game, texts.clone());
        let mut reversed = texts.clone();
        reversed.reverse();
        assert_eq!(ballot(game, reversed), first);
        assert_eq!(first.len(), 5);
    }

    #[test]
    fn choice_is_the_first_number() {
        assert_eq!(parse_choice("2"), Some(2));
        assert_eq!(parse_choice("I vote for 3, not 1"), Some(3));
        assert_eq!(parse_choice("number two"), None);
        assert_eq!(parse_choice(""), None);
    }
}
