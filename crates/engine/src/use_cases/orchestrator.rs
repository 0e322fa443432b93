//! Top-level dispatch for incoming chat messages.
//!
//! One message is one unit of work:
//!
//! 1. open a session on the store
//! 2. load the sender (first contact creates them and stops there)
//! 3. classify the text against the grammar of the sender's state
//! 4. unless the intent only replies, lock the sender's game and reload them
//! 5. run the handler for that intent
//! 6. commit on success, roll back on any error
//! 7. deliver the replies and notifications
//!
//! Only the game a message acts on is locked, so players of other games are
//! never held up. The session is closed before anything is sent, so no lock
//! is ever held across a slow delivery.

use std::sync::Arc;

use zavalinka_domain::{Player, PlayerId};

use crate::infrastructure::ports::{GameSession, GameStore, RepoError};
use crate::use_cases::broadcast::{Broadcaster, Delivery, DeliveryReport};
use crate::use_cases::game::{self, GameError, HandlerResult};
use crate::use_cases::session::{Intent, SessionStateMachine};

const GREETING: &str = "Hello, new user!";

/// The game orchestrator.
pub struct GameOrchestrator {
    store: Arc<dyn GameStore>,
    machine: SessionStateMachine,
    broadcaster: Broadcaster,
}

impl GameOrchestrator {
    pub fn new(
        store: Arc<dyn GameStore>,
        machine: SessionStateMachine,
        broadcaster: Broadcaster,
    ) -> Self {
        Self {
            store,
            machine,
            broadcaster,
        }
    }

    /// Handle one message from `sender` and deliver whatever it produced.
    ///
    /// Never fails: user mistakes and infrastructure faults both end in a
    /// reply to the sender. Delivery failures are reported, not raised.
    pub async fn handle_message(&self, sender: PlayerId, text: &str) -> DeliveryReport {
        let deliveries = self.process(sender, text).await;
        let report = self.broadcaster.dispatch(deliveries).await;
        if !report.is_complete() {
            tracing::warn!(
                player_id = %sender,
                failed = report.failed.len(),
                delivered = report.delivered.len(),
                "Some notifications were not delivered"
            );
        }
        report
    }

    async fn process(&self, sender: PlayerId, text: &str) -> Vec<Delivery> {
        let mut session = match self.store.begin().await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(player_id = %sender, error = %e, "Failed to open session");
                return vec![Delivery::new(sender, GameError::generic_message())];
            }
        };

        match self.run(session.as_mut(), sender, text).await {
            Ok(deliveries) => match session.commit().await {
                Ok(()) => deliveries,
                Err(e) => {
                    tracing::error!(player_id = %sender, error = %e, "Failed to commit session");
                    vec![Delivery::new(sender, GameError::generic_message())]
                }
            },
            Err(err) => {
                if let Err(e) = session.rollback().await {
                    tracing::error!(player_id = %sender, error = %e, "Failed to roll back session");
                }
                if err.is_internal() {
                    tracing::error!(player_id = %sender, error = %err, "Handler failed");
                } else if err.is_race() {
                    tracing::warn!(player_id = %sender, error = %err, "Lost a race");
                } else {
                    tracing::debug!(player_id = %sender, error = %err, "Rejected message");
                }
                vec![Delivery::new(sender, err.user_message())]
            }
        }
    }

    async fn run(
        &self,
        session: &mut dyn GameSession,
        sender: PlayerId,
        text: &str,
    ) -> HandlerResult {
        let player = match session.load_player(sender).await? {
            Some(player) => player,
            None => {
                session.create_player(sender).await?;
                tracing::info!(player_id = %sender, "New player");
                return Ok(vec![Delivery::new(sender, GREETING)]);
            }
        };

        let intent = self.machine.classify(player.state(), text)?;
        if intent.is_reply_only() {
            return dispatch(session, intent, player, text).await;
        }

        let Some(game_id) = player.game_id() else {
            return dispatch(session, intent, player, text).await;
        };
        // Another member may have moved us on before the lock was ours
        session.lock_game(game_id).await?;
        let fresh = session
            .load_player(sender)
            .await?
            .ok_or_else(|| RepoError::not_found("Player", sender))?;
        let intent = if fresh.state() == player.state() {
            intent
        } else {
            self.machine.classify(fresh.state(), text)?
        };
        dispatch(session, intent, fresh, text).await
    }
}

async fn dispatch(
    session: &mut dyn GameSession,
    intent: Intent,
    player: Player,
    text: &str,
) -> HandlerResult {
    match intent {
        Intent::DontUnderstand => game::dont_understand(&player),
        Intent::InitCreateGame => game::init_create_game(session, player).await,
        Intent::InitJoinGame => game::init_join_game(session, player).await,
        Intent::InitSetNickname => game::init_set_nickname(session, player).await,
        Intent::SetNickname => game::set_nickname(session, player, text).await,
        Intent::CreateGame => game::create_game(session, player, text).await,
        Intent::JoinGame => game::join_game(session, player, text).await,
        Intent::Cancel => game::cancel(session, player).await,
        Intent::TakeHost => game::take_host(session, player).await,
        Intent::LeaveGame => game::leave_game(session, player).await,
        Intent::WaitForHost => game::wait_for_host(&player),
        Intent::EnterProlog => game::enter_prolog(session, player, text).await,
        Intent::SubmitGameText => game::submit_game_text(session, player, text).await,
        Intent::WaitForOthers => game::wait_for_others(&player),
        Intent::CastVote => game::cast_vote(session, player, text).await,
    }
}
