//! Application state and composition.

use std::sync::Arc;

use crate::api::ConnectionManager;
use crate::infrastructure::{config::AppConfig, ports::GameStore};
use crate::intent::{IntentError, MatcherKind};
use crate::use_cases::{Broadcaster, GameOrchestrator, SessionStateMachine};

/// Main application state.
///
/// Passed to HTTP/WebSocket handlers via Axum state.
pub struct App {
    pub orchestrator: Arc<GameOrchestrator>,
    pub connections: Arc<ConnectionManager>,
    pub intent_matcher: MatcherKind,
}

impl App {
    /// Wire the orchestrator to a store and to the live connections.
    ///
    /// Fails only if a state grammar cannot be compiled.
    pub fn new(
        store: Arc<dyn GameStore>,
        connections: Arc<ConnectionManager>,
        config: &AppConfig,
    ) -> Result<Self, IntentError> {
        let machine = SessionStateMachine::new(config.intent_matcher)?;
        let broadcaster = Broadcaster::new(connections.clone(), config.send_timeout);
        let orchestrator = GameOrchestrator::new(store, machine, broadcaster);

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            connections,
            intent_matcher: config.intent_matcher,
        })
    }
}
