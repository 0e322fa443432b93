//! Outbound messaging port.

use async_trait::async_trait;
use zavalinka_domain::PlayerId;

use super::error::MessagingError;

/// Delivers one chat message to one player.
///
/// Replying to the sender is just `send_to(sender_id, ..)`. Implementations
/// must not retry internally; the broadcaster owns timeouts and reporting.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessengerPort: Send + Sync {
    async fn send_to(&self, recipient: PlayerId, text: &str) -> Result<(), MessagingError>;
}
