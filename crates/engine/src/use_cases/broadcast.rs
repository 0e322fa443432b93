//! Concurrent fan-out of chat messages.
//!
//! Every delivery runs as its own task with its own timeout. Outcomes are
//! collected per recipient; a failed or hung recipient never holds up or
//! cancels the others, and never fails the handler that produced the message.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use zavalinka_domain::PlayerId;

use crate::infrastructure::ports::{MessagingError, MessengerPort};

/// One outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub recipient: PlayerId,
    pub text: String,
}

impl Delivery {
    pub fn new(recipient: PlayerId, text: impl Into<String>) -> Self {
        Self {
            recipient,
            text: text.into(),
        }
    }
}

/// Per-recipient outcome of one fan-out, in submission order.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    pub delivered: Vec<PlayerId>,
    pub failed: Vec<(PlayerId, MessagingError)>,
}

impl DeliveryReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The broadcast coordinator.
pub struct Broadcaster {
    messenger: Arc<dyn MessengerPort>,
    send_timeout: Duration,
}

impl Broadcaster {
    pub fn new(messenger: Arc<dyn MessengerPort>, send_timeout: Duration) -> Self {
        Self {
            messenger,
            send_timeout,
        }
    }

    pub async fn dispatch(&self, deliveries: Vec<Delivery>) -> DeliveryReport {
        let tasks = deliveries.into_iter().map(|delivery| {
            let messenger = self.messenger.clone();
            let send_timeout = self.send_timeout;
            let recipient = delivery.recipient;
            let handle = tokio::spawn(async move {
                match tokio::time::timeout(
                    send_timeout,
                    messenger.send_to(delivery.recipient, &delivery.text),
                )
                .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(MessagingError::Timeout(format!(
                        "no acknowledgement within {}ms",
                        send_timeout.as_millis()
                    ))),
                }
            });
            async move {
                let outcome = handle
                    .await
                    .unwrap_or_else(|e| Err(MessagingError::Transport(e.to_string())));
                (recipient, outcome)
            }
        });

        let mut report = DeliveryReport::default();
        for (recipient, outcome) in join_all(tasks).await {
            match outcome {
                Ok(()) => report.delivered.push(recipient),
                Err(e) => {
                    tracing::warn!(
                        recipient = %recipient,
                        error = %e,
                        "Failed to deliver message"
                    );
                    report.failed.push((recipient, e));
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockMessengerPort;
    use crate::test_fixtures::RecordingMessenger;

    fn ids(report: &DeliveryReport) -> (Vec<i64>, Vec<i64>) {
        (
            report.delivered.iter().map(|id| id.get()).collect(),
            report.failed.iter().map(|(id, _)| id.get()).collect(),
        )
    }

    #[tokio::test]
    async fn every_recipient_gets_their_own_text() {
        let messenger = RecordingMessenger::new();
        let broadcaster = Broadcaster::new(messenger.clone(), Duration::from_secs(1));

        let report = broadcaster
            .dispatch(vec![
                Delivery::new(PlayerId::new(1), "you are the host"),
                Delivery::new(PlayerId::new(2), "wait for the prolog"),
            ])
            .await;

        assert!(report.is_complete());
        assert_eq!(messenger.inbox(PlayerId::new(1)), vec!["you are the host"]);
        assert_eq!(messenger.inbox(PlayerId::new(2)), vec!["wait for the prolog"]);
    }

    #[tokio::test]
    async fn one_failure_does_not_block_the_rest() {
        let mut mock = MockMessengerPort::new();
        mock.expect_send_to().times(4).returning(|recipient, _| {
            if recipient == PlayerId::new(3) {
                Err(MessagingError::RecipientUnavailable(recipient.to_string()))
            } else {
                Ok(())
            }
        });
        let broadcaster = Broadcaster::new(Arc::new(mock), Duration::from_secs(1));

        let report = broadcaster
            .dispatch(
                (1..=4)
                    .map(|id| Delivery::new(PlayerId::new(id), "hi"))
                    .collect(),
            )
            .await;

        assert_eq!(ids(&report), (vec![1, 2, 4], vec![3]));
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn hung_recipient_times_out_alone() {
        let messenger = RecordingMessenger::new();
        messenger.make_slow(PlayerId::new(2));
        let broadcaster = Broadcaster::new(messenger.clone(), Duration::from_millis(50));

        let report = broadcaster
            .dispatch(vec![
                Delivery::new(PlayerId::new(1), "a"),
                Delivery::new(PlayerId::new(2), "b"),
                Delivery::new(PlayerId::new(3), "c"),
            ])
            .await;

        assert_eq!(ids(&report), (vec![1, 3], vec![2]));
        assert!(matches!(report.failed[0].1, MessagingError::Timeout(_)));
        assert_eq!(messenger.inbox(PlayerId::new(3)), vec!["c"]);
    }

    #[tokio::test]
    async fn empty_fan_out_is_a_complete_report() {
        let broadcaster = Broadcaster::new(RecordingMessenger::new(), Duration::from_secs(1));
        let report = broadcaster.dispatch(Vec::new()).await;
        assert!(report.is_complete());
        assert!(report.delivered.is_empty());
    }
}
