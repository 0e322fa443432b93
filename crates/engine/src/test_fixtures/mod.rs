//! Shared test doubles for engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use zavalinka_domain::PlayerId;

use crate::infrastructure::clock::FixedClock;
use crate::infrastructure::memory::MemoryGameStore;
use crate::infrastructure::ports::{MessagingError, MessengerPort};

/// Fresh in-memory store with a fixed clock.
pub fn memory_store() -> Arc<MemoryGameStore> {
    let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    Arc::new(MemoryGameStore::new(Arc::new(FixedClock(now))))
}

/// Messenger that records every delivery in an inbox per recipient.
///
/// Recipients marked unreachable fail with `RecipientUnavailable`; recipients
/// marked slow never answer within any sane timeout.
#[derive(Default)]
pub struct RecordingMessenger {
    inboxes: Mutex<HashMap<PlayerId, Vec<String>>>,
    unreachable: Mutex<HashSet<PlayerId>>,
    slow: Mutex<HashSet<PlayerId>>,
}

impl RecordingMessenger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn make_unreachable(&self, id: PlayerId) {
        self.unreachable.lock().unwrap().insert(id);
    }

    pub fn make_slow(&self, id: PlayerId) {
        self.slow.lock().unwrap().insert(id);
    }

    /// Everything `id` has received so far, oldest first.
    pub fn inbox(&self, id: PlayerId) -> Vec<String> {
        self.inboxes
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    /// The most recent message `id` received.
    pub fn last(&self, id: PlayerId) -> Option<String> {
        self.inbox(id).pop()
    }

    pub fn clear(&self) {
        self.inboxes.lock().unwrap().clear();
    }
}

#[async_trait]
impl MessengerPort for RecordingMessenger {
    async fn send_to(&self, recipient: PlayerId, text: &str) -> Result<(), MessagingError> {
        if self.unreachable.lock().unwrap().contains(&recipient) {
            return Err(MessagingError::RecipientUnavailable(recipient.to_string()));
        }
        let slow = self.slow.lock().unwrap().contains(&recipient);
        if slow {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        self.inboxes
            .lock()
            .unwrap()
            .entry(recipient)
            .or_default()
            .push(text.to_string());
        Ok(())
    }
}
