use std::collections::VecDeque;

use dosealert_models::{
    chrono::Utc,
    notification::{Notification, NotificationId, Role},
};
use tokio::sync::{RwLock, broadcast};

const DEFAULT_HISTORY: usize = 200;
const CHANNEL_CAPACITY: usize = 64;

struct FeedState {
    next_id: NotificationId,
    history: VecDeque<Notification>,
}

/// Dashboard notifications: a bounded history plus a live broadcast to
/// subscribed dashboards.
///
/// The service only publishes. A dashboard embedding this crate reads the
/// feed through [`NotificationFeed::subscribe`] for live updates and
/// [`NotificationFeed::recent`] when it first loads.
pub struct NotificationFeed {
    state: RwLock<FeedState>,
    history_limit: usize,
    sender: broadcast::Sender<Notification>,
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY)
    }
}

impl NotificationFeed {
    pub fn new(history_limit: usize) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);

        Self {
            state: RwLock::new(FeedState {
                next_id: 1,
                history: VecDeque::new(),
            }),
            history_limit,
            sender,
        }
    }

    pub async fn publish(&self, role: Role, message: impl Into<String>) -> Notification {
        let mut state = self.state.write().await;
        let notification = Notification {
            id: state.next_id,
            role,
            message: message.into(),
            timestamp: Utc::now(),
        };
        state.next_id += 1;

        state.history.push_front(notification.clone());
        state.history.truncate(self.history_limit);

        // No live dashboards is not an error.
        if self.sender.send(notification.clone()).is_err() {
            log::debug!("No subscribers for notification {}", notification.id);
        }

        notification
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Stored notifications for a role, newest first.
    pub async fn recent(&self, role: Role) -> Vec<Notification> {
        self.state
            .read()
            .await
            .history
            .iter()
            .filter(|notification| notification.role == role)
            .cloned()
            .collect()
    }
}
