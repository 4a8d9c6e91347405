//! User-facing notifications ("toasts").
//!
//! Rendering is someone else's job; this module only publishes notices on a
//! broadcast channel and tracks time-boxed actions attached to them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info, warn};

pub type NoticeId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeAction {
    pub label: String,
    pub expires_in: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: NoticeId,
    pub level: Level,
    pub message: String,
    pub action: Option<NoticeAction>,
}

type PendingActions = Arc<Mutex<HashMap<NoticeId, oneshot::Sender<()>>>>;

fn lock(actions: &PendingActions) -> MutexGuard<'_, HashMap<NoticeId, oneshot::Sender<()>>> {
    actions.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notice>,
    next_id: Arc<AtomicU64>,
    actions: PendingActions,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            next_id: Arc::new(AtomicU64::new(1)),
            actions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    pub fn success(&self, message: impl Into<String>) -> NoticeId {
        self.publish(Level::Success, message.into(), None)
    }

    pub fn error(&self, message: impl Into<String>) -> NoticeId {
        self.publish(Level::Error, message.into(), None)
    }

    /// Publish a notice whose action can be triggered until `window` elapses.
    pub fn notify_with_action(
        &self,
        level: Level,
        message: impl Into<String>,
        label: impl Into<String>,
        window: Duration,
    ) -> ActionSignal {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (fired_tx, fired) = oneshot::channel();
        // registered before publishing so a fast subscriber can trigger it
        lock(&self.actions).insert(id, fired_tx);

        let action = NoticeAction {
            label: label.into(),
            expires_in: window,
        };
        self.send(Notice {
            id,
            level,
            message: message.into(),
            action: Some(action),
        });

        ActionSignal {
            notice: id,
            fired,
            window,
            actions: Arc::clone(&self.actions),
        }
    }

    /// Fire the action attached to `notice`. False if unknown or expired.
    pub fn trigger(&self, notice: NoticeId) -> bool {
        match lock(&self.actions).remove(&notice) {
            Some(fired) => fired.send(()).is_ok(),
            None => {
                debug!(notice, "Action trigger for expired or unknown notice");
                false
            }
        }
    }

    fn publish(&self, level: Level, message: String, action: Option<NoticeAction>) -> NoticeId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.send(Notice {
            id,
            level,
            message,
            action,
        });
        id
    }

    fn send(&self, notice: Notice) {
        match notice.level {
            Level::Error => warn!(notice = notice.id, text = %notice.message, "Notice"),
            Level::Info | Level::Success => info!(notice = notice.id, text = %notice.message, "Notice"),
        }
        // no subscribers is fine
        let _ = self.tx.send(notice);
    }
}

/// Resolves when the attached action fires or its window closes.
pub struct ActionSignal {
    notice: NoticeId,
    fired: oneshot::Receiver<()>,
    window: Duration,
    actions: PendingActions,
}

impl ActionSignal {
    pub fn notice(&self) -> NoticeId {
        self.notice
    }

    /// True if the action was triggered within the window.
    pub async fn wait(self) -> bool {
        let fired = matches!(tokio::time::timeout(self.window, self.fired).await, Ok(Ok(())));
        if !fired {
            lock(&self.actions).remove(&self.notice);
            debug!(notice = self.notice, "Action window closed");
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notices_reach_subscribers_in_order() {
        let notifier = Notifier::new(8);
        let mut rx = notifier.subscribe();

        let first = notifier.success("User created");
        let second = notifier.error("Delete failed, rolled back: boom");

        let a = rx.recv().await.unwrap();
        let b = rx.recv().await.unwrap();
        assert_eq!((a.id, a.level, a.message.as_str()), (first, Level::Success, "User created"));
        assert_eq!((b.id, b.level), (second, Level::Error));
        assert!(a.action.is_none());
    }

    #[tokio::test]
    async fn action_fires_within_window() {
        let notifier = Notifier::new(8);
        let signal = notifier.notify_with_action(Level::Info, "Deleted 2 user(s)", "Undo", Duration::from_secs(5));
        let notice = signal.notice();

        assert!(notifier.trigger(notice));
        assert!(signal.wait().await);
        assert!(!notifier.trigger(notice), "actions fire at most once");
    }

    #[tokio::test(start_paused = true)]
    async fn action_expires_after_window() {
        let notifier = Notifier::new(8);
        let signal = notifier.notify_with_action(Level::Info, "Deleted 1 user(s)", "Undo", Duration::from_secs(5));
        let notice = signal.notice();

        assert!(!signal.wait().await);
        assert!(!notifier.trigger(notice));
    }
}
