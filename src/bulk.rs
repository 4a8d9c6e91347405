//! Bulk operations over the current selection.

use std::time::Duration;

use tracing::{info, instrument, warn, Instrument};

use crate::cache::Pending;
use crate::clients::UserClient;
use crate::domain::User;
use crate::error::UserError;
use crate::notify::{Level, NoticeId, Notifier};

/// Dispatched bulk delete. Each record settles on its own.
#[derive(Debug)]
pub struct BulkDelete {
    pub pending: Vec<(String, Pending<()>)>,
    pub count: usize,
    pub notice: Option<NoticeId>,
}

impl BulkDelete {
    /// Wait for every delete, in dispatch order.
    pub async fn settle_all(self) -> Vec<(String, Result<(), UserError>)> {
        let mut outcomes = Vec::with_capacity(self.pending.len());
        for (id, pending) in self.pending {
            let outcome = pending.settled().await.map_err(UserError::from);
            outcomes.push((id, outcome));
        }
        outcomes
    }
}

#[derive(Clone)]
pub struct BulkActions {
    users: UserClient,
    notifier: Notifier,
    undo_window: Duration,
}

impl BulkActions {
    pub fn new(users: UserClient, notifier: Notifier, undo_window: Duration) -> Self {
        Self {
            users,
            notifier,
            undo_window,
        }
    }

    /// Deletes every selected user independently and posts one summary
    /// notice with an "Undo" action.
    ///
    /// Undo only runs `clear_selection`. Deleted records stay deleted.
    #[instrument(skip(self, users, clear_selection), fields(selected = selected.len()))]
    pub async fn bulk_delete(
        &self,
        users: &[User],
        selected: &[String],
        clear_selection: impl FnOnce() + Send + 'static,
    ) -> BulkDelete {
        let targets: Vec<&User> = users.iter().filter(|u| selected.contains(&u.id)).collect();
        if targets.is_empty() {
            info!("Nothing selected");
            return BulkDelete {
                pending: Vec::new(),
                count: 0,
                notice: None,
            };
        }

        let mut pending = Vec::with_capacity(targets.len());
        for user in targets {
            match self.users.delete_user(user.id.clone()).await {
                Ok(handle) => pending.push((user.id.clone(), handle)),
                Err(e) => warn!(id = %user.id, error = %e, "Delete not dispatched"),
            }
        }

        let count = pending.len();
        let signal = self.notifier.notify_with_action(
            Level::Info,
            format!("Deleted {} user(s)", count),
            "Undo",
            self.undo_window,
        );
        let notice = signal.notice();

        let notifier = self.notifier.clone();
        tokio::spawn(
            async move {
                if signal.wait().await {
                    clear_selection();
                    notifier.success("Undo successful");
                }
            }
            .in_current_span(),
        );

        info!(count, notice, "Bulk delete dispatched");
        BulkDelete {
            pending,
            count,
            notice: Some(notice),
        }
    }
}
