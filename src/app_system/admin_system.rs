use std::sync::Arc;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};

use super::AdminConfig;
use crate::api::{RemoteResource, UserApi};
use crate::bulk::BulkActions;
use crate::cache::{CacheActor, CacheEvent};
use crate::clients::UserClient;
use crate::domain::User;
use crate::notify::Notifier;
use crate::selection::SelectionHandle;

const NOTICE_CAPACITY: usize = 64;

/// The running admin client: cache actor, toast bridge and the handles the
/// UI layer talks to.
pub struct AdminSystem {
    pub user_client: UserClient,
    pub notifier: Notifier,
    pub bulk: BulkActions,
    pub selection: SelectionHandle,
    actor: JoinHandle<()>,
    bridge: JoinHandle<()>,
    stop_bridge: oneshot::Sender<()>,
}

impl AdminSystem {
    /// Start against the HTTP backend named in `config`.
    pub fn new(config: AdminConfig) -> Result<Self, String> {
        let api = UserApi::new(
            config.api_base_url.clone(),
            config.resource_path.clone(),
            config.request_timeout,
        )
        .map_err(|e| format!("Failed to build API client: {}", e))?;
        Ok(Self::with_remote(config, Arc::new(api)))
    }

    pub fn with_remote(config: AdminConfig, remote: Arc<dyn RemoteResource<User>>) -> Self {
        let (actor, cache_client) = CacheActor::<User>::new(remote, config.cache_options());
        let user_client = UserClient::new(cache_client);
        let actor = tokio::spawn(actor.run());

        let notifier = Notifier::new(NOTICE_CAPACITY);
        let (stop_bridge, stopped) = oneshot::channel();
        let bridge = tokio::spawn(
            run_toast_bridge(user_client.events(), notifier.clone(), stopped)
                .instrument(tracing::info_span!("toast_bridge")),
        );

        let bulk = BulkActions::new(user_client.clone(), notifier.clone(), config.undo_window);

        info!(api = %config.api_base_url, reconcile = ?config.reconcile, "Admin system started");
        Self {
            user_client,
            notifier,
            bulk,
            selection: SelectionHandle::new(),
            actor,
            bridge,
            stop_bridge,
        }
    }

    /// Waits for in-flight mutations to settle, then stops every task.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");
        if let Err(e) = self.user_client.shutdown().await {
            warn!(error = %e, "Cache actor already stopped");
        }

        if let Err(e) = self.actor.await {
            error!("Actor task failed: {:?}", e);
            return Err(format!("Actor task failed: {:?}", e));
        }

        let _ = self.stop_bridge.send(());
        if let Err(e) = self.bridge.await {
            error!("Toast bridge failed: {:?}", e);
            return Err(format!("Toast bridge failed: {:?}", e));
        }

        info!("System shutdown complete.");
        Ok(())
    }
}

/// Turns settlement events into notices until told to stop, then drains
/// whatever is already queued.
async fn run_toast_bridge(
    mut events: broadcast::Receiver<CacheEvent<User>>,
    notifier: Notifier,
    mut stop: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => toast(&notifier, event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Toast bridge lagged"),
                Err(RecvError::Closed) => return,
            },
            _ = &mut stop => break,
        }
    }

    loop {
        match events.try_recv() {
            Ok(event) => toast(&notifier, event),
            Err(TryRecvError::Lagged(skipped)) => warn!(skipped, "Toast bridge lagged"),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
    debug!("Toast bridge stopped");
}

fn toast(notifier: &Notifier, event: CacheEvent<User>) {
    match event {
        CacheEvent::Created { .. } => {
            notifier.success("User created");
        }
        CacheEvent::Updated { .. } => {
            notifier.success("User updated");
        }
        CacheEvent::CreateFailed { error } => {
            notifier.error(format!("Failed to create user: {}", error));
        }
        CacheEvent::UpdateRolledBack { error, .. } => {
            notifier.error(format!("Update failed, rolled back: {}", error));
        }
        CacheEvent::DeleteRolledBack { error, .. } => {
            notifier.error(format!("Delete failed, rolled back: {}", error));
        }
        CacheEvent::FetchFailed { error } => {
            notifier.error(format!("Failed to load users: {}", error));
        }
        // bulk delete posts its own summary
        CacheEvent::Deleted { .. } | CacheEvent::Fetched { .. } => {}
    }
}
