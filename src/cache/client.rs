use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, instrument};

use super::{CacheEvent, CacheView, Entity, Pending};
use crate::error::CacheError;
use crate::messages::{CacheRequest, CacheResult, Response};

/// Cloneable handle to a running [`super::CacheActor`].
#[derive(Clone)]
pub struct CacheClient<T: Entity> {
    sender: mpsc::Sender<CacheRequest<T>>,
    view: watch::Receiver<CacheView<T>>,
    events: broadcast::Sender<CacheEvent<T>>,
}

impl<T: Entity> CacheClient<T> {
    pub(crate) fn new(
        sender: mpsc::Sender<CacheRequest<T>>,
        view: watch::Receiver<CacheView<T>>,
        events: broadcast::Sender<CacheEvent<T>>,
    ) -> Self {
        Self {
            sender,
            view,
            events,
        }
    }

    async fn call<R>(&self, build: impl FnOnce(Response<R>) -> CacheRequest<T>) -> CacheResult<R> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| CacheError::ActorCommunicationError("Actor closed".to_string()))?;
        response
            .await
            .map_err(|_| CacheError::ActorCommunicationError("Actor dropped".to_string()))?
    }

    #[instrument(skip(self))]
    pub async fn read(&self) -> CacheResult<Arc<Vec<T>>> {
        debug!("Sending request");
        self.call(|respond_to| CacheRequest::Read { respond_to }).await
    }

    pub async fn peek(&self) -> CacheResult<Option<Arc<Vec<T>>>> {
        self.call(|respond_to| CacheRequest::Peek { respond_to }).await
    }

    #[instrument(skip(self))]
    pub async fn invalidate(&self) -> CacheResult<()> {
        debug!("Sending request");
        self.call(|respond_to| CacheRequest::Invalidate { respond_to }).await
    }

    #[instrument(skip(self, payload))]
    pub async fn create(&self, payload: T::CreatePayload) -> CacheResult<Pending<T>> {
        debug!("Sending request");
        self.call(|respond_to| CacheRequest::Create {
            payload,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: T::Id, patch: T::Patch) -> CacheResult<Pending<T>> {
        debug!("Sending request");
        self.call(|respond_to| CacheRequest::Update {
            id,
            patch,
            respond_to,
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: T::Id) -> CacheResult<Pending<()>> {
        debug!("Sending request");
        self.call(|respond_to| CacheRequest::Delete { id, respond_to })
            .await
    }

    pub fn subscribe(&self) -> watch::Receiver<CacheView<T>> {
        self.view.clone()
    }

    pub fn events(&self) -> broadcast::Receiver<CacheEvent<T>> {
        self.events.subscribe()
    }

    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> CacheResult<()> {
        debug!("Sending shutdown request");
        self.sender
            .send(CacheRequest::Shutdown)
            .await
            .map_err(|_| CacheError::ActorCommunicationError("Actor closed".to_string()))
    }
}
