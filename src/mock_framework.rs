//! # Mock Framework
//!
//! Utilities for testing the cache without a network.
//!
//! Use [`create_mock_remote`] to get a remote and a receiver. Every remote
//! call arrives on the receiver as a [`RemoteCall`] carrying a oneshot
//! responder, so a test decides when and how each call resolves. Holding a
//! responder keeps that call in flight, which is how optimistic state is
//! observed before settlement.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::api::RemoteResource;
use crate::cache::Entity;
use crate::error::RequestError;

pub type Reply<R> = oneshot::Sender<Result<R, RequestError>>;

#[derive(Debug)]
pub enum RemoteCall<T: Entity> {
    List { respond_to: Reply<Vec<T>> },
    Get { id: T::Id, respond_to: Reply<T> },
    Create { payload: T::CreatePayload, respond_to: Reply<T> },
    Update { id: T::Id, patch: T::Patch, respond_to: Reply<T> },
    Delete { id: T::Id, respond_to: Reply<()> },
}

pub struct MockRemote<T: Entity> {
    sender: mpsc::UnboundedSender<RemoteCall<T>>,
}

impl<T: Entity> MockRemote<T> {
    async fn call<R>(&self, build: impl FnOnce(Reply<R>) -> RemoteCall<T>) -> Result<R, RequestError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .map_err(|_| RequestError::new("mock receiver closed"))?;
        response
            .await
            .map_err(|_| RequestError::new("mock responder dropped"))?
    }
}

#[async_trait]
impl<T: Entity> RemoteResource<T> for MockRemote<T> {
    async fn list(&self) -> Result<Vec<T>, RequestError> {
        self.call(|respond_to| RemoteCall::List { respond_to }).await
    }

    async fn get(&self, id: &T::Id) -> Result<T, RequestError> {
        let id = id.clone();
        self.call(|respond_to| RemoteCall::Get { id, respond_to }).await
    }

    async fn create(&self, payload: &T::CreatePayload) -> Result<T, RequestError> {
        let payload = payload.clone();
        self.call(|respond_to| RemoteCall::Create { payload, respond_to })
            .await
    }

    async fn update(&self, id: &T::Id, patch: &T::Patch) -> Result<T, RequestError> {
        let (id, patch) = (id.clone(), patch.clone());
        self.call(|respond_to| RemoteCall::Update {
            id,
            patch,
            respond_to,
        })
        .await
    }

    async fn delete(&self, id: &T::Id) -> Result<(), RequestError> {
        let id = id.clone();
        self.call(|respond_to| RemoteCall::Delete { id, respond_to }).await
    }
}

/// Creates a mock remote and the receiver for asserting calls.
pub fn create_mock_remote<T: Entity>() -> (Arc<MockRemote<T>>, mpsc::UnboundedReceiver<RemoteCall<T>>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Arc::new(MockRemote { sender }), receiver)
}

/// Helper to verify that the next call is a List
pub async fn expect_list<T: Entity>(receiver: &mut mpsc::UnboundedReceiver<RemoteCall<T>>) -> Option<Reply<Vec<T>>> {
    match receiver.recv().await {
        Some(RemoteCall::List { respond_to }) => Some(respond_to),
        _ => None,
    }
}

/// Helper to verify that the next call is a Create
pub async fn expect_create<T: Entity>(
    receiver: &mut mpsc::UnboundedReceiver<RemoteCall<T>>,
) -> Option<(T::CreatePayload, Reply<T>)> {
    match receiver.recv().await {
        Some(RemoteCall::Create { payload, respond_to }) => Some((payload, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call is an Update
pub async fn expect_update<T: Entity>(
    receiver: &mut mpsc::UnboundedReceiver<RemoteCall<T>>,
) -> Option<(T::Id, T::Patch, Reply<T>)> {
    match receiver.recv().await {
        Some(RemoteCall::Update { id, patch, respond_to }) => Some((id, patch, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next call is a Delete
pub async fn expect_delete<T: Entity>(
    receiver: &mut mpsc::UnboundedReceiver<RemoteCall<T>>,
) -> Option<(T::Id, Reply<()>)> {
    match receiver.recv().await {
        Some(RemoteCall::Delete { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Asserts that no call has reached the remote yet.
pub fn expect_silence<T: Entity>(receiver: &mut mpsc::UnboundedReceiver<RemoteCall<T>>) {
    if let Ok(call) = receiver.try_recv() {
        panic!("unexpected remote call: {:?}", call);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, Status, User, UserCreate};

    #[tokio::test]
    async fn test_mock_remote() {
        let (remote, mut receiver) = create_mock_remote::<User>();

        let create_task = tokio::spawn(async move {
            let payload = UserCreate::new("Test", "test@example.com", Role::User, Status::Active);
            remote.create(&payload).await
        });

        let (payload, responder) = expect_create(&mut receiver).await.expect("Expected Create call");
        assert_eq!(payload.name, "Test");
        responder
            .send(Err(RequestError::with_status(503, "HTTP 503: unavailable")))
            .unwrap();

        let result = create_task.await.unwrap();
        assert_eq!(result.unwrap_err().status, Some(503));
        expect_silence(&mut receiver);
    }
}
