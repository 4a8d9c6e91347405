//! # Query cache
//!
//! A single cache entry holding an ordered collection of entities, owned by
//! one actor task. Reads go through the actor, mutations go through the
//! actor, and nothing else may write the entry.
//!
//! Updates and deletes are optimistic: the actor snapshots the entry, applies
//! the change locally, and only then lets the remote call proceed. When the
//! remote call settles the actor either commits (see [`Reconcile`]) or
//! reverts to the snapshot. See [`optimistic`] for the protocol itself.

use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::error::{CacheError, RequestError, ValidationError};

pub mod actor;
pub mod client;
pub mod optimistic;

pub use actor::CacheActor;
pub use client::CacheClient;

/// Trait that any entity must implement to be held by a [`CacheActor`].
pub trait Entity: Clone + Debug + Send + Sync + 'static {
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;
    type CreatePayload: Clone + Send + Sync + Debug;
    type Patch: Clone + Send + Sync + Debug;

    fn id(&self) -> &Self::Id;

    /// Shallow-merge `patch` into `self`.
    fn apply_patch(&mut self, patch: &Self::Patch);

    // --- Validation hooks, run before any network call ---

    fn validate_create(_payload: &Self::CreatePayload) -> Result<(), ValidationError> {
        Ok(())
    }

    fn validate_patch(_patch: &Self::Patch) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// How the entry is brought back in line with the server after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    /// Mark the entry stale and refetch the whole collection.
    Refetch,
    /// Trust the record returned by the server for that id.
    ServerRecord,
}

#[derive(Debug, Clone)]
pub struct CacheOptions {
    pub buffer_size: usize,
    pub stale_after: Duration,
    pub reconcile: Reconcile,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            buffer_size: 32,
            stale_after: Duration::ZERO,
            reconcile: Reconcile::Refetch,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStatus {
    /// Never fetched.
    Idle,
    /// First fetch in progress, no data yet.
    Loading,
    Success,
    /// Last fetch failed. Previously fetched data, if any, is kept.
    Error,
}

/// What subscribers see of the cache entry.
#[derive(Debug, Clone)]
pub struct CacheView<T> {
    pub data: Option<Arc<Vec<T>>>,
    pub status: QueryStatus,
    pub is_fetching: bool,
    pub error: Option<String>,
    pub version: u64,
}

impl<T> Default for CacheView<T> {
    fn default() -> Self {
        Self {
            data: None,
            status: QueryStatus::Idle,
            is_fetching: false,
            error: None,
            version: 0,
        }
    }
}

/// Settlement outcomes, broadcast to anyone listening (the toast bridge).
#[derive(Debug, Clone)]
pub enum CacheEvent<T: Entity> {
    Fetched { count: usize },
    FetchFailed { error: RequestError },
    Created { record: T },
    CreateFailed { error: RequestError },
    Updated { id: T::Id },
    UpdateRolledBack { id: T::Id, error: RequestError },
    Deleted { id: T::Id },
    DeleteRolledBack { id: T::Id, error: RequestError },
}

pub type MutationId = u64;

/// A dispatched mutation. Its optimistic phase has already been applied.
///
/// Dropping this does not cancel anything: the actor settles the mutation
/// regardless.
#[derive(Debug)]
pub struct Pending<R> {
    id: MutationId,
    settled: oneshot::Receiver<Result<R, CacheError>>,
}

impl<R> Pending<R> {
    pub(crate) fn new(id: MutationId, settled: oneshot::Receiver<Result<R, CacheError>>) -> Self {
        Self { id, settled }
    }

    pub fn id(&self) -> MutationId {
        self.id
    }

    /// Wait for commit or rollback.
    pub async fn settled(self) -> Result<R, CacheError> {
        self.settled
            .await
            .map_err(|_| CacheError::ActorCommunicationError("Actor dropped".to_string()))?
    }
}
