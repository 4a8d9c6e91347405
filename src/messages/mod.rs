use std::sync::Arc;

use tokio::sync::oneshot;

use crate::cache::{Entity, Pending};
use crate::error::CacheError;

/// Generic type aliases for actor communication
pub type CacheResult<T> = std::result::Result<T, CacheError>;
pub type Response<T> = oneshot::Sender<CacheResult<T>>;

/// Typed requests accepted by the cache actor. Each variant carries a oneshot
/// channel for the reply.
#[derive(Debug)]
pub enum CacheRequest<T: Entity> {
    /// Cached collection, fetching first if the entry is absent.
    Read {
        respond_to: Response<Arc<Vec<T>>>,
    },
    /// Current entry as-is. Never fetches.
    Peek {
        respond_to: Response<Option<Arc<Vec<T>>>>,
    },
    Invalidate {
        respond_to: Response<()>,
    },
    Create {
        payload: T::CreatePayload,
        respond_to: Response<Pending<T>>,
    },
    Update {
        id: T::Id,
        patch: T::Patch,
        respond_to: Response<Pending<T>>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<Pending<()>>,
    },
    /// Stop accepting requests; in-flight mutations still settle.
    Shutdown,
}
