use tracing::{debug, instrument};

use crate::cache::{CacheClient, Pending};
use crate::domain::{User, UserCreate, UserPatch};
use crate::error::UserError;

/// Client for the cached user collection.
#[derive(Clone)]
pub struct UserClient {
    inner: CacheClient<User>,
}

crate::impl_basic_client!(UserClient, User, UserError, user, users);

impl UserClient {
    /// Validates, then dispatches. The returned handle resolves to the
    /// server's record.
    #[instrument(skip(self, payload), fields(name = %payload.name))]
    pub async fn create_user(&self, payload: UserCreate) -> Result<Pending<User>, UserError> {
        debug!("Sending request");
        self.inner.create(payload).await.map_err(UserError::from)
    }

    /// The patch is visible in the cache before this returns.
    #[instrument(skip(self, patch))]
    pub async fn update_user(&self, id: String, patch: UserPatch) -> Result<Pending<User>, UserError> {
        debug!("Sending request");
        self.inner.update(id, patch).await.map_err(UserError::from)
    }

    pub async fn shutdown(&self) -> Result<(), UserError> {
        self.inner.shutdown().await.map_err(UserError::from)
    }
}
