//! Remote system of record.
//!
//! [`RemoteResource`] is the seam between the cache and the network. The
//! production implementation is [`UserApi`]; tests substitute the channel
//! driven mock from `mock_framework`.

use async_trait::async_trait;

use crate::cache::Entity;
use crate::error::RequestError;

pub mod http;

pub use http::UserApi;

/// One HTTP request per call, no retries.
#[async_trait]
pub trait RemoteResource<T: Entity>: Send + Sync + 'static {
    async fn list(&self) -> Result<Vec<T>, RequestError>;

    async fn get(&self, id: &T::Id) -> Result<T, RequestError>;

    async fn create(&self, payload: &T::CreatePayload) -> Result<T, RequestError>;

    async fn update(&self, id: &T::Id, patch: &T::Patch) -> Result<T, RequestError>;

    async fn delete(&self, id: &T::Id) -> Result<(), RequestError>;
}
