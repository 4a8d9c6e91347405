use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::RemoteResource;
use crate::domain::{User, UserCreate, UserPatch};
use crate::error::RequestError;

/// HTTP client for the remote user collection.
///
/// Paths are `{base_url}{resource_path}` and `{base_url}{resource_path}/{id}`,
/// with the id percent-encoded as a single path segment.
pub struct UserApi {
    http: reqwest::Client,
    collection: Url,
}

impl UserApi {
    pub fn new(
        base_url: impl Into<String>,
        resource_path: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RequestError> {
        let base_url = base_url.into();
        let resource_path = resource_path.into();
        let raw = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            resource_path.trim_matches('/')
        );
        let collection = Url::parse(&raw).map_err(|e| RequestError::new(format!("invalid url {}: {}", raw, e)))?;
        if collection.cannot_be_a_base() {
            return Err(RequestError::new(format!("invalid url {}: cannot carry a path", raw)));
        }
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            collection,
        })
    }

    fn collection_url(&self) -> Url {
        self.collection.clone()
    }

    fn item_url(&self, id: &str) -> Result<Url, RequestError> {
        let mut url = self.collection.clone();
        url.path_segments_mut()
            .map_err(|_| RequestError::new(format!("invalid url {}: cannot carry a path", self.collection)))?
            .push(id);
        Ok(url)
    }

    /// Reject non-success responses, keeping status and body text.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, RequestError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let code = status.as_u16();
        let body = resp.text().await.unwrap_or_default();
        Err(RequestError::with_status(code, format!("HTTP {}: {}", code, body)))
    }

    async fn parse<R: DeserializeOwned>(resp: reqwest::Response) -> Result<R, RequestError> {
        let resp = Self::check(resp).await?;
        resp.json::<R>()
            .await
            .map_err(|e| RequestError::new(format!("decode: {}", e)))
    }
}

#[async_trait]
impl RemoteResource<User> for UserApi {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<User>, RequestError> {
        debug!("GET collection");
        let resp = self.http.get(self.collection_url()).send().await?;
        Self::parse(resp).await
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &String) -> Result<User, RequestError> {
        let resp = self.http.get(self.item_url(id)?).send().await?;
        Self::parse(resp).await
    }

    #[instrument(skip(self, payload))]
    async fn create(&self, payload: &UserCreate) -> Result<User, RequestError> {
        let resp = self.http.post(self.collection_url()).json(payload).send().await?;
        Self::parse(resp).await
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, id: &String, patch: &UserPatch) -> Result<User, RequestError> {
        let resp = self.http.put(self.item_url(id)?).json(patch).send().await?;
        Self::parse(resp).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &String) -> Result<(), RequestError> {
        let resp = self.http.delete(self.item_url(id)?).send().await?;
        // some backends echo the deleted record; it is ignored
        Self::check(resp).await.map(|_| ())
    }
}
