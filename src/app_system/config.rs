//! Runtime configuration loaded from environment variables.
//!
//! Every setting has a default, so the smoke runner starts with no
//! configuration against a local backend.

use std::time::Duration;

use crate::cache::{CacheOptions, Reconcile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminConfig {
    /// Env: `USER_ADMIN_API_URL`
    /// Default: `http://127.0.0.1:3000/api/v1`
    pub api_base_url: String,

    /// Env: `USER_ADMIN_RESOURCE_PATH`
    /// Default: `/user`
    pub resource_path: String,

    /// Env: `USER_ADMIN_TIMEOUT_SECS`
    pub request_timeout: Duration,

    /// How long fetched data counts as fresh. Zero means every read
    /// revalidates in the background.
    /// Env: `USER_ADMIN_STALE_SECS`
    pub stale_after: Duration,

    /// Env: `USER_ADMIN_RECONCILE` (`refetch` or `server-record`)
    pub reconcile: Reconcile,

    /// Env: `USER_ADMIN_UNDO_SECS`
    pub undo_window: Duration,

    /// Env: `USER_ADMIN_BUFFER`
    pub buffer_size: usize,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:3000/api/v1".to_string(),
            resource_path: "/user".to_string(),
            request_timeout: Duration::from_secs(10),
            stale_after: Duration::ZERO,
            reconcile: Reconcile::Refetch,
            undo_window: Duration::from_secs(5),
            buffer_size: 32,
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("USER_ADMIN_API_URL") {
            config.api_base_url = url;
        }
        if let Some(path) = lookup("USER_ADMIN_RESOURCE_PATH") {
            config.resource_path = path;
        }
        if let Some(secs) = parse_u64(&lookup, "USER_ADMIN_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_u64(&lookup, "USER_ADMIN_STALE_SECS") {
            config.stale_after = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_u64(&lookup, "USER_ADMIN_UNDO_SECS") {
            config.undo_window = Duration::from_secs(secs);
        }
        if let Some(size) = parse_u64(&lookup, "USER_ADMIN_BUFFER") {
            match usize::try_from(size) {
                Ok(size) if size > 0 => config.buffer_size = size,
                _ => tracing::warn!(value = size, "Invalid USER_ADMIN_BUFFER, using default"),
            }
        }
        if let Some(value) = lookup("USER_ADMIN_RECONCILE") {
            match value.trim().to_ascii_lowercase().as_str() {
                "refetch" => config.reconcile = Reconcile::Refetch,
                "server-record" | "server_record" => config.reconcile = Reconcile::ServerRecord,
                _ => tracing::warn!(value = %value, "Invalid USER_ADMIN_RECONCILE, using default"),
            }
        }

        config
    }

    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            buffer_size: self.buffer_size,
            stale_after: self.stale_after,
            reconcile: self.reconcile,
        }
    }
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Invalid number, using default");
            None
        }
    }
}
