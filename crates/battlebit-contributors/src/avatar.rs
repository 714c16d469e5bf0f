//! Avatar fetching and in-memory memoization

use crate::error::{ContributorError, Result};
use crate::types::AvatarStats;
use async_trait::async_trait;
use bytes::Bytes;
use moka::future::Cache;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default upstream host for GitHub avatars
pub const DEFAULT_AVATAR_BASE_URL: &str = "https://avatars.githubusercontent.com";

/// Fetches raw avatar payloads from an upstream image host
#[async_trait]
pub trait AvatarFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// reqwest-backed avatar fetcher
pub struct HttpAvatarFetcher {
    client: Client,
}

impl HttpAvatarFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }
}

#[async_trait]
impl AvatarFetcher for HttpAvatarFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, concat!("battlebit-site/", env!("CARGO_PKG_VERSION")))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ContributorError::Status {
                source: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.bytes().await?)
    }
}

/// Memoizes avatar payloads keyed by their upstream URL.
///
/// Entries never expire and are never evicted: the key space is bounded by
/// the contributor count. Concurrent misses on the same key each fetch
/// independently.
pub struct AvatarCache {
    fetcher: Arc<dyn AvatarFetcher>,
    base_url: String,
    entries: Cache<String, Bytes>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl AvatarCache {
    pub fn new(fetcher: Arc<dyn AvatarFetcher>) -> Self {
        Self::with_base_url(fetcher, DEFAULT_AVATAR_BASE_URL)
    }

    pub fn with_base_url(fetcher: Arc<dyn AvatarFetcher>, base_url: &str) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
            entries: Cache::builder().build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Upstream URL for a numeric GitHub user id, `None` for anything else
    pub fn avatar_url_for_id(&self, id: &str) -> Option<String> {
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(format!("{}/u/{}?v=4", self.base_url, id))
    }

    /// Whether a payload for `url` is already stored
    pub async fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    /// Return the cached payload for `url`, fetching and storing it on a miss.
    ///
    /// Returns `None` when the upstream fetch fails; nothing is stored in
    /// that case so a later call retries.
    pub async fn get_or_fetch(&self, url: &str) -> Option<Bytes> {
        if let Some(data) = self.entries.get(url).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(url, "Avatar cache hit");
            return Some(data);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);

        match self.fetcher.fetch(url).await {
            Ok(data) => {
                debug!(url, size = data.len(), "Cached avatar");
                self.entries.insert(url.to_string(), data.clone()).await;
                Some(data)
            }
            Err(e) => {
                warn!(url, error = %e, "Failed to fetch avatar");
                None
            }
        }
    }

    pub fn stats(&self) -> AvatarStats {
        AvatarStats {
            entries: self.entries.entry_count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
