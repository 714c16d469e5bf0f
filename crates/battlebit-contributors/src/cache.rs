//! Contributor snapshot cache

use crate::avatar::AvatarCache;
use crate::error::Result;
use crate::filter::ContributorFilter;
use crate::source::ContributorSource;
use crate::types::{Contributor, RefreshReport};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Number of avatars fetched concurrently while pre-warming
const PREWARM_CONCURRENCY: usize = 4;

/// Serves the last complete contributor snapshot and rebuilds it on demand
pub struct ContributorCache {
    sources: Vec<Arc<dyn ContributorSource>>,
    filter: ContributorFilter,
    avatars: Arc<AvatarCache>,
    team_avatars: Vec<String>,
    snapshot: RwLock<Arc<Vec<Contributor>>>,
    last_refreshed: RwLock<Option<DateTime<Utc>>>,
}

impl ContributorCache {
    pub fn new(
        sources: Vec<Arc<dyn ContributorSource>>,
        filter: ContributorFilter,
        avatars: Arc<AvatarCache>,
    ) -> Self {
        Self {
            sources,
            filter,
            avatars,
            team_avatars: Vec::new(),
            snapshot: RwLock::new(Arc::new(Vec::new())),
            last_refreshed: RwLock::new(None),
        }
    }

    /// Avatar URLs to pre-warm on every refresh besides the contributors'
    pub fn with_team_avatars(mut self, urls: Vec<String>) -> Self {
        self.team_avatars = urls;
        self
    }

    /// Current snapshot; empty until the first successful refresh
    pub async fn get(&self) -> Arc<Vec<Contributor>> {
        self.snapshot.read().await.clone()
    }

    pub async fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        *self.last_refreshed.read().await
    }

    pub fn avatars(&self) -> &Arc<AvatarCache> {
        &self.avatars
    }

    /// Rebuild the snapshot from every source.
    ///
    /// A source that is unreachable or answers with an error status is
    /// skipped and the others are kept. Any other failure aborts the cycle
    /// and empties the snapshot.
    pub async fn refresh(&self) -> Result<RefreshReport> {
        info!(sources = self.sources.len(), "Fetching contributors");

        let (contributors, failed_sources) = match self.aggregate().await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Contributor refresh failed, clearing snapshot");
                *self.snapshot.write().await = Arc::new(Vec::new());
                return Err(e);
            }
        };

        let contributors = Arc::new(contributors);
        *self.snapshot.write().await = contributors.clone();
        let completed_at = Utc::now();
        *self.last_refreshed.write().await = Some(completed_at);
        info!(count = contributors.len(), "Cached contributors");

        let avatars_warmed = self.prewarm_avatars(&contributors).await;
        info!(
            warmed = avatars_warmed,
            cached = self.avatars.stats().entries,
            "Prefetched avatars"
        );

        Ok(RefreshReport {
            contributors: contributors.len(),
            failed_sources,
            avatars_warmed,
            completed_at: Some(completed_at),
        })
    }

    async fn aggregate(&self) -> Result<(Vec<Contributor>, Vec<String>)> {
        let mut builder = self.filter.builder();
        let mut failed_sources = Vec::new();

        for source in &self.sources {
            match source.fetch().await {
                Ok(contributors) => {
                    let fetched = contributors.len();
                    let admitted = builder.extend(contributors);
                    info!(source = source.name(), fetched, admitted, "Fetched contributors");
                }
                Err(e) if e.is_source_local() => {
                    warn!(source = source.name(), error = %e, "Failed to fetch contributors");
                    failed_sources.push(source.name().to_string());
                }
                Err(e) => return Err(e),
            }
        }

        Ok((builder.finish(), failed_sources))
    }

    async fn prewarm_avatars(&self, contributors: &[Contributor]) -> usize {
        let urls: Vec<String> = contributors
            .iter()
            .map(|c| c.avatar_url.clone())
            .filter(|url| !url.is_empty())
            .chain(self.team_avatars.iter().cloned())
            .collect();

        stream::iter(urls)
            .map(|url| async move { self.avatars.get_or_fetch(&url).await.is_some() })
            .buffer_unordered(PREWARM_CONCURRENCY)
            .filter(|cached| futures::future::ready(*cached))
            .count()
            .await
    }
}
