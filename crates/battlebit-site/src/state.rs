use battlebit_access_log::AccessLogger;
use battlebit_contributors::{
    AvatarCache, ContributorCache, ContributorFilter, ContributorSource, GithubRepoSource,
    HttpAvatarFetcher,
};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, SiteMode};

/// Where static files come from
#[derive(Debug, Clone)]
pub struct StaticRoots {
    pub dist_dir: PathBuf,
    pub public_dir: PathBuf,
    pub source_dir: PathBuf,
}

/// Shared application state passed to all route handlers
pub struct AppState {
    pub contributors: Arc<ContributorCache>,
    pub avatars: Arc<AvatarCache>,
    pub access_log: Arc<AccessLogger>,
    pub mode: SiteMode,
    pub static_roots: StaticRoots,
    pub started_at: DateTime<Utc>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        contributors: Arc<ContributorCache>,
        access_log: Arc<AccessLogger>,
        mode: SiteMode,
        static_roots: StaticRoots,
    ) -> Self {
        Self {
            avatars: contributors.avatars().clone(),
            contributors,
            access_log,
            mode,
            static_roots,
            started_at: Utc::now(),
        }
    }

    /// Wire the GitHub-backed caches and the access logger from configuration
    pub fn from_config(config: &Config) -> Self {
        let github = &config.github;

        let sources: Vec<Arc<dyn ContributorSource>> = github
            .repos
            .iter()
            .map(|repo| {
                let source =
                    GithubRepoSource::with_api_url(&github.api_url, &github.org, repo, github.timeout);
                let source = match github.token {
                    Some(ref token) => source.with_token(token.clone()),
                    None => source,
                };
                Arc::new(source) as Arc<dyn ContributorSource>
            })
            .collect();

        let avatars = Arc::new(AvatarCache::with_base_url(
            Arc::new(HttpAvatarFetcher::new(github.timeout)),
            &github.avatar_base_url,
        ));

        let contributors = ContributorCache::new(
            sources,
            ContributorFilter::new(github.excluded.iter().cloned()),
            avatars,
        )
        .with_team_avatars(github.team_avatars.clone());

        let access_log =
            AccessLogger::new(&config.log.dir).with_rotation_policy(config.log.rotation);

        Self::new(
            Arc::new(contributors),
            Arc::new(access_log),
            config.mode,
            StaticRoots {
                dist_dir: config.dist_dir.clone(),
                public_dir: config.public_dir.clone(),
                source_dir: config.source_dir.clone(),
            },
        )
    }
}
