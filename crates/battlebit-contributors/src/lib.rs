//! BattleBit community contributors
//!
//! Aggregates contributors from several GitHub repositories into one
//! deduplicated, filtered snapshot that is refreshed on a schedule, and
//! memoizes their avatar images so the site can serve them from its own
//! origin.

mod avatar;
mod cache;
mod error;
mod filter;
mod scheduler;
mod source;
mod types;

pub use avatar::{AvatarCache, AvatarFetcher, HttpAvatarFetcher, DEFAULT_AVATAR_BASE_URL};
pub use cache::ContributorCache;
pub use error::{ContributorError, Result};
pub use filter::{ContributorFilter, Rejection, SnapshotBuilder};
pub use scheduler::{RefreshScheduler, DEFAULT_REFRESH_PERIOD};
pub use source::{ContributorSource, GithubRepoSource, DEFAULT_GITHUB_API_URL};
pub use types::{AvatarStats, Contributor, RefreshReport};
