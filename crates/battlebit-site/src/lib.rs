//! BattleBit community site server
//!
//! Serves the contributor list, proxied GitHub avatars, and the site's
//! static assets, and writes an access log for every request.

pub mod access_log;
pub mod config;
pub mod constants;
pub mod error;
pub mod server;
pub mod state;
pub mod static_files;
pub mod types;

pub use config::{Config, SiteMode};
pub use error::{Result, SiteError};
pub use server::{create_router, start_server};
pub use state::{AppState, SharedState, StaticRoots};
