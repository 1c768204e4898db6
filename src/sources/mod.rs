//! Track resolution: turn a user query into a playable [`Track`].

pub mod local;
pub mod manager;
pub mod ytdlp;

pub use local::LocalSource;
pub use manager::SourceManager;
pub use ytdlp::YtDlpSource;

use async_trait::async_trait;
use thiserror::Error;

use crate::audio::{error::AudioError, track::Track};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("nothing found for '{0}'")]
    NotFound(String),
    #[error("no source can handle '{0}'")]
    Unsupported(String),
    #[error("{tool} failed: {message}")]
    Tool { tool: &'static str, message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid metadata: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unreadable audio: {0}")]
    Probe(#[from] AudioError),
}

/// A resolver for one kind of query (local path, remote URL, search text).
#[async_trait]
pub trait TrackResolver: Send + Sync {
    /// Short identifier used in logs, e.g. `local`.
    fn name(&self) -> &str;

    fn can_handle(&self, query: &str) -> bool;

    async fn resolve(&self, query: &str, requester: &str) -> Result<Track, ResolveError>;
}
