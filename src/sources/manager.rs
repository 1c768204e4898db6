use super::{LocalSource, ResolveError, TrackResolver, YtDlpSource};
use crate::{audio::track::Track, configs::SourcesConfig};

/// Tries each registered resolver in order; the first one that accepts the
/// query resolves it.
pub struct SourceManager {
    resolvers: Vec<Box<dyn TrackResolver>>,
}

impl SourceManager {
    pub fn new(config: &SourcesConfig) -> Self {
        let mut resolvers: Vec<Box<dyn TrackResolver>> = Vec::new();

        macro_rules! register_source {
            ($enabled:expr, $name:literal, $ctor:expr) => {
                if $enabled {
                    tracing::info!("Loaded source: {}", $name);
                    resolvers.push(Box::new($ctor));
                }
            };
        }

        // Local paths first so a file named like a search term still wins.
        register_source!(config.local, "local", LocalSource::new());
        register_source!(
            config.ytdlp,
            "yt-dlp",
            YtDlpSource::new(config.ytdlp_path.clone(), config.temp_dir.clone())
        );

        Self { resolvers }
    }

    pub fn with_resolvers(resolvers: Vec<Box<dyn TrackResolver>>) -> Self {
        Self { resolvers }
    }

    pub fn names(&self) -> Vec<&str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    pub async fn resolve(&self, query: &str, requester: &str) -> Result<Track, ResolveError> {
        let query = query.trim();
        for resolver in &self.resolvers {
            if resolver.can_handle(query) {
                tracing::debug!("Resolving '{}' with source: {}", query, resolver.name());
                return resolver.resolve(query, requester).await;
            }
        }

        tracing::debug!("No source could handle: {}", query);
        Err(ResolveError::Unsupported(query.to_string()))
    }
}
