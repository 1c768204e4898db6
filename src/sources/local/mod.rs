use std::{path::Path, time::Duration};

use async_trait::async_trait;
use symphonia::core::{
    codecs::CODEC_TYPE_NULL,
    formats::FormatOptions,
    io::MediaSourceStream,
    meta::{MetadataOptions, MetadataRevision, StandardTagKey},
    probe::Hint,
};
use tracing::{debug, warn};

use crate::{
    audio::{
        error::AudioError,
        track::{Track, TrackSource},
    },
    sources::{ResolveError, TrackResolver},
};

/// Plays files already on disk. They are never deleted after playback.
pub struct LocalSource;

/// What the file itself says about the track.
#[derive(Debug, PartialEq)]
struct ProbedInfo {
    title: String,
    duration: Option<Duration>,
}

impl LocalSource {
    pub fn new() -> Self {
        Self
    }

    fn strip(identifier: &str) -> &str {
        identifier.strip_prefix("file://").unwrap_or(identifier)
    }

    fn probe_file(path: &Path) -> Result<ProbedInfo, AudioError> {
        let file = std::fs::File::open(path).map_err(|source| AudioError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(&ext.to_lowercase());
        }

        let mss = MediaSourceStream::new(Box::new(file), Default::default());
        let mut probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;

        let duration = {
            let track = probed
                .format
                .tracks()
                .iter()
                .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
                .ok_or(AudioError::NoAudioTrack)?;

            match (track.codec_params.n_frames, track.codec_params.sample_rate) {
                (Some(frames), Some(rate)) if rate > 0 => {
                    Some(Duration::from_secs_f64(frames as f64 / rate as f64))
                }
                _ => None,
            }
        };

        // Container tags first, then anything found while probing (ID3).
        let mut title = probed.format.metadata().current().and_then(title_tag);
        if title.is_none() {
            if let Some(meta) = probed.metadata.get() {
                title = meta.current().and_then(title_tag);
            }
        }

        // Fallback: use the filename without extension as the title
        let title = title.unwrap_or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Unknown")
                .to_string()
        });

        Ok(ProbedInfo { title, duration })
    }
}

impl Default for LocalSource {
    fn default() -> Self {
        Self::new()
    }
}

fn title_tag(revision: &MetadataRevision) -> Option<String> {
    revision
        .tags()
        .iter()
        .find(|tag| tag.std_key == Some(StandardTagKey::TrackTitle))
        .map(|tag| tag.value.to_string())
        .filter(|title| !title.trim().is_empty())
}

#[async_trait]
impl TrackResolver for LocalSource {
    fn name(&self) -> &str {
        "local"
    }

    fn can_handle(&self, identifier: &str) -> bool {
        Path::new(Self::strip(identifier)).is_file()
    }

    async fn resolve(&self, identifier: &str, requester: &str) -> Result<Track, ResolveError> {
        let path = Path::new(Self::strip(identifier)).to_path_buf();
        if !path.is_file() {
            return Err(ResolveError::NotFound(identifier.to_string()));
        }

        debug!("Local source probing file: {}", path.display());

        let probe_path = path.clone();
        let info = tokio::task::spawn_blocking(move || LocalSource::probe_file(&probe_path))
            .await
            .map_err(|e| ResolveError::Io(std::io::Error::other(e)))?
            .inspect_err(|e| warn!("Local source: failed to probe '{}': {}", path.display(), e))?;

        Ok(Track::new(
            info.title,
            requester,
            info.duration,
            TrackSource::File(path),
        ))
    }
}
