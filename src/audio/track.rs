use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, warn};

/// Display metadata for a queued or playing track.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub title: String,
    pub requester: String,
    /// Advisory only; never used to drive playback.
    #[serde(rename = "durationMs", serialize_with = "serialize_duration_ms")]
    pub duration: Option<Duration>,
}

fn serialize_duration_ms<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match duration {
        Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
        None => serializer.serialize_none(),
    }
}

/// Where a track's audio bytes come from.
#[derive(Debug, Clone)]
pub enum TrackSource {
    /// A file owned by someone else; left in place after playback.
    File(PathBuf),
    /// A downloaded file owned by the track; removed once the track is done.
    TempFile(PathBuf),
    /// An already-resolved stream held in memory.
    Memory(Bytes),
}

/// A playable unit: metadata plus the locator of its audio.
#[derive(Debug, Clone)]
pub struct Track {
    pub info: TrackInfo,
    pub source: TrackSource,
}

impl Track {
    pub fn new(
        title: impl Into<String>,
        requester: impl Into<String>,
        duration: Option<Duration>,
        source: TrackSource,
    ) -> Self {
        Self {
            info: TrackInfo {
                title: title.into(),
                requester: requester.into(),
                duration,
            },
            source,
        }
    }

    pub fn title(&self) -> &str {
        &self.info.title
    }

    /// Deletes the backing temporary file, if any. Failures are logged and
    /// otherwise ignored.
    pub async fn release(&self) {
        if let TrackSource::TempFile(path) = &self.source {
            log_removal(path, tokio::fs::remove_file(path).await);
        }
    }

    /// [`release`](Self::release) for callers outside async code: the
    /// deletion runs on the current runtime, or inline when there is none.
    pub fn release_detached(self) {
        let TrackSource::TempFile(path) = self.source else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    log_removal(&path, tokio::fs::remove_file(&path).await);
                });
            }
            Err(_) => log_removal(&path, std::fs::remove_file(&path)),
        }
    }
}

fn log_removal(path: &Path, result: io::Result<()>) {
    match result {
        Ok(()) => debug!("Removed temp file {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove temp file {}: {}", path.display(), e),
    }
}
