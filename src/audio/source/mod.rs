//! Seams between the playback scheduler and the decode pipeline.
//!
//! ```text
//! Track ──SourceOpener::open──▶ PcmSource ──read_chunk──▶ scheduler
//! ```
//!
//! [`SymphoniaOpener`](crate::audio::transcoder::SymphoniaOpener) is the
//! production opener; tests substitute synthetic sources.

use std::io::Cursor;

use async_trait::async_trait;
use symphonia::core::io::MediaSource;

use crate::audio::{
    demux::{AudioFormat, detect_format},
    error::AudioError,
    track::{Track, TrackSource},
};

/// A stream of 48 kHz, stereo, signed 16-bit little-endian PCM.
#[async_trait]
pub trait PcmSource: Send {
    /// Fill up to `buf.len()` bytes. `Ok(0)` marks the end of the stream and
    /// is returned again on every later call.
    async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, AudioError>;
}

/// Turns a queued track into a readable PCM stream.
#[async_trait]
pub trait SourceOpener: Send + Sync {
    async fn open(&self, track: &Track) -> Result<Box<dyn PcmSource>, AudioError>;
}

/// Open the raw bytes behind a track source along with a container hint.
///
/// Performs blocking file I/O; call from a blocking context.
pub fn open_media(source: &TrackSource) -> Result<(Box<dyn MediaSource>, AudioFormat), AudioError> {
    match source {
        TrackSource::File(path) | TrackSource::TempFile(path) => {
            let file = std::fs::File::open(path).map_err(|source| AudioError::Open {
                path: path.clone(),
                source,
            })?;
            Ok((Box::new(file), AudioFormat::from_path(path)))
        }
        TrackSource::Memory(bytes) => {
            let kind = detect_format(&bytes[..bytes.len().min(16)]);
            Ok((Box::new(Cursor::new(bytes.clone())), kind))
        }
    }
}
