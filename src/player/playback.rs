//! Per-track streaming: open, read, shape, send, flush.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use super::{pacer::Pacer, state::GuildPlaybackState};
use crate::{
    audio::{
        error::AudioError,
        source::{PcmSource, SourceOpener},
        track::Track,
        volume::apply_gain,
    },
    configs::PlayerConfig,
    voice::{PcmSink, VoiceError},
};

/// How a track stopped when nothing went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackEnd {
    Finished,
    Skipped,
    Cancelled,
}

impl std::fmt::Display for TrackEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Finished => "finished",
            Self::Skipped => "skipped",
            Self::Cancelled => "cancelled",
        })
    }
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error(transparent)]
    Voice(#[from] VoiceError),
}

/// Streams one track to a fresh sink on the guild's connection.
///
/// The sink is flushed on every exit path once it exists. The PCM source is
/// dropped before returning, which stops its decoder.
pub async fn stream_track(
    state: &GuildPlaybackState,
    opener: &dyn SourceOpener,
    config: &PlayerConfig,
    track: &Track,
) -> Result<TrackEnd, PlaybackError> {
    let cancel = state.cancel_token();

    let mut source = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Ok(TrackEnd::Cancelled),
        opened = opener.open(track) => opened?,
    };

    let mut sink = state.connection().create_pcm_sink();
    let result = pump(state, source.as_mut(), sink.as_mut(), config).await;
    drop(source);

    if let Err(e) = sink.flush().await {
        warn!(
            "Guild {}: flushing sink after '{}' failed: {}",
            state.guild_id(),
            track.title(),
            e
        );
    }

    result
}

async fn pump(
    state: &GuildPlaybackState,
    source: &mut dyn PcmSource,
    sink: &mut dyn PcmSink,
    config: &PlayerConfig,
) -> Result<TrackEnd, PlaybackError> {
    let cancel = state.cancel_token();
    let mut buf = vec![0u8; config.frame_aligned_chunk_size()];
    let mut pacer = Pacer::new(config.realtime_pacing, config.pacing_lead());

    loop {
        if let Some(end) = interruption(state) {
            return Ok(end);
        }

        // Paused before reading: leave the decoder untouched.
        if state.is_paused() {
            if let Some(end) = wait_while_paused(state, config.paused_chunk_poll()).await {
                return Ok(end);
            }
            pacer.reset();
        }

        let n = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(TrackEnd::Cancelled),
            read = source.read_chunk(&mut buf) => read?,
        };
        if n == 0 {
            return Ok(TrackEnd::Finished);
        }

        if let Some(end) = interruption(state) {
            return Ok(end);
        }

        // Paused with a chunk in hand: hold it until resumed.
        if state.is_paused() {
            if let Some(end) = wait_while_paused(state, config.paused_chunk_poll()).await {
                return Ok(end);
            }
            pacer.reset();
        }

        let chunk = &mut buf[..n];
        apply_gain(chunk, state.volume());

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(TrackEnd::Cancelled),
            sent = sink.send(chunk) => sent?,
        }

        if !pacer.throttle(n, cancel).await {
            return Ok(TrackEnd::Cancelled);
        }
    }
}

fn interruption(state: &GuildPlaybackState) -> Option<TrackEnd> {
    if state.is_cancelled() {
        Some(TrackEnd::Cancelled)
    } else if state.skip_requested() {
        Some(TrackEnd::Skipped)
    } else {
        None
    }
}

/// Sleeps in `poll` steps until resumed. Returns early with the reason if a
/// skip or cancel arrives instead.
async fn wait_while_paused(state: &GuildPlaybackState, poll: Duration) -> Option<TrackEnd> {
    debug!("Guild {}: paused", state.guild_id());
    loop {
        if let Some(end) = interruption(state) {
            return Some(end);
        }
        if !state.is_paused() {
            debug!("Guild {}: resumed", state.guild_id());
            return None;
        }
        tokio::select! {
            biased;
            _ = state.cancel_token().cancelled() => return Some(TrackEnd::Cancelled),
            _ = tokio::time::sleep(poll) => {}
        }
    }
}
