//! Voice transport seam.
//!
//! The scheduler only ever sees these traits: a transport that joins a
//! guild's voice channel, the resulting connection, and per-track sinks that
//! accept raw 48 kHz stereo s16le PCM.

pub mod loopback;

pub use loopback::LoopbackTransport;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::common::types::{ChannelId, GuildId};

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("voice connect to channel {channel} failed: {reason}")]
    Connect { channel: ChannelId, reason: String },
    #[error("missing permission to join channel {0}")]
    PermissionDenied(ChannelId),
    #[error("channel {0} is full")]
    ChannelFull(ChannelId),
    #[error("voice sink write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("voice connection closed")]
    Closed,
}

/// Something that can join voice channels.
#[async_trait]
pub trait VoiceTransport: Send + Sync {
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Arc<dyn VoiceConnection>, VoiceError>;
}

/// An established voice session for one guild.
#[async_trait]
pub trait VoiceConnection: Send + Sync {
    /// Opens a fresh sink for the next track.
    fn create_pcm_sink(&self) -> Box<dyn PcmSink>;

    /// Leaves the voice channel. Safe to call more than once.
    async fn disconnect(&self);
}

/// Per-track PCM consumer.
#[async_trait]
pub trait PcmSink: Send {
    async fn send(&mut self, pcm: &[u8]) -> Result<(), VoiceError>;

    /// Signals that no more audio follows for this track.
    async fn flush(&mut self) -> Result<(), VoiceError>;
}
