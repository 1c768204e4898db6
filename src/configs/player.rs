use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::audio::constants::{FRAME_BYTES, MAX_VOLUME, MIN_VOLUME};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PlayerConfig {
    /// Bytes of PCM handed to the voice sink per send.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_idle_poll_ms")]
    pub idle_poll_ms: u64,
    #[serde(default = "default_pause_poll_ms")]
    pub pause_poll_ms: u64,
    /// Re-check interval while a chunk is held during a pause.
    #[serde(default = "default_paused_chunk_poll_ms")]
    pub paused_chunk_poll_ms: u64,
    #[serde(default = "default_volume")]
    pub default_volume: f32,
    #[serde(default = "default_true")]
    pub realtime_pacing: bool,
    /// How far ahead of wall-clock time audio may be sent.
    #[serde(default = "default_pacing_lead_ms")]
    pub pacing_lead_ms: u64,
    #[serde(default)]
    pub resampler: ResamplerKind,
    /// Capacity (in decoded blocks) of the decoder-to-scheduler channel.
    #[serde(default = "default_decode_buffer_blocks")]
    pub decode_buffer_blocks: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResamplerKind {
    Linear,
    #[default]
    Hermite,
}

impl PlayerConfig {
    /// Chunk size rounded down to a whole stereo frame, never below one frame.
    pub fn frame_aligned_chunk_size(&self) -> usize {
        (self.chunk_size - self.chunk_size % FRAME_BYTES).max(FRAME_BYTES)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    pub fn pause_poll(&self) -> Duration {
        Duration::from_millis(self.pause_poll_ms)
    }

    pub fn paused_chunk_poll(&self) -> Duration {
        Duration::from_millis(self.paused_chunk_poll_ms)
    }

    pub fn pacing_lead(&self) -> Duration {
        Duration::from_millis(self.pacing_lead_ms)
    }

    pub fn initial_volume(&self) -> f32 {
        clamp_volume(self.default_volume)
    }
}

/// Clamps a gain factor into the supported 0..=2.0 range. NaN maps to unity.
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        return 1.0;
    }
    volume.clamp(MIN_VOLUME, MAX_VOLUME)
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            idle_poll_ms: default_idle_poll_ms(),
            pause_poll_ms: default_pause_poll_ms(),
            paused_chunk_poll_ms: default_paused_chunk_poll_ms(),
            default_volume: default_volume(),
            realtime_pacing: true,
            pacing_lead_ms: default_pacing_lead_ms(),
            resampler: ResamplerKind::default(),
            decode_buffer_blocks: default_decode_buffer_blocks(),
        }
    }
}

fn default_chunk_size() -> usize {
    16 * 1024
}

fn default_idle_poll_ms() -> u64 {
    500
}

fn default_pause_poll_ms() -> u64 {
    100
}

fn default_paused_chunk_poll_ms() -> u64 {
    20
}

fn default_volume() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_pacing_lead_ms() -> u64 {
    200
}

fn default_decode_buffer_blocks() -> usize {
    32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_size_is_frame_aligned() {
        let mut config = PlayerConfig::default();
        assert_eq!(config.frame_aligned_chunk_size(), 16 * 1024);

        config.chunk_size = 1001;
        assert_eq!(config.frame_aligned_chunk_size(), 1000);

        config.chunk_size = 1;
        assert_eq!(config.frame_aligned_chunk_size(), FRAME_BYTES);
    }

    #[test]
    fn volume_is_clamped() {
        assert_eq!(clamp_volume(5.0), 2.0);
        assert_eq!(clamp_volume(-1.0), 0.0);
        assert_eq!(clamp_volume(0.75), 0.75);
        assert_eq!(clamp_volume(f32::NAN), 1.0);
    }
}
