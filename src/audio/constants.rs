//! Central constants for the audio pipeline.
//!
//! The voice transport takes exactly one PCM layout; everything upstream is
//! normalised to it.

// ── Output PCM ───────────────────────────────────────────────────────────────

/// Output sample rate expected by the voice transport (Hz).
pub const TARGET_SAMPLE_RATE: u32 = 48_000;

/// Output channel count (interleaved L/R).
pub const OUTPUT_CHANNELS: usize = 2;

/// Bytes per signed 16-bit sample.
pub const BYTES_PER_SAMPLE: usize = 2;

/// Bytes per stereo frame (one sample for each channel).
pub const FRAME_BYTES: usize = OUTPUT_CHANNELS * BYTES_PER_SAMPLE;

/// Bytes of output PCM per second of audio.
pub const BYTES_PER_SECOND: u64 = TARGET_SAMPLE_RATE as u64 * FRAME_BYTES as u64;

// ── Volume ───────────────────────────────────────────────────────────────────

pub const MIN_VOLUME: f32 = 0.0;
pub const MAX_VOLUME: f32 = 2.0;

/// Unity gain; the volume shaper leaves buffers untouched at this value.
pub const UNITY_GAIN: f32 = 1.0;
