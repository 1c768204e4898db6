//! PCM sample-rate conversion to the 48 kHz output rate.
//!
//! | Type | Quality | CPU Cost |
//! |---|---|---|
//! | [`LinearResampler`] | Okay (fast path) | Very low |
//! | [`HermiteResampler`] | High (Catmull-Rom) | Low-medium |
//!
//! Both keep a short tail of the previous block so interpolation is
//! continuous across decoder packet boundaries.

pub mod hermite;
pub mod linear;

pub use hermite::HermiteResampler;
pub use linear::LinearResampler;

use crate::configs::ResamplerKind;

pub enum Resampler {
    Linear(LinearResampler),
    Hermite(HermiteResampler),
}

impl Resampler {
    pub fn new(kind: ResamplerKind, source_rate: u32, target_rate: u32, channels: usize) -> Self {
        match kind {
            ResamplerKind::Linear => {
                Self::Linear(LinearResampler::new(source_rate, target_rate, channels))
            }
            ResamplerKind::Hermite => {
                Self::Hermite(HermiteResampler::new(source_rate, target_rate, channels))
            }
        }
    }

    /// Returns `true` if no conversion is needed (source == target rate).
    pub fn is_passthrough(&self) -> bool {
        match self {
            Self::Linear(r) => r.is_passthrough(),
            Self::Hermite(r) => r.is_passthrough(),
        }
    }

    /// Resample interleaved `input` and append the result to `output`.
    pub fn process(&mut self, input: &[i16], output: &mut Vec<i16>) {
        if self.is_passthrough() {
            output.extend_from_slice(input);
            return;
        }
        match self {
            Self::Linear(r) => r.process(input, output),
            Self::Hermite(r) => r.process(input, output),
        }
    }

    /// Appends the frames held back for interpolation at end of stream.
    pub fn flush(&mut self, output: &mut Vec<i16>) {
        match self {
            Self::Linear(r) => r.flush(output),
            Self::Hermite(r) => r.flush(output),
        }
    }
}
