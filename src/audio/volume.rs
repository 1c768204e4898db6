//! Linear gain over little-endian i16 PCM.

use byteorder::{ByteOrder, LittleEndian};

use super::constants::UNITY_GAIN;

/// Scales every complete 16-bit sample in `pcm` by `gain`, saturating at the
/// i16 range instead of wrapping. A trailing odd byte is left untouched.
///
/// Unity gain returns immediately and leaves the buffer byte-for-byte intact.
pub fn apply_gain(pcm: &mut [u8], gain: f32) {
    if gain == UNITY_GAIN {
        return;
    }

    for sample in pcm.chunks_exact_mut(2) {
        let scaled = LittleEndian::read_i16(sample) as f32 * gain;
        let clamped = scaled.clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        LittleEndian::write_i16(sample, clamped);
    }
}
