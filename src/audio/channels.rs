//! Channel-layout normalisation to interleaved stereo.

/// Appends `input` (interleaved, `channels` wide) to `out` as stereo.
///
/// Mono is duplicated to both sides; layouts wider than stereo keep the
/// front-left / front-right pair.
pub fn to_stereo(input: &[i16], channels: usize, out: &mut Vec<i16>) {
    match channels {
        0 => {}
        1 => {
            out.reserve(input.len() * 2);
            for &s in input {
                out.push(s);
                out.push(s);
            }
        }
        2 => out.extend_from_slice(&input[..input.len() - input.len() % 2]),
        n => {
            out.reserve(input.len() / n * 2);
            for frame in input.chunks_exact(n) {
                out.push(frame[0]);
                out.push(frame[1]);
            }
        }
    }
}
