//! Cubic Hermite (Catmull-Rom) resampler.
//!
//! Four-point interpolation gives noticeably better alias rejection than
//! linear resampling for the common 44.1 kHz → 48 kHz conversion.

/// Frames of history carried between blocks (p0, p1, p2 of the next window).
const HISTORY: usize = 3;

pub struct HermiteResampler {
    ratio: f64,
    /// Read head in frames, relative to the second carried frame.
    position: f64,
    channels: usize,
    /// Unconsumed tail of the previous block, interleaved. Empty until the
    /// first frame arrives, which is then duplicated as the leading `p0`.
    carry: Vec<i16>,
    work: Vec<i16>,
}

impl HermiteResampler {
    pub fn new(source_rate: u32, target_rate: u32, channels: usize) -> Self {
        Self {
            ratio: source_rate as f64 / target_rate as f64,
            position: 0.0,
            channels: channels.max(1),
            carry: Vec::new(),
            work: Vec::new(),
        }
    }

    /// Interpolates between `p[1]` and `p[2]` at `t ∈ [0, 1)`.
    #[inline]
    fn hermite(p: [f32; 4], t: f32) -> f32 {
        let c0 = p[1];
        let c1 = 0.5 * (p[2] - p[0]);
        let c2 = p[0] - 2.5 * p[1] + 2.0 * p[2] - 0.5 * p[3];
        let c3 = 0.5 * (p[3] - p[0]) + 1.5 * (p[1] - p[2]);
        ((c3 * t + c2) * t + c1) * t + c0
    }

    /// Emits every output frame whose window lies inside `work`.
    fn drain(&mut self, frames: usize, output: &mut Vec<i16>) {
        let ch = self.channels;
        // Window p0..p3 sits at frames i-1..=i+2 with i = 1 + floor(position).
        while (self.position as usize) + HISTORY < frames {
            let i = 1 + self.position as usize;
            let t = self.position.fract() as f32;
            for c in 0..ch {
                let p = [
                    self.work[(i - 1) * ch + c] as f32,
                    self.work[i * ch + c] as f32,
                    self.work[(i + 1) * ch + c] as f32,
                    self.work[(i + 2) * ch + c] as f32,
                ];
                let s = Self::hermite(p, t).clamp(i16::MIN as f32, i16::MAX as f32);
                output.push(s as i16);
            }
            self.position += self.ratio;
        }
    }

    /// Resample interleaved `input` and append into `output`.
    pub fn process(&mut self, input: &[i16], output: &mut Vec<i16>) {
        let ch = self.channels;
        let input = &input[..input.len() - input.len() % ch];
        if self.carry.is_empty() {
            self.carry.extend_from_slice(input.get(..ch).unwrap_or_default());
        }

        self.work.clear();
        self.work.extend_from_slice(&self.carry);
        self.work.extend_from_slice(input);

        let frames = self.work.len() / ch;
        self.drain(frames, output);

        let consumed = frames.saturating_sub(HISTORY);
        self.position -= consumed as f64;
        self.carry.clear();
        self.carry.extend_from_slice(&self.work[consumed * ch..frames * ch]);
    }

    /// Emits the frames still held back for look-ahead, extending the last
    /// frame past the end, then starts over for the next stream.
    pub fn flush(&mut self, output: &mut Vec<i16>) {
        let ch = self.channels;
        if self.carry.len() < ch {
            return;
        }
        self.work.clear();
        self.work.extend_from_slice(&self.carry);
        let last = self.carry.len() - ch;
        for _ in 0..2 {
            self.work.extend_from_within(last..last + ch);
        }
        // With two padding frames the window reaches the last real frame.
        let frames = self.work.len() / ch;
        self.drain(frames, output);

        self.position = 0.0;
        self.carry.clear();
    }

    pub fn is_passthrough(&self) -> bool {
        (self.ratio - 1.0).abs() < f64::EPSILON
    }
}
