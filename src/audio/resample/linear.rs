//! Fast linear-interpolation resampler.

pub struct LinearResampler {
    /// Source / target ratio (< 1.0 upsamples, > 1.0 downsamples).
    ratio: f64,
    /// Read head in frames, relative to the carried frame.
    position: f64,
    /// Last frame of the previous block, interleaved. Empty before the
    /// first block.
    carry: Vec<i16>,
    channels: usize,
    work: Vec<i16>,
}

impl LinearResampler {
    pub fn new(source_rate: u32, target_rate: u32, channels: usize) -> Self {
        Self {
            ratio: source_rate as f64 / target_rate as f64,
            position: 0.0,
            carry: Vec::new(),
            channels: channels.max(1),
            work: Vec::new(),
        }
    }

    fn drain(&mut self, frames: usize, output: &mut Vec<i16>) {
        let ch = self.channels;
        while (self.position as usize) + 1 < frames {
            let i = self.position as usize;
            let t = self.position.fract() as f32;
            for c in 0..ch {
                let a = self.work[i * ch + c] as f32;
                let b = self.work[(i + 1) * ch + c] as f32;
                output.push((a + (b - a) * t) as i16);
            }
            self.position += self.ratio;
        }
    }

    pub fn process(&mut self, input: &[i16], output: &mut Vec<i16>) {
        let ch = self.channels;
        self.work.clear();
        self.work.extend_from_slice(&self.carry);
        self.work.extend_from_slice(&input[..input.len() - input.len() % ch]);

        let frames = self.work.len() / ch;
        self.drain(frames, output);

        let consumed = frames.saturating_sub(1);
        self.position -= consumed as f64;
        self.carry.clear();
        self.carry.extend_from_slice(&self.work[consumed * ch..frames * ch]);
    }

    /// Emits output up to the last input frame, then starts over.
    pub fn flush(&mut self, output: &mut Vec<i16>) {
        let ch = self.channels;
        if self.carry.len() < ch {
            return;
        }
        self.work.clear();
        self.work.extend_from_slice(&self.carry);
        self.work.extend_from_slice(&self.carry[self.carry.len() - ch..]);

        let frames = self.work.len() / ch;
        self.drain(frames, output);

        self.position = 0.0;
        self.carry.clear();
    }

    pub fn is_passthrough(&self) -> bool {
        (self.ratio - 1.0).abs() < f64::EPSILON
    }
}
