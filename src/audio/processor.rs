//! Decode loop: demux, decode, fold to stereo, resample to 48 kHz.
//!
//! Runs on a dedicated OS thread per track and pushes blocks of 48 kHz
//! stereo i16 PCM into a bounded channel. A full channel blocks the decoder,
//! which is what throttles decoding to the consumer's pace.

use flume::{Receiver, Sender, TryRecvError};
use symphonia::core::{
    audio::SampleBuffer,
    codecs::Decoder,
    errors::Error,
    formats::FormatReader,
    io::MediaSource,
};
use tracing::{debug, warn};

use crate::{
    audio::{
        channels::to_stereo,
        constants::{OUTPUT_CHANNELS, TARGET_SAMPLE_RATE},
        demux::{AudioFormat, OpenedFormat, open_format},
        error::AudioError,
        resample::Resampler,
    },
    configs::ResamplerKind,
};

#[derive(Debug, Clone, PartialEq)]
pub enum DecoderCommand {
    Stop,
}

/// Why the decode loop returned without error.
#[derive(Debug, PartialEq)]
pub enum DecodeEnd {
    /// The container ran out of packets.
    EndOfStream,
    /// A stop command arrived or the consumer went away.
    Stopped,
}

pub struct AudioProcessor {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    resampler: Resampler,
    track_id: u32,
    sample_buf: Option<SampleBuffer<i16>>,
    sample_buf_frames: u64,
    sample_buf_channels: usize,
    stereo: Vec<i16>,
}

impl AudioProcessor {
    /// Probe `source` and prepare a decoder targeting 48 kHz stereo.
    pub fn open(
        source: Box<dyn MediaSource>,
        kind: AudioFormat,
        resampler: ResamplerKind,
    ) -> Result<Self, AudioError> {
        let OpenedFormat {
            format,
            decoder,
            track_id,
            sample_rate,
            channels,
        } = open_format(source, kind)?;

        debug!(
            "AudioProcessor: opened {:?} stream, {}Hz {}ch",
            kind, sample_rate, channels
        );

        Ok(Self {
            format,
            decoder,
            resampler: Resampler::new(resampler, sample_rate, TARGET_SAMPLE_RATE, OUTPUT_CHANNELS),
            track_id,
            sample_buf: None,
            sample_buf_frames: 0,
            sample_buf_channels: 0,
            stereo: Vec::new(),
        })
    }

    /// Decode until the stream ends, a `Stop` arrives, or `pcm_tx` is dropped.
    ///
    /// Corrupt packets are logged and skipped; any other decoder or container
    /// failure ends the loop with an error.
    pub fn run(
        &mut self,
        pcm_tx: &Sender<Vec<i16>>,
        cmd_rx: &Receiver<DecoderCommand>,
    ) -> Result<DecodeEnd, AudioError> {
        loop {
            match cmd_rx.try_recv() {
                Ok(DecoderCommand::Stop) | Err(TryRecvError::Disconnected) => {
                    return Ok(DecodeEnd::Stopped);
                }
                Err(TryRecvError::Empty) => {}
            }

            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(Error::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Ok(self.finish(pcm_tx));
                }
                Err(e) => return Err(AudioError::Decode(format!("packet read: {e}"))),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(Error::DecodeError(e)) => {
                    warn!("Decode error (recoverable): {e}");
                    continue;
                }
                Err(Error::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Ok(self.finish(pcm_tx));
                }
                Err(e) => return Err(AudioError::Decode(e.to_string())),
            };

            let spec = *decoded.spec();
            let frames = decoded.capacity() as u64;
            let width = spec.channels.count();
            if self.sample_buf.is_none()
                || frames > self.sample_buf_frames
                || width != self.sample_buf_channels
            {
                self.sample_buf = Some(SampleBuffer::<i16>::new(frames, spec));
                self.sample_buf_frames = frames;
                self.sample_buf_channels = width;
            }
            let Some(buf) = self.sample_buf.as_mut() else {
                continue;
            };
            buf.copy_interleaved_ref(decoded);

            self.stereo.clear();
            to_stereo(buf.samples(), width, &mut self.stereo);
            if self.stereo.is_empty() {
                continue;
            }

            let mut block = Vec::with_capacity(self.stereo.len() + self.stereo.len() / 8);
            self.resampler.process(&self.stereo, &mut block);

            if !block.is_empty() && pcm_tx.send(block).is_err() {
                return Ok(DecodeEnd::Stopped);
            }
        }
    }

    /// Emits the resampler's held-back tail once the container is drained.
    fn finish(&mut self, pcm_tx: &Sender<Vec<i16>>) -> DecodeEnd {
        let mut tail = Vec::new();
        self.resampler.flush(&mut tail);
        if !tail.is_empty() && pcm_tx.send(tail).is_err() {
            return DecodeEnd::Stopped;
        }
        DecodeEnd::EndOfStream
    }
}
