//! In-process transcoder: any supported container to 48 kHz stereo s16le.
//!
//! Decoding happens on a dedicated thread; the async side pulls blocks through
//! a bounded flume channel, so a consumer that stops reading (pause) also
//! stops the decoder.

use std::thread;

use async_trait::async_trait;
use byteorder::{ByteOrder, LittleEndian};
use flume::{Receiver, Sender};
use tracing::{debug, error};

use crate::{
    audio::{
        error::AudioError,
        processor::{AudioProcessor, DecodeEnd, DecoderCommand},
        source::{PcmSource, SourceOpener, open_media},
        track::Track,
    },
    configs::{PlayerConfig, ResamplerKind},
};

/// Opens tracks by decoding them with symphonia.
#[derive(Debug, Clone)]
pub struct SymphoniaOpener {
    resampler: ResamplerKind,
    buffer_blocks: usize,
}

impl SymphoniaOpener {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            resampler: config.resampler,
            buffer_blocks: config.decode_buffer_blocks.max(1),
        }
    }
}

#[async_trait]
impl SourceOpener for SymphoniaOpener {
    async fn open(&self, track: &Track) -> Result<Box<dyn PcmSource>, AudioError> {
        let source = track.source.clone();
        let resampler = self.resampler;

        let processor = tokio::task::spawn_blocking(move || {
            let (media, kind) = open_media(&source)?;
            AudioProcessor::open(media, kind, resampler)
        })
        .await
        .map_err(|e| AudioError::Decode(format!("probe task failed: {e}")))??;

        let transcoder = PcmTranscoder::spawn(processor, track.title(), self.buffer_blocks)?;
        Ok(Box::new(transcoder))
    }
}

/// The async end of a running decode thread.
pub struct PcmTranscoder {
    pcm_rx: Receiver<Vec<i16>>,
    cmd_tx: Sender<DecoderCommand>,
    error_rx: Receiver<AudioError>,
    pending: Vec<u8>,
    pending_pos: usize,
    finished: bool,
    /// Decoder failure that arrived after part of a chunk was filled.
    deferred: Option<AudioError>,
}

impl PcmTranscoder {
    fn spawn(
        mut processor: AudioProcessor,
        title: &str,
        buffer_blocks: usize,
    ) -> Result<Self, AudioError> {
        let (pcm_tx, pcm_rx) = flume::bounded::<Vec<i16>>(buffer_blocks);
        let (cmd_tx, cmd_rx) = flume::unbounded::<DecoderCommand>();
        let (error_tx, error_rx) = flume::bounded::<AudioError>(1);

        let label = title.to_string();
        thread::Builder::new()
            .name("pcm-decoder".to_string())
            .spawn(move || {
                match processor.run(&pcm_tx, &cmd_rx) {
                    Ok(DecodeEnd::EndOfStream) => debug!("Decoder reached end of '{}'", label),
                    Ok(DecodeEnd::Stopped) => debug!("Decoder for '{}' stopped", label),
                    Err(e) => {
                        error!("Decoding '{}' failed: {}", label, e);
                        let _ = error_tx.send(e);
                    }
                }
                drop(pcm_tx);
            })
            .map_err(AudioError::Spawn)?;

        Ok(Self {
            pcm_rx,
            cmd_tx,
            error_rx,
            pending: Vec::new(),
            pending_pos: 0,
            finished: false,
            deferred: None,
        })
    }
}

#[async_trait]
impl PcmSource for PcmTranscoder {
    async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, AudioError> {
        if let Some(e) = self.deferred.take() {
            return Err(e);
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let mut filled = 0;
        while filled < buf.len() {
            if self.pending_pos < self.pending.len() {
                let n = (self.pending.len() - self.pending_pos).min(buf.len() - filled);
                buf[filled..filled + n]
                    .copy_from_slice(&self.pending[self.pending_pos..self.pending_pos + n]);
                self.pending_pos += n;
                filled += n;
                continue;
            }

            if self.finished {
                break;
            }

            match self.pcm_rx.recv_async().await {
                Ok(block) => {
                    self.pending.resize(block.len() * 2, 0);
                    LittleEndian::write_i16_into(&block, &mut self.pending);
                    self.pending_pos = 0;
                }
                Err(_) => {
                    self.finished = true;
                    if let Ok(e) = self.error_rx.try_recv() {
                        if filled == 0 {
                            return Err(e);
                        }
                        // Hand out what was already copied first.
                        self.deferred = Some(e);
                        break;
                    }
                }
            }
        }

        Ok(filled)
    }
}

impl Drop for PcmTranscoder {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(DecoderCommand::Stop);
    }
}
