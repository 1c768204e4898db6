//! Test doubles for the playback layer.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use byteorder::{ByteOrder, LittleEndian};
use parking_lot::Mutex;

use crate::{
    audio::{
        error::AudioError,
        source::{PcmSource, SourceOpener},
        track::{Track, TrackSource},
    },
    common::types::{ChannelId, GuildId},
    configs::PlayerConfig,
    voice::{PcmSink, VoiceConnection, VoiceError, VoiceTransport},
};

/// Left-channel value of the first synthetic track; later tracks add their
/// open sequence number.
pub const TRACK_MARK: i16 = 1000;

/// 20 ms of output PCM per chunk, real-time pacing with no lead.
pub fn test_config(realtime: bool) -> PlayerConfig {
    PlayerConfig {
        chunk_size: 3840,
        idle_poll_ms: 10,
        pause_poll_ms: 10,
        paused_chunk_poll_ms: 5,
        realtime_pacing: realtime,
        pacing_lead_ms: 0,
        ..PlayerConfig::default()
    }
}

pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

// ── Voice ────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorded {
    chunks: Mutex<Vec<Vec<u8>>>,
    flushes: AtomicUsize,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    fail_connect: AtomicBool,
    fail_next_send: AtomicBool,
}

/// Records every chunk sent by any guild through any sink.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    inner: Arc<Recorded>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A connection not tied to any `connect` call.
    pub fn connection(&self) -> Arc<dyn VoiceConnection> {
        Arc::new(RecordingConnection {
            inner: self.inner.clone(),
        })
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.inner.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub fn fail_next_send(&self) {
        self.inner.fail_next_send.store(true, Ordering::SeqCst);
    }

    pub fn chunk_count(&self) -> usize {
        self.inner.chunks.lock().len()
    }

    /// `(left, right)` of the first frame of every chunk, in send order.
    pub fn first_frames(&self) -> Vec<(i16, i16)> {
        self.inner
            .chunks
            .lock()
            .iter()
            .map(|c| (LittleEndian::read_i16(&c[0..2]), LittleEndian::read_i16(&c[2..4])))
            .collect()
    }

    pub fn chunk_indices(&self) -> Vec<i16> {
        self.first_frames().into_iter().map(|f| f.1).collect()
    }

    /// Chunk indices sent for the track opened `seq`-th.
    pub fn chunk_indices_for(&self, seq: i16) -> Vec<i16> {
        self.first_frames()
            .into_iter()
            .filter(|f| f.0 == TRACK_MARK + seq)
            .map(|f| f.1)
            .collect()
    }

    pub fn flushes(&self) -> usize {
        self.inner.flushes.load(Ordering::SeqCst)
    }

    pub fn connects(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.inner.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VoiceTransport for RecordingTransport {
    async fn connect(
        &self,
        _guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Arc<dyn VoiceConnection>, VoiceError> {
        if self.inner.fail_connect.load(Ordering::SeqCst) {
            return Err(VoiceError::PermissionDenied(channel_id));
        }
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.connection())
    }
}

struct RecordingConnection {
    inner: Arc<Recorded>,
}

#[async_trait]
impl VoiceConnection for RecordingConnection {
    fn create_pcm_sink(&self) -> Box<dyn PcmSink> {
        Box::new(RecordingSink {
            inner: self.inner.clone(),
        })
    }

    async fn disconnect(&self) {
        self.inner.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

struct RecordingSink {
    inner: Arc<Recorded>,
}

#[async_trait]
impl PcmSink for RecordingSink {
    async fn send(&mut self, pcm: &[u8]) -> Result<(), VoiceError> {
        if self.inner.fail_next_send.swap(false, Ordering::SeqCst) {
            return Err(VoiceError::Closed);
        }
        self.inner.chunks.lock().push(pcm.to_vec());
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), VoiceError> {
        self.inner.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── Sources ──────────────────────────────────────────────────────────────────

/// Produces `chunks` full buffers per track without decoding anything.
///
/// Every frame of chunk `i` of the `n`-th opened track is
/// `(TRACK_MARK + n, i)`. Titles starting with `broken` fail to open.
#[derive(Clone)]
pub struct SyntheticOpener {
    chunks: usize,
    opened: Arc<Mutex<Vec<String>>>,
}

impl SyntheticOpener {
    pub fn new(chunks: usize) -> Self {
        Self {
            chunks,
            opened: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn track(&self, title: &str) -> Track {
        Track::new(title, "tester", None, TrackSource::Memory(Default::default()))
    }

    pub fn temp_track(&self, title: &str, path: std::path::PathBuf) -> Track {
        Track::new(title, "tester", None, TrackSource::TempFile(path))
    }

    /// Titles in the order they were opened.
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }
}

#[async_trait]
impl SourceOpener for SyntheticOpener {
    async fn open(&self, track: &Track) -> Result<Box<dyn PcmSource>, AudioError> {
        if track.title().starts_with("broken") {
            return Err(AudioError::NoAudioTrack);
        }
        let seq = {
            let mut opened = self.opened.lock();
            opened.push(track.title().to_string());
            opened.len() as i16 - 1
        };
        Ok(Box::new(SyntheticSource {
            mark: TRACK_MARK + seq,
            next: 0,
            total: self.chunks,
        }))
    }
}

struct SyntheticSource {
    mark: i16,
    next: usize,
    total: usize,
}

#[async_trait]
impl PcmSource for SyntheticSource {
    async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, AudioError> {
        if self.next >= self.total {
            return Ok(0);
        }
        let index = self.next as i16;
        for frame in buf.chunks_exact_mut(4) {
            LittleEndian::write_i16(&mut frame[0..2], self.mark);
            LittleEndian::write_i16(&mut frame[2..4], index);
        }
        self.next += 1;
        tokio::task::yield_now().await;
        Ok(buf.len())
    }
}
