use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
};

use parking_lot::Mutex;
use rand::seq::SliceRandom;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::{
    audio::track::{Track, TrackInfo},
    common::types::{ChannelId, GuildId},
    configs::clamp_volume,
    voice::VoiceConnection,
};

/// Read-only view of a guild's player for status displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub queue_length: usize,
    pub current: Option<TrackInfo>,
    pub upcoming: Vec<TrackInfo>,
    pub paused: bool,
    pub volume: f32,
}

#[derive(Default)]
struct PlaybackQueue {
    tracks: VecDeque<Track>,
    current: Option<TrackInfo>,
}

/// Everything one guild's scheduler and its callers share.
///
/// The queue and current track sit behind one short-lived lock so a dequeue
/// and the matching `current` update are observed together. The flags and
/// volume are lock-free and may be flipped from any task.
pub struct GuildPlaybackState {
    guild_id: GuildId,
    channel_id: ChannelId,
    connection: Arc<dyn VoiceConnection>,
    queue: Mutex<PlaybackQueue>,
    paused: AtomicBool,
    skip_requested: AtomicBool,
    /// f32 gain stored as raw bits.
    volume: AtomicU32,
    cancel: CancellationToken,
}

impl GuildPlaybackState {
    pub fn new(
        guild_id: GuildId,
        channel_id: ChannelId,
        connection: Arc<dyn VoiceConnection>,
        volume: f32,
    ) -> Self {
        Self {
            guild_id,
            channel_id,
            connection,
            queue: Mutex::new(PlaybackQueue::default()),
            paused: AtomicBool::new(false),
            skip_requested: AtomicBool::new(false),
            volume: AtomicU32::new(clamp_volume(volume).to_bits()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    pub fn connection(&self) -> &Arc<dyn VoiceConnection> {
        &self.connection
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// One-shot; there is no way back.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    // ── Queue ────────────────────────────────────────────────────────────────

    /// Appends `track` and returns the new queue length.
    pub fn enqueue(&self, track: Track) -> usize {
        let mut queue = self.queue.lock();
        queue.tracks.push_back(track);
        queue.tracks.len()
    }

    /// Pops the next track, marks it current and clears any stale skip
    /// request, all in one step.
    pub fn begin_next(&self) -> Option<Track> {
        let mut queue = self.queue.lock();
        let track = queue.tracks.pop_front()?;
        queue.current = Some(track.info.clone());
        self.skip_requested.store(false, Ordering::Release);
        Some(track)
    }

    pub fn finish_current(&self) {
        self.queue.lock().current = None;
    }

    /// Takes every pending track out of the queue. The current track stays.
    pub fn clear(&self) -> Vec<Track> {
        self.queue.lock().tracks.drain(..).collect()
    }

    pub fn shuffle(&self) -> usize {
        let mut queue = self.queue.lock();
        queue.tracks.make_contiguous().shuffle(&mut rand::thread_rng());
        queue.tracks.len()
    }

    /// Removes the pending track at zero-based `index`.
    pub fn remove(&self, index: usize) -> Option<Track> {
        self.queue.lock().tracks.remove(index)
    }

    pub fn queue_len(&self) -> usize {
        self.queue.lock().tracks.len()
    }

    pub fn current(&self) -> Option<TrackInfo> {
        self.queue.lock().current.clone()
    }

    // ── Flags ────────────────────────────────────────────────────────────────

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn request_skip(&self) {
        self.skip_requested.store(true, Ordering::Release);
    }

    pub fn skip_requested(&self) -> bool {
        self.skip_requested.load(Ordering::Acquire)
    }

    /// Stores the clamped gain and returns what was stored.
    pub fn set_volume(&self, volume: f32) -> f32 {
        let volume = clamp_volume(volume);
        self.volume.store(volume.to_bits(), Ordering::Release);
        volume
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Acquire))
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let (queue_length, current, upcoming) = {
            let queue = self.queue.lock();
            (
                queue.tracks.len(),
                queue.current.clone(),
                queue.tracks.iter().map(|t| t.info.clone()).collect(),
            )
        };

        StateSnapshot {
            guild_id: self.guild_id,
            channel_id: self.channel_id,
            queue_length,
            current,
            upcoming,
            paused: self.is_paused(),
            volume: self.volume(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{audio::track::TrackSource, player::testing::RecordingTransport};

    fn track(title: &str) -> Track {
        Track::new(title, "tester", None, TrackSource::Memory(Default::default()))
    }

    fn state() -> GuildPlaybackState {
        let transport = RecordingTransport::new();
        GuildPlaybackState::new(GuildId(1), ChannelId(2), transport.connection(), 1.0)
    }

    #[test]
    fn begin_next_sets_current_and_clears_skip() {
        let state = state();
        state.enqueue(track("a"));
        state.enqueue(track("b"));
        state.request_skip();

        let next = state.begin_next().expect("track");
        assert_eq!(next.title(), "a");
        assert!(!state.skip_requested());

        let snap = state.snapshot();
        assert_eq!(snap.queue_length, 1);
        assert_eq!(snap.current.map(|t| t.title), Some("a".to_string()));

        state.finish_current();
        assert!(state.current().is_none());
    }

    #[test]
    fn clear_leaves_current_alone() {
        let state = state();
        for t in ["a", "b", "c"] {
            state.enqueue(track(t));
        }
        state.begin_next();

        let cleared = state.clear();
        assert_eq!(cleared.len(), 2);
        assert_eq!(state.queue_len(), 0);
        assert!(state.current().is_some());
    }

    #[test]
    fn volume_round_trips_through_bits() {
        let state = state();
        assert_eq!(state.set_volume(0.35), 0.35);
        assert_eq!(state.volume(), 0.35);
        assert_eq!(state.set_volume(9.0), 2.0);
        assert_eq!(state.volume(), 2.0);
    }

    #[test]
    fn shuffle_keeps_every_track() {
        let state = state();
        for i in 0..20 {
            state.enqueue(track(&i.to_string()));
        }
        assert_eq!(state.shuffle(), 20);

        let mut titles: Vec<_> = state.snapshot().upcoming.into_iter().map(|t| t.title).collect();
        titles.sort_by_key(|t| t.parse::<u32>().unwrap_or_default());
        let expected: Vec<_> = (0..20).map(|i: u32| i.to_string()).collect();
        assert_eq!(titles, expected);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let state = state();
        state.enqueue(track("a"));
        let json = serde_json::to_value(state.snapshot()).expect("json");
        assert_eq!(json["guildId"], 1);
        assert_eq!(json["channelId"], 2);
        assert_eq!(json["queueLength"], 1);
        assert_eq!(json["upcoming"][0]["title"], "a");
        assert_eq!(json["paused"], false);
    }
}
