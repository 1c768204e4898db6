use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info};

use super::{
    scheduler::PlaybackWorker,
    state::{GuildPlaybackState, StateSnapshot},
};
use crate::{
    audio::{
        source::SourceOpener,
        track::{Track, TrackInfo},
    },
    common::types::{ChannelId, GuildId},
    configs::PlayerConfig,
    voice::{VoiceError, VoiceTransport},
};

/// A joined guild: its shared state plus the worker streaming it.
pub struct GuildPlayer {
    pub state: Arc<GuildPlaybackState>,
    worker: PlaybackWorker,
}

/// Registry of joined guilds, owned by whoever builds the service.
pub type PlayerMap = DashMap<GuildId, GuildPlayer>;

#[derive(Debug, Error)]
pub enum JoinError {
    #[error("already connected in guild {0}")]
    AlreadyConnected(GuildId),
    #[error("could not connect to voice: {0}")]
    ConnectFailed(#[source] VoiceError),
}

/// Thread-safe control surface over every guild's player.
///
/// Cheap operations (flags, queue edits) touch only the guild's own state and
/// never hold a map shard across I/O.
pub struct AudioService {
    players: Arc<PlayerMap>,
    /// Guilds with a `join` in flight; keeps a second join from racing the
    /// voice connect.
    joining: DashSet<GuildId>,
    transport: Arc<dyn VoiceTransport>,
    opener: Arc<dyn SourceOpener>,
    config: Arc<PlayerConfig>,
}

struct JoinReservation<'a> {
    joining: &'a DashSet<GuildId>,
    guild_id: GuildId,
}

impl Drop for JoinReservation<'_> {
    fn drop(&mut self) {
        self.joining.remove(&self.guild_id);
    }
}

impl AudioService {
    pub fn new(
        players: Arc<PlayerMap>,
        transport: Arc<dyn VoiceTransport>,
        opener: Arc<dyn SourceOpener>,
        config: PlayerConfig,
    ) -> Self {
        Self {
            players,
            joining: DashSet::new(),
            transport,
            opener,
            config: Arc::new(config),
        }
    }

    /// Connects to `channel_id` and starts the guild's scheduler.
    pub async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<(), JoinError> {
        if !self.joining.insert(guild_id) {
            return Err(JoinError::AlreadyConnected(guild_id));
        }
        let _reservation = JoinReservation {
            joining: &self.joining,
            guild_id,
        };
        if self.players.contains_key(&guild_id) {
            return Err(JoinError::AlreadyConnected(guild_id));
        }

        let connection = self
            .transport
            .connect(guild_id, channel_id)
            .await
            .map_err(JoinError::ConnectFailed)?;

        let state = Arc::new(GuildPlaybackState::new(
            guild_id,
            channel_id,
            connection,
            self.config.initial_volume(),
        ));
        let worker = PlaybackWorker::spawn(state.clone(), self.opener.clone(), self.config.clone());
        self.players.insert(guild_id, GuildPlayer { state, worker });

        info!("Joined guild {} in channel {}", guild_id, channel_id);
        Ok(())
    }

    /// Tears the guild down without waiting for its worker. No-op if the
    /// guild was never joined.
    pub async fn leave(&self, guild_id: GuildId) {
        self.detach(guild_id).await;
    }

    /// Like [`leave`](Self::leave), then waits for the worker to exit.
    pub async fn leave_and_wait(&self, guild_id: GuildId) {
        if let Some(worker) = self.detach(guild_id).await {
            worker.join().await;
        }
    }

    /// Leaves every guild and waits for all workers.
    pub async fn shutdown(&self) {
        let guilds = self.guilds();
        let mut workers = Vec::with_capacity(guilds.len());
        for guild_id in guilds {
            if let Some(worker) = self.detach(guild_id).await {
                workers.push(worker.join());
            }
        }
        let count = workers.len();
        join_all(workers).await;
        info!("Audio service stopped ({} guilds)", count);
    }

    async fn detach(&self, guild_id: GuildId) -> Option<PlaybackWorker> {
        let (_, player) = self.players.remove(&guild_id)?;
        player.worker.cancel();

        for track in player.state.clear() {
            track.release().await;
        }
        player.state.connection().disconnect().await;

        info!("Left guild {}", guild_id);
        Some(player.worker)
    }

    /// Appends `track` to the guild's queue. Returns `false` (and releases
    /// the track) when the guild is not joined.
    pub fn enqueue(&self, guild_id: GuildId, track: Track) -> bool {
        let Some(player) = self.players.get(&guild_id) else {
            debug!("Guild {}: not joined, dropping '{}'", guild_id, track.title());
            track.release_detached();
            return false;
        };

        let title = track.info.title.clone();
        let len = player.state.enqueue(track);
        debug!("Guild {}: queued '{}' at position {}", guild_id, title, len);
        true
    }

    pub fn skip(&self, guild_id: GuildId) {
        self.with_state(guild_id, |s| s.request_skip());
    }

    pub fn pause(&self, guild_id: GuildId) {
        self.with_state(guild_id, |s| s.set_paused(true));
    }

    pub fn resume(&self, guild_id: GuildId) {
        self.with_state(guild_id, |s| s.set_paused(false));
    }

    /// Empties the pending queue; the current track keeps playing. Returns
    /// how many tracks were dropped.
    pub fn clear_queue(&self, guild_id: GuildId) -> usize {
        let cleared = self.with_state(guild_id, |s| s.clear()).unwrap_or_default();
        let count = cleared.len();
        for track in cleared {
            track.release_detached();
        }
        count
    }

    pub fn set_volume(&self, guild_id: GuildId, volume: f32) {
        self.with_state(guild_id, |s| s.set_volume(volume));
    }

    pub fn shuffle(&self, guild_id: GuildId) -> usize {
        self.with_state(guild_id, |s| s.shuffle()).unwrap_or(0)
    }

    /// Removes the pending track at 1-based `position`.
    pub fn remove(&self, guild_id: GuildId, position: usize) -> Option<TrackInfo> {
        let index = position.checked_sub(1)?;
        let track = self.with_state(guild_id, |s| s.remove(index)).flatten()?;
        let info = track.info.clone();
        track.release_detached();
        Some(info)
    }

    pub fn get_state(&self, guild_id: GuildId) -> Option<StateSnapshot> {
        self.with_state(guild_id, |s| s.snapshot())
    }

    pub fn guilds(&self) -> Vec<GuildId> {
        let mut guilds: Vec<GuildId> = self.players.iter().map(|p| *p.key()).collect();
        guilds.sort();
        guilds
    }

    pub fn snapshots(&self) -> Vec<StateSnapshot> {
        let mut snapshots: Vec<StateSnapshot> =
            self.players.iter().map(|p| p.state.snapshot()).collect();
        snapshots.sort_by_key(|s| s.guild_id);
        snapshots
    }

    fn with_state<R>(
        &self,
        guild_id: GuildId,
        f: impl FnOnce(&GuildPlaybackState) -> R,
    ) -> Option<R> {
        self.players.get(&guild_id).map(|p| f(&p.state))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::player::testing::{RecordingTransport, SyntheticOpener, test_config, wait_until};

    const G: GuildId = GuildId(1);
    const A: ChannelId = ChannelId(100);

    fn service(
        transport: &RecordingTransport,
        opener: &SyntheticOpener,
        realtime: bool,
    ) -> AudioService {
        AudioService::new(
            Arc::new(PlayerMap::new()),
            Arc::new(transport.clone()),
            Arc::new(opener.clone()),
            test_config(realtime),
        )
    }

    fn current_title(service: &AudioService) -> Option<String> {
        service
            .get_state(G)
            .and_then(|s| s.current)
            .map(|t| t.title)
    }

    #[tokio::test]
    async fn tracks_play_in_fifo_order() {
        let transport = RecordingTransport::new();
        let opener = SyntheticOpener::new(3);
        let service = service(&transport, &opener, false);

        service.join(G, A).await.expect("join");
        for title in ["first", "second", "third"] {
            assert!(service.enqueue(G, opener.track(title)));
        }

        assert!(wait_until(Duration::from_secs(2), || transport.flushes() == 3).await);
        assert_eq!(opener.opened(), vec!["first", "second", "third"]);
        for seq in 0..3 {
            assert_eq!(transport.chunk_indices_for(seq), vec![0, 1, 2]);
        }

        service.shutdown().await;
    }

    #[tokio::test]
    async fn second_join_is_rejected() {
        let transport = RecordingTransport::new();
        let opener = SyntheticOpener::new(1);
        let service = service(&transport, &opener, false);

        service.join(G, A).await.expect("join");
        let err = service.join(G, ChannelId(200)).await.expect_err("second join");

        assert!(matches!(err, JoinError::AlreadyConnected(GuildId(1))));
        assert_eq!(transport.connects(), 1);
        assert_eq!(service.guilds(), vec![G]);

        service.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_joins_admit_exactly_one() {
        let transport = RecordingTransport::new();
        let opener = SyntheticOpener::new(1);
        let service = Arc::new(service(&transport, &opener, false));

        for guild in 1..=20u64 {
            let joins: Vec<_> = (0..16)
                .map(|i| {
                    let service = service.clone();
                    tokio::spawn(async move {
                        service.join(GuildId(guild), ChannelId(i)).await
                    })
                })
                .collect();

            let mut admitted = 0;
            for join in join_all(joins).await {
                match join.expect("join task") {
                    Ok(()) => admitted += 1,
                    Err(JoinError::AlreadyConnected(g)) => assert_eq!(g, GuildId(guild)),
                    Err(e) => panic!("unexpected join error: {e}"),
                }
            }
            assert_eq!(admitted, 1, "guild {guild}");
        }

        assert_eq!(transport.connects(), 20);
        assert_eq!(service.guilds().len(), 20);
        service.shutdown().await;
    }

    #[tokio::test]
    async fn failed_connect_registers_nothing() {
        let transport = RecordingTransport::new();
        let opener = SyntheticOpener::new(1);
        let service = service(&transport, &opener, false);

        transport.set_fail_connect(true);
        let err = service.join(G, A).await.expect_err("connect fails");
        assert!(matches!(
            err,
            JoinError::ConnectFailed(VoiceError::PermissionDenied(_))
        ));
        assert!(service.get_state(G).is_none());

        transport.set_fail_connect(false);
        service.join(G, A).await.expect("retry succeeds");
        service.shutdown().await;
    }

    #[tokio::test]
    async fn leave_is_idempotent() {
        let transport = RecordingTransport::new();
        let opener = SyntheticOpener::new(1);
        let service = service(&transport, &opener, false);

        service.leave(G).await;

        service.join(G, A).await.expect("join");
        service.leave(G).await;
        service.leave(G).await;

        assert!(service.get_state(G).is_none());
        assert_eq!(transport.disconnects(), 1);

        service.join(G, A).await.expect("rejoin after leave");
        service.shutdown().await;
    }

    #[tokio::test]
    async fn volume_is_clamped() {
        let transport = RecordingTransport::new();
        let opener = SyntheticOpener::new(1);
        let service = service(&transport, &opener, false);
        service.join(G, A).await.expect("join");

        service.set_volume(G, 5.0);
        assert_eq!(service.get_state(G).map(|s| s.volume), Some(2.0));

        service.set_volume(G, -1.0);
        assert_eq!(service.get_state(G).map(|s| s.volume), Some(0.0));

        service.shutdown().await;
    }

    #[tokio::test]
    async fn calls_on_unknown_guild_are_ignored() {
        let transport = RecordingTransport::new();
        let opener = SyntheticOpener::new(1);
        let service = service(&transport, &opener, false);
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("orphan.mp3");
        std::fs::write(&path, b"x").expect("write");

        assert!(!service.enqueue(G, opener.temp_track("orphan", path.clone())));
        service.skip(G);
        service.pause(G);
        service.resume(G);
        service.set_volume(G, 1.5);
        assert_eq!(service.clear_queue(G), 0);
        assert_eq!(service.shuffle(G), 0);
        assert!(service.remove(G, 1).is_none());
        assert!(service.get_state(G).is_none());
        assert!(wait_until(Duration::from_secs(1), || !path.exists()).await);
    }

    #[tokio::test]
    async fn pause_freezes_and_resume_continues() {
        let transport = RecordingTransport::new();
        let opener = SyntheticOpener::new(10_000);
        let service = service(&transport, &opener, true);

        service.join(G, A).await.expect("join");
        service.enqueue(G, opener.track("long"));
        assert!(wait_until(Duration::from_secs(2), || transport.chunk_count() >= 3).await);

        service.pause(G);
        tokio::time::sleep(Duration::from_millis(100)).await;
        let frozen = transport.chunk_count();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(transport.chunk_count(), frozen);
        assert_eq!(service.get_state(G).map(|s| s.paused), Some(true));

        service.resume(G);
        assert!(wait_until(Duration::from_secs(2), || transport.chunk_count() >= frozen + 3).await);

        // No chunk lost or repeated across the pause.
        let indices = transport.chunk_indices_for(0);
        let expected: Vec<i16> = (0..indices.len() as i16).collect();
        assert_eq!(indices, expected);

        service.shutdown().await;
    }

    #[tokio::test]
    async fn skip_moves_on_promptly() {
        let transport = RecordingTransport::new();
        let opener = SyntheticOpener::new(10_000);
        let service = service(&transport, &opener, true);

        service.join(G, A).await.expect("join");
        service.enqueue(G, opener.track("long"));
        service.enqueue(G, opener.track("next"));
        assert!(wait_until(Duration::from_secs(2), || transport.chunk_count() >= 2).await);

        service.skip(G);
        assert!(
            wait_until(Duration::from_secs(1), || {
                current_title(&service).as_deref() == Some("next")
            })
            .await
        );
        assert!(transport.chunk_indices_for(0).len() < 100);

        service.shutdown().await;
    }

    #[tokio::test]
    async fn temp_files_are_removed_on_every_exit() {
        let transport = RecordingTransport::new();
        let opener = SyntheticOpener::new(10_000);
        let service = service(&transport, &opener, true);
        let dir = tempfile::tempdir().expect("tempdir");
        let file = |name: &str| {
            let path = dir.path().join(name);
            std::fs::write(&path, b"x").expect("write");
            path
        };
        let skipped = file("skipped.mp3");
        let playing = file("playing.mp3");
        let queued = file("queued.mp3");

        service.join(G, A).await.expect("join");
        service.enqueue(G, opener.temp_track("skipped", skipped.clone()));
        assert!(wait_until(Duration::from_secs(2), || transport.chunk_count() >= 1).await);
        service.skip(G);
        assert!(wait_until(Duration::from_secs(1), || !skipped.exists()).await);

        service.enqueue(G, opener.temp_track("playing", playing.clone()));
        service.enqueue(G, opener.temp_track("queued", queued.clone()));
        assert!(
            wait_until(Duration::from_secs(2), || {
                current_title(&service).as_deref() == Some("playing")
            })
            .await
        );

        service.leave_and_wait(G).await;
        assert!(!playing.exists());
        assert!(!queued.exists());
    }

    #[tokio::test]
    async fn finished_track_releases_its_file() {
        let transport = RecordingTransport::new();
        let opener = SyntheticOpener::new(2);
        let service = service(&transport, &opener, false);
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("done.mp3");
        std::fs::write(&path, b"x").expect("write");

        service.join(G, A).await.expect("join");
        service.enqueue(G, opener.temp_track("done", path.clone()));

        assert!(wait_until(Duration::from_secs(2), || !path.exists()).await);
        assert_eq!(transport.chunk_count(), 2);
        service.shutdown().await;
    }

    #[tokio::test]
    async fn queue_edits() {
        let transport = RecordingTransport::new();
        let opener = SyntheticOpener::new(1);
        let service = service(&transport, &opener, false);
        let dir = tempfile::tempdir().expect("tempdir");

        service.join(G, A).await.expect("join");
        service.pause(G);
        for i in 1..=5 {
            let path = dir.path().join(format!("{i}.mp3"));
            std::fs::write(&path, b"x").expect("write");
            service.enqueue(G, opener.temp_track(&i.to_string(), path));
        }

        assert_eq!(service.shuffle(G), 5);
        let upcoming = service.get_state(G).expect("state").upcoming;
        assert_eq!(upcoming.len(), 5);

        assert!(service.remove(G, 0).is_none());
        assert!(service.remove(G, 6).is_none());
        let removed = service.remove(G, 1).expect("removed");
        assert_eq!(removed, upcoming[0]);
        let removed_path = dir.path().join(format!("{}.mp3", removed.title));
        assert!(wait_until(Duration::from_secs(1), || !removed_path.exists()).await);

        assert_eq!(service.clear_queue(G), 4);
        assert_eq!(service.get_state(G).map(|s| s.queue_length), Some(0));
        assert!(
            wait_until(Duration::from_secs(1), || {
                std::fs::read_dir(dir.path()).map_or(false, |d| d.count() == 0)
            })
            .await
        );
        assert!(opener.opened().is_empty());

        service.shutdown().await;
    }

    #[tokio::test]
    async fn join_enqueue_skip_leave_scenario() {
        let transport = RecordingTransport::new();
        let opener = SyntheticOpener::new(10_000);
        let service = service(&transport, &opener, true);

        service.join(G, A).await.expect("join");
        service.pause(G);
        service.enqueue(G, opener.track("x"));
        service.enqueue(G, opener.track("y"));

        let state = service.get_state(G).expect("state");
        assert_eq!(state.queue_length, 2);
        assert!(state.current.is_none());

        service.resume(G);
        assert!(
            wait_until(Duration::from_secs(2), || {
                current_title(&service).as_deref() == Some("x")
            })
            .await
        );
        assert_eq!(service.get_state(G).map(|s| s.queue_length), Some(1));

        service.skip(G);
        assert!(
            wait_until(Duration::from_secs(1), || {
                current_title(&service).as_deref() == Some("y")
            })
            .await
        );

        service.leave(G).await;
        assert!(service.get_state(G).is_none());
    }

    #[tokio::test]
    async fn shutdown_waits_for_every_guild() {
        let transport = RecordingTransport::new();
        let opener = SyntheticOpener::new(10_000);
        let service = service(&transport, &opener, true);

        for g in 1..=3 {
            service.join(GuildId(g), ChannelId(g)).await.expect("join");
            service.enqueue(GuildId(g), opener.track(&format!("g{g}")));
        }
        assert!(wait_until(Duration::from_secs(2), || opener.opened().len() == 3).await);

        tokio::time::timeout(Duration::from_secs(2), service.shutdown())
            .await
            .expect("shutdown completes");

        assert!(service.snapshots().is_empty());
        assert_eq!(transport.disconnects(), 3);
        assert_eq!(transport.flushes(), 3);
    }
}
