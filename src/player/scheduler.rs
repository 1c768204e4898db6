use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{playback::stream_track, state::GuildPlaybackState};
use crate::{audio::source::SourceOpener, configs::PlayerConfig};

/// Owns one guild's scheduler task.
///
/// Dropping the worker detaches the task; it still exits once the guild's
/// token is cancelled.
pub struct PlaybackWorker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl PlaybackWorker {
    pub fn spawn(
        state: Arc<GuildPlaybackState>,
        opener: Arc<dyn SourceOpener>,
        config: Arc<PlayerConfig>,
    ) -> Self {
        let cancel = state.cancel_token().clone();
        let handle = tokio::spawn(run(state, opener, config));
        Self { cancel, handle }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the task to exit. Does not cancel it.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            warn!("Playback worker ended abnormally: {}", e);
        }
    }
}

async fn run(
    state: Arc<GuildPlaybackState>,
    opener: Arc<dyn SourceOpener>,
    config: Arc<PlayerConfig>,
) {
    let guild_id = state.guild_id();
    let cancel = state.cancel_token().clone();
    debug!("Scheduler for guild {} started", guild_id);

    loop {
        if cancel.is_cancelled() {
            break;
        }

        if state.is_paused() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(config.pause_poll()) => {}
            }
            continue;
        }

        let Some(track) = state.begin_next() else {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(config.idle_poll()) => {}
            }
            continue;
        };

        info!(
            "Guild {}: playing '{}' (requested by {})",
            guild_id, track.info.title, track.info.requester
        );

        match stream_track(&state, opener.as_ref(), &config, &track).await {
            Ok(end) => info!("Guild {}: '{}' {}", guild_id, track.info.title, end),
            Err(e) => warn!("Guild {}: abandoning '{}': {}", guild_id, track.info.title, e),
        }

        track.release().await;
        state.finish_current();
    }

    debug!("Scheduler for guild {} stopped", guild_id);
}
