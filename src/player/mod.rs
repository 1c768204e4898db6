pub mod pacer;
pub mod playback;
pub mod scheduler;
pub mod service;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use playback::{PlaybackError, TrackEnd};
pub use scheduler::PlaybackWorker;
pub use service::{AudioService, GuildPlayer, JoinError, PlayerMap};
pub use state::{GuildPlaybackState, StateSnapshot};
