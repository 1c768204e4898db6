pub mod destroy;
pub mod get;
pub mod join;
pub mod queue;
pub mod update;

pub use destroy::destroy_player;
pub use get::{get_player, get_players};
pub use join::join_player;
pub use queue::{clear_queue, enqueue_track, remove_track, shuffle_queue};
pub use update::update_player;

use crate::common::{ApiError, GuildId};

pub(crate) fn player_not_found(guild_id: GuildId, path: String) -> ApiError {
    ApiError::not_found(format!("No player for guild {guild_id}"), path)
}
