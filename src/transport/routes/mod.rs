pub mod info;
pub mod player;
