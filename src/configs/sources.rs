use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SourcesConfig {
    #[serde(default = "default_true")]
    pub local: bool,
    #[serde(default = "default_true")]
    pub ytdlp: bool,
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: String,
    /// Where downloaded tracks are stored until they finish playing.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            local: true,
            ytdlp: true,
            ytdlp_path: default_ytdlp_path(),
            temp_dir: default_temp_dir(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_ytdlp_path() -> String {
    "yt-dlp".to_string()
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("guildtune")
}
