use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VoiceConfig {
    /// Directory the loopback transport writes per-guild PCM into.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "./voice-out".to_string()
}
