use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unsupported or corrupt audio stream: {0}")]
    Probe(#[from] symphonia::core::errors::Error),
    #[error("no decodable audio track in stream")]
    NoAudioTrack,
    #[error("decoding failed: {0}")]
    Decode(String),
    #[error("failed to start decoder thread: {0}")]
    Spawn(#[source] io::Error),
}
