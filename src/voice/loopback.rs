//! File-backed voice transport.
//!
//! Every joined guild gets `<output_dir>/<guild>-<channel>.pcm`, truncated on
//! connect, with each track's PCM appended in play order. Handy for running
//! the service without a chat platform and for checking output with
//! `ffplay -f s16le -ar 48000 -ac 2`.

use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use tokio::{
    fs::{File, OpenOptions},
    io::AsyncWriteExt,
};
use tracing::{debug, info};

use super::{PcmSink, VoiceConnection, VoiceError, VoiceTransport};
use crate::common::types::{ChannelId, GuildId};

pub struct LoopbackTransport {
    output_dir: PathBuf,
}

impl LoopbackTransport {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl VoiceTransport for LoopbackTransport {
    async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Arc<dyn VoiceConnection>, VoiceError> {
        let connect_err = |e: std::io::Error| VoiceError::Connect {
            channel: channel_id,
            reason: e.to_string(),
        };

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(connect_err)?;

        let path = self.output_dir.join(format!("{guild_id}-{channel_id}.pcm"));
        File::create(&path).await.map_err(connect_err)?;

        info!("Loopback voice for guild {} -> {}", guild_id, path.display());

        Ok(Arc::new(LoopbackConnection {
            guild_id,
            path,
            closed: Arc::new(AtomicBool::new(false)),
        }))
    }
}

struct LoopbackConnection {
    guild_id: GuildId,
    path: PathBuf,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl VoiceConnection for LoopbackConnection {
    fn create_pcm_sink(&self) -> Box<dyn PcmSink> {
        Box::new(LoopbackSink {
            path: self.path.clone(),
            file: None,
            closed: self.closed.clone(),
        })
    }

    async fn disconnect(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!("Loopback voice for guild {} closed", self.guild_id);
        }
    }
}

struct LoopbackSink {
    path: PathBuf,
    file: Option<File>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl PcmSink for LoopbackSink {
    async fn send(&mut self, pcm: &[u8]) -> Result<(), VoiceError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(VoiceError::Closed);
        }

        if self.file.is_none() {
            let file = OpenOptions::new()
                .append(true)
                .create(true)
                .open(&self.path)
                .await?;
            self.file = Some(file);
        }

        if let Some(file) = self.file.as_mut() {
            file.write_all(pcm).await?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), VoiceError> {
        if let Some(file) = self.file.as_mut() {
            file.flush().await?;
        }
        Ok(())
    }
}
