//! Remote tracks via the `yt-dlp` command-line tool.
//!
//! URLs are passed through as-is; anything else becomes a `ytsearch1:` query.
//! The audio is downloaded to the temp dir as mp3 and owned by the resulting
//! track, which deletes it once played.

use std::{
    path::{Path, PathBuf},
    process::Stdio,
    sync::OnceLock,
    time::Duration,
};

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    audio::track::{Track, TrackSource},
    sources::{ResolveError, TrackResolver},
};

const TOOL: &str = "yt-dlp";

fn url_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").ok())
        .as_ref()
}

/// The subset of `--dump-json` output we use.
#[derive(Debug, Deserialize)]
struct VideoInfo {
    title: Option<String>,
    duration: Option<f64>,
    webpage_url: Option<String>,
}

pub struct YtDlpSource {
    binary: String,
    temp_dir: PathBuf,
}

impl YtDlpSource {
    pub fn new(binary: impl Into<String>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            temp_dir: temp_dir.into(),
        }
    }

    pub fn is_url(query: &str) -> bool {
        url_regex().is_some_and(|re| re.is_match(query))
    }

    fn target(query: &str) -> String {
        if Self::is_url(query) {
            query.to_string()
        } else {
            format!("ytsearch1:{query}")
        }
    }

    /// Picks the first entry from `--dump-json` output (one JSON object per
    /// line; searches can yield several).
    fn parse_info(stdout: &[u8]) -> Result<Option<VideoInfo>, ResolveError> {
        let text = String::from_utf8_lossy(stdout);
        match text.lines().map(str::trim).find(|l| !l.is_empty()) {
            Some(line) => Ok(Some(serde_json::from_str(line)?)),
            None => Ok(None),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<Vec<u8>, ResolveError> {
        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ResolveError::Tool {
                tool: TOOL,
                message: format!("could not start '{}': {}", self.binary, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResolveError::Tool {
                tool: TOOL,
                message: stderr.lines().last().unwrap_or("unknown error").trim().to_string(),
            });
        }

        Ok(output.stdout)
    }

    async fn download(&self, target: &str, path: &Path) -> Result<(), ResolveError> {
        let out = path.to_string_lossy();
        let args = [
            "-f",
            "bestaudio",
            "--extract-audio",
            "--audio-format",
            "mp3",
            "--no-playlist",
            "-o",
            out.as_ref(),
            target,
        ];

        if let Err(e) = self.run(&args).await {
            remove_quietly(path);
            return Err(e);
        }

        if !path.is_file() {
            return Err(ResolveError::Tool {
                tool: TOOL,
                message: format!("no output file at {}", path.display()),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl TrackResolver for YtDlpSource {
    fn name(&self) -> &str {
        TOOL
    }

    fn can_handle(&self, query: &str) -> bool {
        !query.is_empty() && !query.starts_with("file://")
    }

    async fn resolve(&self, query: &str, requester: &str) -> Result<Track, ResolveError> {
        let target = Self::target(query);
        debug!("{}: looking up '{}'", TOOL, target);

        let stdout = self.run(&["--dump-json", "--no-playlist", target.as_str()]).await?;
        let info = Self::parse_info(&stdout)?
            .ok_or_else(|| ResolveError::NotFound(query.to_string()))?;

        tokio::fs::create_dir_all(&self.temp_dir).await?;
        let path = self.temp_dir.join(format!("{}.mp3", Uuid::new_v4()));
        let source_url = info.webpage_url.as_deref().unwrap_or(&target);
        self.download(source_url, &path).await?;

        let title = info.title.unwrap_or_else(|| "Unknown Title".to_string());
        info!("{}: downloaded '{}' to {}", TOOL, title, path.display());

        Ok(Track::new(
            title,
            requester,
            info.duration
                .filter(|d| d.is_finite() && *d >= 0.0)
                .map(Duration::from_secs_f64),
            TrackSource::TempFile(path),
        ))
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove partial download {}: {}", path.display(), e);
        }
    }
}

/// Deletes every file left in `dir` by an earlier run. Returns how many were
/// removed. A missing directory counts as clean.
pub fn cleanup_temp_files(dir: &Path) -> usize {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
        Err(e) => {
            warn!("Could not read temp dir {}: {}", dir.display(), e);
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => debug!("Skipping {}: {}", path.display(), e),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_pass_through_and_text_becomes_search() {
        assert_eq!(
            YtDlpSource::target("https://www.youtube.com/watch?v=abc"),
            "https://www.youtube.com/watch?v=abc"
        );
        assert_eq!(YtDlpSource::target("lofi beats"), "ytsearch1:lofi beats");
        assert!(!YtDlpSource::is_url("ftp://example.com/a.mp3"));
        assert!(!YtDlpSource::is_url("https://"));
    }

    #[test]
    fn handles_everything_but_local_files() {
        let source = YtDlpSource::new("yt-dlp", std::env::temp_dir());
        assert!(source.can_handle("some song"));
        assert!(source.can_handle("https://youtu.be/abc"));
        assert!(!source.can_handle(""));
        assert!(!source.can_handle("file:///music/a.mp3"));
    }

    #[test]
    fn parses_first_json_line() {
        let stdout = br#"
{"title": "First", "duration": 212.5, "webpage_url": "https://example.com/1", "uploader": "x"}
{"title": "Second", "duration": 10}
"#;
        let info = YtDlpSource::parse_info(stdout).expect("parse").expect("entry");
        assert_eq!(info.title.as_deref(), Some("First"));
        assert_eq!(info.duration, Some(212.5));
        assert_eq!(info.webpage_url.as_deref(), Some("https://example.com/1"));

        assert!(YtDlpSource::parse_info(b"\n\n").expect("parse").is_none());
        assert!(YtDlpSource::parse_info(b"not json").is_err());
    }

    #[tokio::test]
    async fn missing_binary_is_a_tool_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = YtDlpSource::new("/nonexistent/guildtune-yt-dlp", dir.path());
        let err = source.resolve("anything", "u").await.expect_err("no binary");
        assert!(matches!(err, ResolveError::Tool { tool: "yt-dlp", .. }));
    }

    #[test]
    fn cleanup_removes_leftovers() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["a.mp3", "b.mp3", "c.part"] {
            std::fs::write(dir.path().join(name), b"x").expect("write");
        }
        std::fs::create_dir(dir.path().join("nested")).expect("mkdir");

        assert_eq!(cleanup_temp_files(dir.path()), 3);
        assert_eq!(cleanup_temp_files(dir.path()), 0);
        assert_eq!(cleanup_temp_files(&dir.path().join("missing")), 0);
    }
}
