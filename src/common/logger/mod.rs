use std::{fs, path::Path};

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub mod formatter;
pub mod writer;

pub use formatter::LineFormatter;
pub(crate) use writer::TrimmingFileWriter;

use crate::configs::LoggingConfig;

const DEFAULT_LEVEL: &str = "info";

/// Builds the filter directive from the configured level plus extra
/// per-target filters, e.g. `info,guildtune::player=debug`.
fn filter_directive(logging: Option<&LoggingConfig>) -> String {
    let level = logging
        .and_then(|l| l.level.as_deref())
        .unwrap_or(DEFAULT_LEVEL);

    match logging.and_then(|l| l.filters.as_deref()) {
        Some(filters) if !filters.trim().is_empty() => format!("{level},{filters}"),
        _ => level.to_string(),
    }
}

/// Installs the global tracing subscriber. `RUST_LOG` wins over the config.
pub fn init(logging: Option<&LoggingConfig>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(logging)));

    let stdout_layer = fmt::layer().event_format(LineFormatter::new(true));

    let file_layer = logging.and_then(|l| l.file.as_ref()).map(|file| {
        if let Some(parent) = Path::new(&file.path).parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Failed to create log directory {}: {}", parent.display(), e);
            }
        }

        fmt::layer()
            .event_format(LineFormatter::new(false))
            .with_writer(TrimmingFileWriter::new(&file.path, file.max_lines))
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();
}
