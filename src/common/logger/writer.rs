use std::{
    fs::{File, OpenOptions},
    io::{self, BufRead, BufReader, Write},
    path::PathBuf,
    sync::Arc,
};

use parking_lot::Mutex;
use tracing_subscriber::fmt;

/// Appends log output to a file and periodically drops the oldest lines so
/// the file stays under `max_lines`.
#[derive(Clone)]
pub(crate) struct TrimmingFileWriter {
    path: PathBuf,
    max_lines: usize,
    lines_since_trim: Arc<Mutex<usize>>,
}

impl TrimmingFileWriter {
    pub(crate) fn new(path: impl Into<PathBuf>, max_lines: u32) -> Self {
        Self {
            path: path.into(),
            max_lines: max_lines.max(1) as usize,
            lines_since_trim: Arc::new(Mutex::new(0)),
        }
    }

    fn trim_threshold(&self) -> usize {
        (self.max_lines / 10).max(50)
    }

    fn trim(&self) -> io::Result<()> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        let lines: Vec<String> = BufReader::new(file).lines().collect::<Result<_, _>>()?;
        if lines.len() <= self.max_lines {
            return Ok(());
        }

        let mut out = File::create(&self.path)?;
        for line in &lines[lines.len() - self.max_lines..] {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }
}

impl Write for TrimmingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?
            .write_all(buf)?;

        let mut pending = self.lines_since_trim.lock();
        *pending += buf.iter().filter(|&&b| b == b'\n').count();
        if *pending >= self.trim_threshold() {
            if let Err(e) = self.trim() {
                eprintln!("Failed to trim log file {}: {}", self.path.display(), e);
            }
            *pending = 0;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> fmt::MakeWriter<'a> for TrimmingFileWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
