//! Consumers of a finished ping session's samples

use chrono::Local;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, warn};

/// Receives the raw latency samples (milliseconds, in order) of a ping session.
///
/// Sinks handle their own failures; nothing is returned to the ping loop.
pub trait LatencySink {
    fn consume(&self, samples: &[f64]);
}

/// Writes a timestamp line followed by one sample per line.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    path: PathBuf,
}

impl OutputWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn write(&self, samples: &[f64]) -> io::Result<()> {
        let mut file = BufWriter::new(File::create(&self.path)?);
        writeln!(file, "{}", Local::now().format("%d %B %Y, %I:%M:%S %p"))?;
        for sample in samples {
            writeln!(file, "{}", sample)?;
        }
        file.flush()
    }
}

impl LatencySink for OutputWriter {
    fn consume(&self, samples: &[f64]) {
        match self.write(samples) {
            Ok(()) => info!(path = %self.path.display(), samples = samples.len(), "Data exported to file."),
            Err(e) => warn!(path = %self.path.display(), "Failed to export data: {}", e),
        }
    }
}
