//! Append-only CSV log of trial results.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::Result;
use crate::experiment::TrialResult;

pub const HEADER: [&str; 5] = [
    "Timestamp",
    "Waveform",
    "Frequency (Hz)",
    "Amplitude (Vpp)",
    "Measured Voltage (V)",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// CSV log file. The file is opened and closed on every append; the header is
/// written only when the file is absent or empty. Assumes a single writer.
#[derive(Debug, Clone)]
pub struct TrialLog {
    path: PathBuf,
}

impl TrialLog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        TrialLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the header if the store is fresh, without adding a row.
    pub fn init(&self) -> Result<()> {
        self.open_and_write(None)
    }

    pub fn append(&self, result: &TrialResult) -> Result<()> {
        self.open_and_write(Some(result))
    }

    fn open_and_write(&self, result: Option<&TrialResult>) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let fresh = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if fresh {
            debug!("Writing header to {}", self.path.display());
            writer.write_record(HEADER)?;
        }
        if let Some(result) = result {
            writer.write_record(row(result))?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn row(result: &TrialResult) -> [String; 5] {
    [
        result.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        result.config.waveform.to_string(),
        result.config.frequency_hz.to_string(),
        result.config.amplitude_vpp.to_string(),
        result.measurement.to_string(),
    ]
}
