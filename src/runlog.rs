//! Append-only per-node run log (`routing-output_<label>.txt`).
//!
//! Every DATA packet this node touches — whether delivered locally or
//! forwarded on — gets one line: the wall-clock timestamp, the packet's
//! original source and destination labels, this node's own port, and the
//! port the packet arrived from (the previous hop).

use crate::error::ConfigError;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct RunLog {
    file: File,
    path: PathBuf,
}

impl RunLog {
    /// Open (creating if absent, appending if present) the log file for
    /// `label` inside `dir`.
    pub fn open(dir: &Path, label: char) -> Result<Self, ConfigError> {
        let path = dir.join(format!("routing-output_{label}.txt"));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| ConfigError::RunLog { path: path.clone(), source })?;
        Ok(Self { file, path })
    }

    /// Record a DATA packet's arrival and disposition.
    pub fn record(
        &mut self,
        source_label: char,
        dest_label: char,
        arrival_port: u16,
        prev_port: u16,
    ) -> Result<(), ConfigError> {
        let timestamp = chrono::Local::now().format("%a %b %e %T %Y");
        writeln!(
            self.file,
            "Timestamp {timestamp} sourceID {source_label} destID {dest_label} arrivalPort {arrival_port} prevPort {prev_port}"
        )
        .map_err(|source| ConfigError::RunLog { path: self.path.clone(), source })
    }
}
