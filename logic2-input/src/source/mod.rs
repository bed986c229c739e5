//! Capture row sources
//!
//! This module resolves the on-disk shape of a Logic 2 export and provides
//! readers that turn it into a stream of [`Row`]s.

use crate::types::{Result, Row, TraceError};
use std::path::{Path, PathBuf};

pub mod digital;

// Re-export reader types
pub use digital::DigitalCsv;

/// File name Logic 2 uses for the digital channel export
pub const DIGITAL_CSV: &str = "digital.csv";

/// Common trait for all row sources
///
/// A row source is a finite, single-pass sequence of rows plus the header
/// that names the channels those rows carry.
pub trait RowSource: Iterator<Item = Result<Row>> {
    /// Channel names in header order
    fn channels(&self) -> &[String];
}

/// Resolve an export path to the digital CSV file
///
/// Accepts either a directory containing `digital.csv` or the `digital.csv`
/// file itself. Anything else is a format error.
pub fn resolve_input(path: &Path) -> Result<PathBuf> {
    if path.is_dir() {
        let digital = path.join(DIGITAL_CSV);
        if !digital.is_file() {
            return Err(TraceError::FormatError(format!(
                "{} not found in export directory {:?}",
                DIGITAL_CSV, path
            )));
        }
        log::debug!("Resolved export directory {:?} to {:?}", path, digital);
        return Ok(digital);
    }

    let is_digital = path.file_name().and_then(|name| name.to_str()) == Some(DIGITAL_CSV);
    if !is_digital {
        return Err(TraceError::FormatError(format!(
            "Unsupported export shape: {:?} (expected a directory or {})",
            path, DIGITAL_CSV
        )));
    }
    if !path.is_file() {
        return Err(TraceError::FormatError(format!(
            "Capture file not found: {:?}",
            path
        )));
    }

    Ok(path.to_path_buf())
}
