//! Logic 2 digital CSV reader
//!
//! Parses `digital.csv` exports using the `csv` crate. The first row is the
//! header: a time label followed by one label per channel. Every following
//! row is a timestamp in seconds and one level per channel, where the literal
//! `1` is logic-high and anything else is logic-low.

use super::RowSource;
use crate::types::{Result, Row, TraceError, MAX_CHANNELS};
use csv::{Reader, ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Row reader over a Logic 2 digital export
pub struct DigitalCsv<R: Read> {
    reader: Reader<R>,
    channels: Vec<String>,
    record: StringRecord,
}

impl DigitalCsv<BufReader<File>> {
    /// Open a resolved `digital.csv` file and read its header
    pub fn open(path: &Path) -> Result<Self> {
        log::info!("Opening digital capture: {:?}", path);

        let file = File::open(path).map_err(|e| {
            TraceError::FormatError(format!("Failed to open capture {:?}: {}", path, e))
        })?;

        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read> DigitalCsv<R> {
    /// Wrap any reader producing digital CSV text and read its header
    pub fn from_reader(rdr: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(rdr);

        let header = reader.headers()?.clone();
        if header.is_empty() {
            return Err(TraceError::FormatError(
                "Capture has no header row".to_string(),
            ));
        }

        // First column is the time label
        let channels: Vec<String> = header.iter().skip(1).map(str::to_string).collect();
        if channels.len() > MAX_CHANNELS {
            return Err(TraceError::FormatError(format!(
                "Capture has {} channels, at most {} are supported",
                channels.len(),
                MAX_CHANNELS
            )));
        }

        log::debug!("Capture channels: {:?}", channels);

        Ok(Self {
            reader,
            channels,
            record: StringRecord::new(),
        })
    }

    fn parse_record(&self) -> Result<Row> {
        let line = self
            .record
            .position()
            .map(|pos| pos.line())
            .unwrap_or_default();

        if self.record.len() != self.channels.len() + 1 {
            return Err(TraceError::FormatError(format!(
                "Line {}: expected {} columns, found {}",
                line,
                self.channels.len() + 1,
                self.record.len()
            )));
        }

        let timestamp: f64 = self.record[0].parse().map_err(|_| {
            TraceError::FormatError(format!(
                "Line {}: invalid timestamp {:?}",
                line, &self.record[0]
            ))
        })?;
        if !timestamp.is_finite() {
            return Err(TraceError::FormatError(format!(
                "Line {}: timestamp {} is not finite",
                line, timestamp
            )));
        }

        let levels = self.record.iter().skip(1).map(|value| value == "1").collect();
        Ok(Row::new(timestamp, levels))
    }
}

impl<R: Read> RowSource for DigitalCsv<R> {
    fn channels(&self) -> &[String] {
        &self.channels
    }
}

impl<R: Read> Iterator for DigitalCsv<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(true) => Some(self.parse_record()),
            Ok(false) => None,
            Err(e) => Some(Err(e.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAPTURE: &str = "Time [s],Channel 0,Channel 1\n\
                           -0.000000010,0,0\n\
                           0.000000000,1,0\n\
                           0.000000002,0,1\n";

    #[test]
    fn test_header_channels() {
        let source = DigitalCsv::from_reader(CAPTURE.as_bytes()).unwrap();
        assert_eq!(source.channels(), ["Channel 0", "Channel 1"]);
    }

    #[test]
    fn test_rows() {
        let rows: Vec<Row> = DigitalCsv::from_reader(CAPTURE.as_bytes())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].timestamp, -0.00000001);
        assert_eq!(rows[1].levels, vec![true, false]);
        assert_eq!(rows[2].levels, vec![false, true]);
    }

    #[test]
    fn test_non_one_values_are_low() {
        let text = "Time [s],D0,D1,D2\n0.0,1,high,0\n";
        let mut source = DigitalCsv::from_reader(text.as_bytes()).unwrap();
        let row = source.next().unwrap().unwrap();
        assert_eq!(row.levels, vec![true, false, false]);
    }

    #[test]
    fn test_column_count_mismatch() {
        let text = "Time [s],D0,D1\n0.0,1,0\n0.1,1\n";
        let mut source = DigitalCsv::from_reader(text.as_bytes()).unwrap();
        assert!(source.next().unwrap().is_ok());
        assert!(matches!(
            source.next().unwrap(),
            Err(TraceError::FormatError(_))
        ));
    }

    #[test]
    fn test_bad_timestamp() {
        let text = "Time [s],D0\nnot-a-time,1\n";
        let mut source = DigitalCsv::from_reader(text.as_bytes()).unwrap();
        assert!(matches!(
            source.next().unwrap(),
            Err(TraceError::FormatError(_))
        ));
    }

    #[test]
    fn test_empty_input() {
        let result = DigitalCsv::from_reader("".as_bytes());
        assert!(matches!(result, Err(TraceError::FormatError(_))));
    }

    #[test]
    fn test_open_missing_file() {
        let result = DigitalCsv::open(Path::new("nonexistent/digital.csv"));
        assert!(result.is_err());
    }
}
