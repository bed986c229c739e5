//! Core types for the Logic 2 capture input
//!
//! This module defines the values that flow from the capture file through the
//! timeline and the wait engine out to the annotation sink.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for input operations
pub type Result<T> = std::result::Result<T, TraceError>;

/// Discrete sample coordinate (`floor(timestamp * samplerate)`)
pub type SampleIndex = u64;

/// Maximum number of logic channels a [`Sample`] can hold
pub const MAX_CHANNELS: usize = 64;

/// Snapshot of all logic channels at one instant
///
/// Bit *i* holds the level of the *i*-th channel in header order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sample(pub u64);

impl Sample {
    /// Build a sample from per-channel levels in header order
    pub fn from_levels<I>(levels: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let bits = levels
            .into_iter()
            .take(MAX_CHANNELS)
            .enumerate()
            .fold(0u64, |acc, (bit, high)| acc | (u64::from(high) << bit));
        Sample(bits)
    }

    /// Level (0 or 1) of a single channel
    pub fn level(&self, channel: usize) -> u8 {
        if channel >= MAX_CHANNELS {
            return 0;
        }
        ((self.0 >> channel) & 0x1) as u8
    }

    /// True if the channel is logic-high
    pub fn is_high(&self, channel: usize) -> bool {
        self.level(channel) == 1
    }

    /// Per-channel decomposition of the first `channels` bits
    pub fn bits(&self, channels: usize) -> Vec<u8> {
        (0..channels).map(|channel| self.level(channel)).collect()
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

/// One parsed capture row: a timestamp and the levels of every channel
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Timestamp in seconds relative to the trigger (may be negative)
    pub timestamp: f64,
    /// Per-channel levels in header order
    pub levels: Vec<bool>,
}

impl Row {
    pub fn new(timestamp: f64, levels: Vec<bool>) -> Self {
        Self { timestamp, levels }
    }

    /// Pack the row levels into a sample bitmask
    pub fn sample(&self) -> Sample {
        Sample::from_levels(self.levels.iter().copied())
    }
}

/// Output channel a window is reported on
///
/// Mirrors the sigrok decoder output types. The input only ever produces
/// `Python` payloads; the other kinds exist so sinks can share one type with
/// downstream decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    Ann,
    Python,
    Binary,
    Meta,
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputType::Ann => write!(f, "ann"),
            OutputType::Python => write!(f, "python"),
            OutputType::Binary => write!(f, "binary"),
            OutputType::Meta => write!(f, "meta"),
        }
    }
}

/// Tag carried by every logic window
pub const LOGIC_TAG: &str = "logic";

/// A half-open range `[start, end)` during which the sample was constant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: SampleIndex,
    pub end: SampleIndex,
    pub output: OutputType,
    pub tag: String,
    pub sample: Sample,
}

impl Window {
    /// Logic window tagged with the sample that held across it
    pub fn logic(start: SampleIndex, end: SampleIndex, sample: Sample) -> Self {
        Self {
            start,
            end,
            output: OutputType::Python,
            tag: LOGIC_TAG.to_string(),
            sample,
        }
    }

    /// Number of samples covered by this window
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Errors that can occur while reading a capture
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("Invalid capture format: {0}")]
    FormatError(String),

    /// Normal end of the capture, or the sample budget ran out
    #[error("End of stream")]
    EndOfStream,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl TraceError {
    /// True for the expected end-of-capture signal
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, TraceError::EndOfStream)
    }
}
