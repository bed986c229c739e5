//! Timeline normalization
//!
//! Converts timestamp-keyed rows into sample-indexed values with one row of
//! look-ahead. The pending row tells the wait engine where the current
//! sample ends before that sample is handed out.

use crate::source::RowSource;
use crate::types::{Result, Row, Sample, SampleIndex, TraceError};

/// A sample together with the index at which it takes effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamped {
    pub index: SampleIndex,
    pub sample: Sample,
}

/// Convert a timestamp in seconds to a signed sample index
///
/// Truncates toward zero. Products that land within binary rounding noise of
/// an integer snap to that integer, so `0.000000002 s` at 500 MHz is sample 1
/// rather than 0.
pub fn sample_index(timestamp: f64, samplerate: u64) -> i64 {
    let exact = timestamp * samplerate as f64;
    let nearest = exact.round();
    let tolerance = exact.abs() * 4.0 * f64::EPSILON + 1e-9;
    if (exact - nearest).abs() <= tolerance {
        nearest as i64
    } else {
        exact.trunc() as i64
    }
}

/// Peekable cursor over a row source: the pending sample plus the rows after it
pub struct Timeline<R: RowSource> {
    rows: R,
    samplerate: u64,
    pending: Option<Stamped>,
    pre_trigger: Sample,
}

impl<R: RowSource> Timeline<R> {
    /// Skip pre-trigger rows and load the first pending sample
    ///
    /// `seed` is the level assumed before any row. Every discarded row with a
    /// negative index replaces it, so [`Timeline::pre_trigger`] reports the
    /// level in effect when sample 0 begins.
    pub fn new(mut rows: R, samplerate: u64, seed: Sample) -> Result<Self> {
        let mut pre_trigger = seed;
        let mut pending = None;
        let mut discarded = 0usize;

        for row in rows.by_ref() {
            let row = row?;
            let index = sample_index(row.timestamp, samplerate);
            if index >= 0 {
                pending = Some(Stamped {
                    index: index as SampleIndex,
                    sample: row.sample(),
                });
                break;
            }
            pre_trigger = row.sample();
            discarded += 1;
        }

        if discarded > 0 {
            log::debug!("Discarded {} pre-trigger rows", discarded);
        }
        if pending.is_none() {
            log::debug!("Capture has no rows at or after the trigger");
        }

        Ok(Self {
            rows,
            samplerate,
            pending,
            pre_trigger,
        })
    }

    /// Channel names of the underlying source
    pub fn channels(&self) -> &[String] {
        self.rows.channels()
    }

    pub fn samplerate(&self) -> u64 {
        self.samplerate
    }

    /// Level in effect before the first pending sample
    pub fn pre_trigger(&self) -> Sample {
        self.pre_trigger
    }

    /// The next sample and the index where it begins, if any
    pub fn peek(&self) -> Option<Stamped> {
        self.pending
    }

    /// Hand out the pending sample and read the row after it
    ///
    /// Fails with `EndOfStream` if there is no pending sample or no row
    /// follows it, so the last row of a capture is never handed out.
    pub fn advance(&mut self) -> Result<Stamped> {
        let current = self.pending.take().ok_or(TraceError::EndOfStream)?;

        let row = match self.rows.next() {
            Some(row) => row?,
            None => return Err(TraceError::EndOfStream),
        };
        self.pending = Some(self.stamp(&row, current.index)?);

        Ok(current)
    }

    fn stamp(&self, row: &Row, previous: SampleIndex) -> Result<Stamped> {
        let index = sample_index(row.timestamp, self.samplerate);
        if index < previous as i64 {
            return Err(TraceError::FormatError(format!(
                "Timestamp {} maps to sample {} which precedes sample {}",
                row.timestamp, index, previous
            )));
        }

        Ok(Stamped {
            index: index as SampleIndex,
            sample: row.sample(),
        })
    }
}
