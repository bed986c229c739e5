//! Wait engine
//!
//! [`WaitEngine`] drives a [`Timeline`] forward one row at a time until one
//! of the caller's wait conditions matches, reporting every completed window
//! to an [`AnnotationSink`] along the way.
//!
//! All position bookkeeping lives in [`StreamState`] and is only mutated from
//! [`WaitEngine::wait`], which keeps the window invariants checkable in one
//! place:
//! - `samplenum` never decreases
//! - `window_start <= samplenum`
//! - emitted windows are contiguous and never overlap

use crate::condition::{ConditionEvaluator, PinEvaluator, WaitCondition};
use crate::config::{InputConfig, SAMPLE_RATE};
use crate::sink::AnnotationSink;
use crate::source::RowSource;
use crate::timeline::Timeline;
use crate::types::{Result, Sample, SampleIndex, TraceError, Window};

/// Position of the engine within the capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamState {
    /// Sample in effect at `samplenum`
    pub last_sample: Sample,
    /// Current sample index
    pub samplenum: SampleIndex,
    /// Start of the open window, if one has been opened
    pub window_start: Option<SampleIndex>,
    /// Windows left before the budget runs out
    pub remaining_budget: Option<u64>,
}

/// The condition matcher over a normalized capture
pub struct WaitEngine<R, E = PinEvaluator, S = Vec<Window>>
where
    R: RowSource,
{
    timeline: Timeline<R>,
    evaluator: E,
    sink: S,
    state: StreamState,
    matched: Vec<bool>,
    finished: bool,
}

impl<R, E, S> WaitEngine<R, E, S>
where
    R: RowSource,
    E: ConditionEvaluator,
    S: AnnotationSink,
{
    /// Build an engine over a row source
    ///
    /// Validates the configuration against the source's channels and reads
    /// up to the first row at or after the trigger.
    pub fn new(rows: R, config: &InputConfig, evaluator: E, sink: S) -> Result<Self> {
        let seed = config.seed(rows.channels().len())?;
        let timeline = Timeline::new(rows, SAMPLE_RATE, seed)?;

        log::info!(
            "Capture ready: {} logic channels at {} Hz",
            timeline.channels().len(),
            timeline.samplerate()
        );

        let state = StreamState {
            last_sample: timeline.pre_trigger(),
            samplenum: 0,
            window_start: None,
            remaining_budget: config.budget(),
        };

        Ok(Self {
            timeline,
            evaluator,
            sink,
            state,
            matched: Vec::new(),
            finished: false,
        })
    }

    /// Block until any condition matches and return the per-channel levels
    ///
    /// With no conditions the call returns after exactly one advance. A
    /// `Skip(0)` condition returns immediately without reading a row.
    ///
    /// Fails with [`TraceError::EndOfStream`] when the capture or the sample
    /// budget runs out. Once any error is returned the engine is exhausted
    /// and every later call fails with `EndOfStream`.
    pub fn wait(&mut self, conditions: &[WaitCondition<E::Pattern>]) -> Result<Vec<u8>> {
        let sample = self.wait_sample(conditions)?;
        Ok(sample.bits(self.channel_count()))
    }

    /// Same as [`WaitEngine::wait`] but returns the packed sample
    pub fn wait_sample(&mut self, conditions: &[WaitCondition<E::Pattern>]) -> Result<Sample> {
        if self.finished {
            return Err(TraceError::EndOfStream);
        }

        match self.run(conditions) {
            Ok(sample) => Ok(sample),
            Err(e) => {
                log::debug!("Stream finished at sample {}: {}", self.state.samplenum, e);
                self.finished = true;
                Err(e)
            }
        }
    }

    fn run(&mut self, conditions: &[WaitCondition<E::Pattern>]) -> Result<Sample> {
        let anchor = self.state.samplenum;
        // One implicit slot when no conditions are given
        self.matched = vec![false; conditions.len().max(1)];

        loop {
            for (slot, condition) in self.matched.iter_mut().zip(conditions) {
                if condition.skip_count() == Some(0) {
                    *slot = true;
                }
            }
            if self.any_matched() {
                break;
            }

            let candidate = self.advance()?;

            if conditions.is_empty() {
                self.matched[0] = true;
            }
            for (i, condition) in conditions.iter().enumerate() {
                let hit = match condition {
                    WaitCondition::Skip(samples) => self.state.samplenum - anchor >= *samples,
                    WaitCondition::Pattern(pattern) => {
                        self.evaluator
                            .matches(pattern, self.state.last_sample, candidate)
                    }
                };
                self.matched[i] = hit;
            }

            self.state.last_sample = candidate;
            self.state.window_start = Some(self.state.samplenum);
        }

        log::trace!(
            "Matched {:?} at sample {} ({})",
            self.matched,
            self.state.samplenum,
            self.state.last_sample
        );
        Ok(self.state.last_sample)
    }

    /// Move to the pending sample, closing the open window
    fn advance(&mut self) -> Result<Sample> {
        let next = self.timeline.peek().ok_or(TraceError::EndOfStream)?;
        self.state.samplenum = next.index;

        if let Some(start) = self.state.window_start {
            self.emit(start)?;
        }

        Ok(self.timeline.advance()?.sample)
    }

    fn emit(&mut self, start: SampleIndex) -> Result<()> {
        let end = self.state.samplenum;
        // Several rows inside one sample period collapse to nothing
        if end == start {
            return Ok(());
        }

        log::trace!("Window [{}, {}) = {}", start, end, self.state.last_sample);
        self.sink.put(Window::logic(start, end, self.state.last_sample))?;

        if let Some(budget) = self.state.remaining_budget.as_mut() {
            *budget -= 1;
            if *budget == 0 {
                log::debug!("Sample budget exhausted at sample {}", end);
                return Err(TraceError::EndOfStream);
            }
        }
        Ok(())
    }

    fn any_matched(&self) -> bool {
        self.matched.iter().any(|&hit| hit)
    }

    /// Per-condition match flags from the last `wait`
    pub fn matched(&self) -> &[bool] {
        &self.matched
    }

    /// Current sample index
    pub fn samplenum(&self) -> SampleIndex {
        self.state.samplenum
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    /// Logic channel names in header order
    pub fn logic_channels(&self) -> &[String] {
        self.timeline.channels()
    }

    pub fn channel_count(&self) -> usize {
        self.timeline.channels().len()
    }

    pub fn samplerate(&self) -> u64 {
        self.timeline.samplerate()
    }

    /// True once `wait` has returned an error
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Close the input and hand back the sink
    pub fn into_sink(self) -> S {
        self.sink
    }
}
