//! File-backed Logic 2 input
//!
//! Ties export resolution, the digital CSV reader and the wait engine
//! together. Dropping the input closes the capture file.

use crate::condition::{ConditionEvaluator, PinEvaluator};
use crate::config::InputConfig;
use crate::engine::WaitEngine;
use crate::sink::AnnotationSink;
use crate::source::{resolve_input, DigitalCsv};
use crate::types::{Result, Window};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Input driver name
pub const NAME: &str = "logic2";

/// Input driver description
pub const DESCRIPTION: &str = "Logic 2 export file format data";

/// Wait engine reading a Logic 2 export from disk
pub type Logic2Input<E = PinEvaluator, S = Vec<Window>> =
    WaitEngine<DigitalCsv<BufReader<File>>, E, S>;

impl<E, S> WaitEngine<DigitalCsv<BufReader<File>>, E, S>
where
    E: ConditionEvaluator,
    S: AnnotationSink,
{
    /// Open an export directory or its `digital.csv`
    ///
    /// # Example
    /// ```no_run
    /// use logic2_input::{InputConfig, Logic2Input, PinEvaluator, WaitCondition};
    /// use std::path::Path;
    ///
    /// let config = InputConfig::new().with_sample_budget(1000);
    /// let mut input: Logic2Input = Logic2Input::open(Path::new("capture"), &config, PinEvaluator, Vec::new())?;
    /// let levels = input.wait(&[WaitCondition::skip(10)])?;
    /// println!("levels after 10 samples: {:?}", levels);
    /// # Ok::<(), logic2_input::TraceError>(())
    /// ```
    pub fn open(path: &Path, config: &InputConfig, evaluator: E, sink: S) -> Result<Self> {
        let digital = resolve_input(path)?;
        let rows = DigitalCsv::open(&digital)?;
        Self::new(rows, config, evaluator, sink)
    }
}
