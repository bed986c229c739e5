//! Logic 2 Capture Input Library
//!
//! Turns a Saleae Logic 2 digital export (one CSV row per observed level
//! change) into a sample-indexed stream, and exposes the conditional `wait`
//! that protocol decoders use to walk through it.
//!
//! # Architecture
//!
//! - **Row source** (`source`): resolves the export and parses `digital.csv`
//! - **Timeline** (`timeline`): maps timestamps to sample indices at 500 MHz
//!   with one row of look-ahead
//! - **Wait engine** (`engine`): advances until a skip count elapses or an
//!   injected evaluator accepts a sample transition, emitting every completed
//!   window to an annotation sink
//!
//! The library does NOT:
//! - Decode protocols (decoders drive `wait`)
//! - Read analog channels
//! - Ingest from a live device
//!
//! # Example Usage
//!
//! ```no_run
//! use logic2_input::{InputConfig, Logic2Input, PinCondition, PinEvaluator, PinPattern, WaitCondition};
//! use std::path::Path;
//!
//! let config = InputConfig::new().with_initial_level(0, 1);
//! let mut input: Logic2Input = Logic2Input::open(Path::new("export"), &config, PinEvaluator, Vec::new()).unwrap();
//!
//! let clock_rise = [WaitCondition::pattern(PinPattern::new().pin(0, PinCondition::Rising))];
//! loop {
//!     match input.wait(&clock_rise) {
//!         Ok(levels) => println!("{} {:?}", input.samplenum(), levels),
//!         Err(e) if e.is_end_of_stream() => break,
//!         Err(e) => panic!("{}", e),
//!     }
//! }
//!
//! for window in input.into_sink() {
//!     println!("[{}, {}) {}", window.start, window.end, window.sample);
//! }
//! ```

// Public modules
pub mod condition;
pub mod config;
pub mod engine;
pub mod input;
pub mod sink;
pub mod source;
pub mod timeline;
pub mod types;

// Re-export main types for convenience
pub use condition::{ConditionEvaluator, FnEvaluator, PinCondition, PinEvaluator, PinPattern, WaitCondition};
pub use config::{InputConfig, SAMPLE_RATE};
pub use engine::{StreamState, WaitEngine};
pub use input::Logic2Input;
pub use sink::{AnnotationSink, JsonLinesSink, NullSink};
pub use source::{resolve_input, DigitalCsv, RowSource};
pub use types::{OutputType, Result, Row, Sample, SampleIndex, TraceError, Window, LOGIC_TAG};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
