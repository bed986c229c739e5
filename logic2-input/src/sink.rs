//! Annotation sinks
//!
//! The wait engine pushes every completed window into a sink. Windows arrive
//! in increasing, contiguous, non-overlapping order; what the sink does with
//! them is its own business.

use crate::types::{Result, Window};
use std::io::Write;

/// Receiver for completed sample windows
pub trait AnnotationSink {
    fn put(&mut self, window: Window) -> Result<()>;
}

impl AnnotationSink for Vec<Window> {
    fn put(&mut self, window: Window) -> Result<()> {
        self.push(window);
        Ok(())
    }
}

impl<S: AnnotationSink + ?Sized> AnnotationSink for &mut S {
    fn put(&mut self, window: Window) -> Result<()> {
        (**self).put(window)
    }
}

/// Sink that drops every window
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl AnnotationSink for NullSink {
    fn put(&mut self, _window: Window) -> Result<()> {
        Ok(())
    }
}

/// Sink writing one JSON object per window
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: u64,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Number of windows written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> AnnotationSink for JsonLinesSink<W> {
    fn put(&mut self, window: Window) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &window).map_err(std::io::Error::from)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }
}
