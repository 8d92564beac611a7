//! [`RecordFilter`] adapter around a [`Resampler`].

use seisflow_foundation::{Record, RecordFilter, Sample};

use crate::resampler::{Resampler, ResamplerConfig};

/// A resampler behind the generic record-filter interface, for pipelines
/// that compose filters without knowing their concrete types.
pub struct ResampleFilter<T: Sample> {
    inner: Resampler<T>,
}

impl<T: Sample> ResampleFilter<T> {
    pub fn new(config: ResamplerConfig) -> Result<Self, seisflow_foundation::StreamError> {
        Ok(Self {
            inner: Resampler::new(config)?,
        })
    }

    pub fn target_rate(&self) -> f64 {
        self.inner.target_rate()
    }
}

impl<T: Sample> RecordFilter for ResampleFilter<T> {
    fn feed(&mut self, record: &Record) -> Option<Record> {
        self.inner.feed(record)
    }

    /// Samples buffered for group-delay compensation cannot be completed
    /// without future input, so end-of-stream flushes nothing.
    fn flush(&mut self) -> Option<Record> {
        None
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn clone_filter(&self) -> Box<dyn RecordFilter> {
        Box::new(Self {
            inner: self.inner.clone(),
        })
    }
}
