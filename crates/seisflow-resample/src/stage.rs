//! Shared plumbing for the resampling stages: the fixed-size ring buffer
//! and the internal sample block passed between chained stages.

use seisflow_foundation::Sample;

/// A contiguous run of samples between stages, with its timing.
#[derive(Debug, Clone)]
pub(crate) struct Block<T> {
    /// Time of the first sample, seconds since the epoch.
    pub start: f64,
    pub rate: f64,
    pub samples: Vec<T>,
}

impl<T> Block<T> {
    /// One sample period past the last sample.
    pub fn end(&self) -> f64 {
        self.start + self.samples.len() as f64 / self.rate
    }
}

/// Fixed-size circular buffer over a wrapping `front` index.
///
/// `front` always points at the logically oldest sample. All writes go
/// through [`Ring::write`], which splits a chunk across the wrap point;
/// there is no other mutation path.
#[derive(Debug)]
pub(crate) struct Ring<T> {
    buf: Vec<T>,
    front: usize,
}

impl<T: Sample> Ring<T> {
    pub fn new(len: usize) -> Self {
        Self {
            buf: vec![T::from_f64(0.0); len],
            front: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn reset(&mut self) {
        self.front = 0;
    }

    /// Copy `data` into the yet-unfilled tail during the fill phase.
    /// `missing` is the number of free slots remaining before this copy;
    /// the caller tracks it. Only valid while `front == 0`.
    pub fn fill_tail(&mut self, missing: usize, data: &[T]) {
        debug_assert_eq!(self.front, 0);
        let at = self.buf.len() - missing;
        self.buf[at..at + data.len()].copy_from_slice(data);
    }

    /// Overwrite the oldest samples with `chunk`, advancing `front`.
    /// The write may wrap and split across the buffer boundary.
    pub fn write(&mut self, chunk: &[T]) {
        debug_assert!(chunk.len() <= self.buf.len());
        let tail = (self.buf.len() - self.front).min(chunk.len());
        self.buf[self.front..self.front + tail].copy_from_slice(&chunk[..tail]);
        if tail < chunk.len() {
            let wrapped = chunk.len() - tail;
            self.buf[..wrapped].copy_from_slice(&chunk[tail..]);
            self.front = wrapped;
        } else {
            self.front += tail;
            if self.front == self.buf.len() {
                self.front = 0;
            }
        }
    }

    /// Sample at logical offset `i` from the oldest sample.
    pub fn get(&self, i: usize) -> T {
        let mut index = self.front + i;
        if index >= self.buf.len() {
            index -= self.buf.len();
        }
        self.buf[index]
    }

    /// Samples in logical order: `front..end`, then `0..front`.
    pub fn iter_circular(&self) -> impl Iterator<Item = &T> {
        self.buf[self.front..].iter().chain(self.buf[..self.front].iter())
    }
}
