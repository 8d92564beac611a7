//! FIR decimation stage.
//!
//! One stage reduces the rate by an integer factor `N`: it keeps the last
//! `coefficients.len()` input samples in a ring buffer and emits one
//! filtered sample for every `N` consumed. Factors above the per-stage
//! maximum are split across chained stages, which bounds filter length and
//! convolution cost at the price of extra group delay.

use std::sync::Arc;

use seisflow_foundation::{Sample, StreamError};

use crate::coefficients::{CacheHandle, FilterSpec};
use crate::stage::{Block, Ring};

#[derive(Debug)]
pub(crate) struct DownsampleStage<T: Sample> {
    factor: usize,
    target_rate: f64,
    /// Input sample period.
    dt: f64,
    /// Group delay of the symmetric kernel, in input samples.
    group_delay: usize,
    coefficients: Arc<[f64]>,
    ring: Ring<T>,
    /// Samples still needed before the ring is full for the first time.
    missing: usize,
    /// Input samples to consume before the next output sample.
    skip: usize,
    /// Time of the oldest sample in the ring; tracks consumption exactly.
    start_time: Option<f64>,
    last_end: Option<f64>,
    next: Option<Box<DownsampleStage<T>>>,
}

impl<T: Sample> DownsampleStage<T> {
    /// Build the stage chain decimating `sample_rate` by `n`.
    pub fn build(
        sample_rate: f64,
        n: u32,
        spec: &FilterSpec,
        cache: &CacheHandle,
    ) -> Result<Self, StreamError> {
        let (factor, rest) = spec.split_factor(n);
        let coefficients = cache.coefficients(factor, spec)?;
        let target_rate = sample_rate / factor as f64;

        let next = match rest {
            Some(m) => Some(Box::new(Self::build(target_rate, m, spec, cache)?)),
            None => None,
        };

        let len = coefficients.len();
        Ok(Self {
            factor: factor as usize,
            target_rate,
            dt: 1.0 / sample_rate,
            group_delay: len / 2,
            coefficients,
            ring: Ring::new(len),
            missing: len,
            skip: 0,
            start_time: None,
            last_end: None,
            next,
        })
    }

    /// Per-stage factors of this chain, outermost first.
    pub fn factors(&self) -> Vec<u32> {
        let mut out = vec![self.factor as u32];
        if let Some(next) = &self.next {
            out.extend(next.factors());
        }
        out
    }

    pub fn reset(&mut self) {
        self.ring.reset();
        self.missing = self.ring.len();
        self.skip = 0;
        self.start_time = None;
        self.last_end = None;
        if let Some(next) = &mut self.next {
            next.reset();
        }
    }

    /// Feed one block; returns the chain's output block, if any.
    pub fn push(&mut self, id: &str, samples: &[T], start: f64, end: f64) -> Option<Block<T>> {
        if let Some(last_end) = self.last_end {
            let diff = start - last_end;
            if diff.abs() > self.dt * 0.5 {
                if diff < 0.0 {
                    // Overlap: drop the block. last_end stays put, so a
                    // later block contiguous with the accepted timeline
                    // resumes without a reset.
                    tracing::debug!("{}: overlap of {:.6} s, dropping block", id, -diff);
                    return None;
                }
                tracing::debug!("{}: gap of {:.6} s, resetting decimation", id, diff);
                self.reset();
            }
        }
        self.last_end = Some(end);

        if samples.is_empty() {
            return None;
        }

        let mut data = samples;

        if self.missing > 0 {
            let to_copy = self.missing.min(data.len());
            self.ring.fill_tail(self.missing, &data[..to_copy]);
            data = &data[to_copy..];
            self.missing -= to_copy;

            if self.start_time.is_none() {
                self.start_time = Some(start);
            }

            // Ring not yet full and the block is exhausted.
            if self.missing > 0 {
                return None;
            }

            self.skip = 0;
        }

        let mut stage_start = match self.start_time {
            Some(t) => t,
            None => start,
        };

        let mut out: Vec<T> = Vec::new();
        let mut out_start = 0.0;

        loop {
            if self.skip == 0 {
                let mut acc = 0.0;
                for (&s, &c) in self.ring.iter_circular().zip(self.coefficients.iter()) {
                    acc += s.to_f64() * c;
                }

                if out.is_empty() {
                    out_start = stage_start + self.dt * self.group_delay as f64;
                }

                if acc.is_nan() {
                    tracing::warn!("{}: decimation produced NaN sample", id);
                }
                out.push(T::from_f64(acc));

                // Wait until another N samples have been consumed.
                self.skip = self.factor;
            }

            let consumed = self.skip.min(data.len());
            self.ring.write(&data[..consumed]);
            data = &data[consumed..];
            stage_start += self.dt * consumed as f64;
            self.skip -= consumed;

            if data.is_empty() {
                break;
            }
        }

        self.start_time = Some(stage_start);

        if out.is_empty() {
            return None;
        }

        let block = Block {
            start: out_start,
            rate: self.target_rate,
            samples: out,
        };

        match &mut self.next {
            Some(next) => {
                let end = block.end();
                next.push(id, &block.samples, block.start, end)
            }
            None => Some(block),
        }
    }
}
