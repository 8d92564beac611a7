//! Lanczos interpolation stage.
//!
//! Inserts `N - 1` new samples between consecutive input samples using a
//! windowed-sinc (Lanczos) kernel over the `2a + 1` neighbors held in a
//! small ring buffer. Unlike the decimation stage, any timing mismatch
//! beyond half a sample period resets the stage: with samples emitted
//! eagerly there is no overlap that can simply be ignored.

use seisflow_foundation::Sample;

use crate::stage::{Block, Ring};

/// sinc(pi * x)
fn sinc_pi(x: f64) -> f64 {
    if x == 0.0 {
        return 1.0;
    }
    let px = std::f64::consts::PI * x;
    px.sin() / px
}

/// Lanczos kernel with half-width `a`.
fn lanczos(x: f64, a: f64) -> f64 {
    if -a < x && x < a {
        sinc_pi(x) * sinc_pi(x / a)
    } else {
        0.0
    }
}

#[derive(Debug)]
pub(crate) struct UpsampleStage<T: Sample> {
    factor: usize,
    /// Fractional step between emitted samples, `1 / factor`.
    down_ratio: f64,
    /// Kernel half-width `a`.
    width: usize,
    target_rate: f64,
    /// Input sample period.
    dt: f64,
    ring: Ring<T>,
    missing: usize,
    start_time: Option<f64>,
    last_end: Option<f64>,
}

impl<T: Sample> UpsampleStage<T> {
    pub fn new(sample_rate: f64, n: u32, width: u32) -> Self {
        let width = width as usize;
        // The sample itself, the kernel width to either side, and one
        // slack slot on the left.
        let len = 2 * width + 2;
        Self {
            factor: n as usize,
            down_ratio: 1.0 / n as f64,
            width,
            target_rate: sample_rate * n as f64,
            dt: 1.0 / sample_rate,
            ring: Ring::new(len),
            missing: len,
            start_time: None,
            last_end: None,
        }
    }

    pub fn factor(&self) -> u32 {
        self.factor as u32
    }

    pub fn reset(&mut self) {
        self.ring.reset();
        self.missing = self.ring.len();
        self.start_time = None;
        self.last_end = None;
    }

    pub fn push(&mut self, id: &str, samples: &[T], start: f64, end: f64) -> Option<Block<T>> {
        if let Some(last_end) = self.last_end {
            let diff = start - last_end;
            if diff.abs() > self.dt * 0.5 {
                tracing::debug!(
                    "{}: gap/overlap of {:.6} s, resetting interpolation",
                    id,
                    diff
                );
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

            if self.missing > 0 {
                return None;
            }
        }

        let mut stage_start = match self.start_time {
            Some(t) => t,
            None => start,
        };

        let mut out: Vec<T> = Vec::with_capacity(data.len() * self.factor);
        let mut out_start = 0.0;

        while !data.is_empty() {
            if out.is_empty() {
                out_start = stage_start + self.dt * self.width as f64;
            }

            // N output samples at fractional offsets j/N past the sample
            // at the kernel center.
            let mut xi = 0.0;
            for _ in 0..self.factor {
                let mut acc = 0.0;
                for k in 0..=2 * self.width {
                    let offset = k as f64 - self.width as f64;
                    acc += self.ring.get(k).to_f64() * lanczos(xi - offset, self.width as f64);
                }
                xi += self.down_ratio;

                if acc.is_nan() {
                    tracing::warn!("{}: interpolation produced NaN sample", id);
                }
                out.push(T::from_f64(acc));
            }

            self.ring.write(&data[..1]);
            data = &data[1..];
            stage_start += self.dt;
        }

        self.start_time = Some(stage_start);

        // A block that exactly completes the fill leaves nothing to emit.
        if out.is_empty() {
            return None;
        }

        Some(Block {
            start: out_start,
            rate: self.target_rate,
            samples: out,
        })
    }
}
