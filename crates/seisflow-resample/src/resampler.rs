//! The resampler façade: one instance per logical stream.
//!
//! Routes every incoming record through at most one interpolation stage
//! and one decimation chain, chosen from the rational approximation of
//! `target_rate / source_rate`. Stages are (re)built the first time a
//! source rate is seen and whenever it changes mid-stream; a rate change
//! is an accepted discontinuity, not an error.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use seisflow_foundation::{Record, Sample, StreamError};

use crate::coefficients::{CacheHandle, FilterSpec};
use crate::downsample::DownsampleStage;
use crate::ratio;
use crate::upsample::UpsampleStage;

/// Configuration of a [`Resampler`]; immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResamplerConfig {
    /// Output sampling rate in Hz.
    pub target_rate: f64,
    /// Passband edge as a fraction of the output Nyquist frequency.
    pub passband_edge: f64,
    /// Stopband edge as a fraction of the output Nyquist frequency.
    pub stopband_edge: f64,
    /// Filter length multiplier for the decimation kernels.
    pub coeff_scale: u32,
    /// Half-width of the Lanczos interpolation kernel.
    pub lanczos_width: u32,
}

impl Default for ResamplerConfig {
    fn default() -> Self {
        Self {
            target_rate: 1.0,
            passband_edge: 0.7,
            stopband_edge: 0.9,
            coeff_scale: 10,
            lanczos_width: 3,
        }
    }
}

impl ResamplerConfig {
    pub fn with_target_rate(target_rate: f64) -> Self {
        Self {
            target_rate,
            ..Self::default()
        }
    }

    /// Largest decimation factor a single stage may take.
    pub fn max_stage_factor(&self) -> u32 {
        500 / self.coeff_scale
    }

    pub fn validate(&self) -> Result<(), StreamError> {
        if !self.target_rate.is_finite() || self.target_rate <= 0.0 {
            return Err(StreamError::Config(format!(
                "target rate must be a positive number, got {}",
                self.target_rate
            )));
        }
        if !self.passband_edge.is_finite() || self.passband_edge <= 0.0 {
            return Err(StreamError::Config(format!(
                "passband edge must be a positive number, got {}",
                self.passband_edge
            )));
        }
        if !self.stopband_edge.is_finite() || self.stopband_edge <= 0.0 {
            return Err(StreamError::Config(format!(
                "stopband edge must be a positive number, got {}",
                self.stopband_edge
            )));
        }
        if self.passband_edge >= self.stopband_edge {
            return Err(StreamError::Config(format!(
                "passband edge {} must lie below stopband edge {}",
                self.passband_edge, self.stopband_edge
            )));
        }
        if self.coeff_scale == 0 {
            return Err(StreamError::Config(
                "coefficient scale must be a positive integer".into(),
            ));
        }
        if self.max_stage_factor() < 2 {
            return Err(StreamError::Config(format!(
                "coefficient scale {} leaves no room for filter stages",
                self.coeff_scale
            )));
        }
        if self.lanczos_width == 0 {
            return Err(StreamError::Config(
                "Lanczos width must be a positive integer".into(),
            ));
        }
        Ok(())
    }

    fn filter_spec(&self) -> FilterSpec {
        FilterSpec {
            passband_edge: self.passband_edge,
            stopband_edge: self.stopband_edge,
            coeff_scale: self.coeff_scale,
            max_stage_factor: self.max_stage_factor(),
        }
    }
}

/// Streaming rational resampler for one stream identity.
///
/// `T` is the element type the math is carried in and the output records
/// are stored as; incoming records of other types are converted on entry.
pub struct Resampler<T: Sample> {
    config: ResamplerConfig,
    spec: FilterSpec,
    cache: CacheHandle,
    current_rate: Option<f64>,
    upsampler: Option<UpsampleStage<T>>,
    downsampler: Option<DownsampleStage<T>>,
}

impl<T: Sample> Resampler<T> {
    pub fn new(config: ResamplerConfig) -> Result<Self, StreamError> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    pub(crate) fn from_validated(config: ResamplerConfig) -> Self {
        let spec = config.filter_spec();
        Self {
            config,
            spec,
            cache: CacheHandle::register(),
            current_rate: None,
            upsampler: None,
            downsampler: None,
        }
    }

    pub fn config(&self) -> &ResamplerConfig {
        &self.config
    }

    pub fn target_rate(&self) -> f64 {
        self.config.target_rate
    }

    /// Integer factors currently in use, upsample first, then the
    /// decimation chain outermost-first. Empty until the first record of
    /// a rate different from the target has been seen.
    pub fn stage_factors(&self) -> Vec<u32> {
        let mut factors = Vec::new();
        if let Some(up) = &self.upsampler {
            factors.push(up.factor());
        }
        if let Some(down) = &self.downsampler {
            factors.extend(down.factors());
        }
        factors
    }

    /// Drop all processing state; configuration and coefficient cache
    /// registration survive.
    pub fn reset(&mut self) {
        self.current_rate = None;
        self.upsampler = None;
        self.downsampler = None;
    }

    /// Feed one record; returns at most one resampled record.
    ///
    /// `None` covers several expected situations: not enough buffered
    /// input yet, a dropped overlap, a malformed record, or a stream
    /// whose rate cannot be rationally related to the target (logged).
    pub fn feed(&mut self, record: &Record) -> Option<Record> {
        let rate = record.sampling_rate;

        // Already at the target rate: type conversion only.
        if rate == self.config.target_rate {
            return self.convert(record);
        }

        if record.is_empty() {
            return None;
        }

        let id = record.stream_id();
        let end = match record.end_time() {
            Ok(end) => end,
            Err(_) => {
                tracing::warn!("{}: invalid end time, ignoring record", id);
                return None;
            }
        };

        if self.current_rate != Some(rate) {
            self.rebuild_stages(record, rate)?;
        }

        let samples: Cow<'_, [T]> = T::convert(&record.samples);

        let out = match (&mut self.upsampler, &mut self.downsampler) {
            (Some(up), Some(down)) => {
                // The intermediate block stays internal to the pipe.
                let mid = up.push(&id, &samples, record.start_time, end)?;
                let mid_end = mid.end();
                down.push(&id, &mid.samples, mid.start, mid_end)?
            }
            (Some(up), None) => up.push(&id, &samples, record.start_time, end)?,
            (None, Some(down)) => down.push(&id, &samples, record.start_time, end)?,
            // Approximation reduced to 1/1 while the rates differ
            // slightly; nothing sensible to emit.
            (None, None) => return None,
        };

        Some(record.with_payload(out.start, out.rate, T::into_buffer(out.samples)))
    }

    fn rebuild_stages(&mut self, record: &Record, rate: f64) -> Option<()> {
        // Remember the rate either way: a stream that cannot be
        // approximated is warned about once, then dropped silently.
        self.current_rate = Some(rate);

        let Some((num, den)) = ratio::reduce_default(self.config.target_rate / rate) else {
            let err = StreamError::IncompatibleRate {
                source_rate: rate,
                target_rate: self.config.target_rate,
            };
            tracing::warn!("{}: {}, dropping records", record.stream_id(), err);
            self.upsampler = None;
            self.downsampler = None;
            return None;
        };

        if num > 1 {
            self.upsampler = Some(UpsampleStage::new(rate, num as u32, self.config.lanczos_width));
        } else {
            self.upsampler = None;
        }

        if den > 1 {
            let input_rate = rate * num as f64;
            match DownsampleStage::build(input_rate, den as u32, &self.spec, &self.cache) {
                Ok(stage) => self.downsampler = Some(stage),
                Err(e) => {
                    tracing::error!("{}: cannot build decimation chain: {}", record.stream_id(), e);
                    self.downsampler = None;
                    return None;
                }
            }
        } else {
            self.downsampler = None;
        }

        // Rates differ but the fraction reduced to unity (or to zero for
        // extreme ratios): nothing to build, records will be dropped.
        // Logged once per observed rate, like the incompatible case.
        if self.upsampler.is_none() && self.downsampler.is_none() {
            tracing::warn!(
                "{}: {} Hz reduces to {}/{} against the {} Hz target, dropping records",
                record.stream_id(),
                rate,
                num,
                den,
                self.config.target_rate
            );
            return None;
        }

        Some(())
    }

    /// Fast-path conversion for records already at the target rate.
    fn convert(&self, record: &Record) -> Option<Record> {
        if record.is_empty() {
            return None;
        }
        Some(record.with_payload(
            record.start_time,
            record.sampling_rate,
            record.samples.convert_to(T::DATA_TYPE),
        ))
    }
}

/// A fresh resampler with the same configuration and no stream state.
impl<T: Sample> Clone for Resampler<T> {
    fn clone(&self) -> Self {
        Self::from_validated(self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seisflow_foundation::SampleBuffer;

    fn record(start: f64, rate: f64, samples: Vec<f64>) -> Record {
        Record::new(
            "GR",
            "BFO",
            "",
            "BHZ",
            start,
            rate,
            SampleBuffer::Double(samples),
        )
    }

    #[test]
    fn validation_rejects_bad_parameters() {
        assert!(ResamplerConfig::with_target_rate(0.0).validate().is_err());
        assert!(ResamplerConfig::with_target_rate(-20.0).validate().is_err());
        assert!(ResamplerConfig {
            passband_edge: 0.9,
            stopband_edge: 0.7,
            ..ResamplerConfig::with_target_rate(1.0)
        }
        .validate()
        .is_err());
        assert!(ResamplerConfig {
            coeff_scale: 400,
            ..ResamplerConfig::with_target_rate(1.0)
        }
        .validate()
        .is_err());
        assert!(ResamplerConfig::with_target_rate(20.0).validate().is_ok());
    }

    #[test]
    fn equal_rate_is_converted_not_filtered() {
        let mut rs: Resampler<f32> = Resampler::new(ResamplerConfig::with_target_rate(20.0)).unwrap();
        let rec = record(0.0, 20.0, vec![1.5, -2.5, 3.0]);
        let out = rs.feed(&rec).unwrap();
        assert_eq!(out.sampling_rate, 20.0);
        assert_eq!(out.start_time, 0.0);
        assert_eq!(out.samples, SampleBuffer::Float(vec![1.5, -2.5, 3.0]));
        assert!(rs.stage_factors().is_empty());
    }

    #[test]
    fn incompatible_rate_drops_the_stream() {
        let mut rs: Resampler<f64> =
            Resampler::new(ResamplerConfig::with_target_rate(1e9)).unwrap();
        // target/rate beyond the i32 overflow guard
        let rec = record(0.0, 1e-7, vec![0.0; 10]);
        assert!(rs.feed(&rec).is_none());
        assert!(rs.stage_factors().is_empty());
    }

    #[test]
    fn near_unity_ratio_drops_every_record() {
        let mut rs: Resampler<f64> =
            Resampler::new(ResamplerConfig::with_target_rate(100.0)).unwrap();
        // 100.0000001 Hz reduces to 1/1 against a 100 Hz target: no stages
        // can be built, records are dropped (warned once, then silently).
        for k in 0..3 {
            let rec = record(k as f64, 100.0000001, vec![1.0; 100]);
            assert!(rs.feed(&rec).is_none());
        }
        assert!(rs.stage_factors().is_empty());
    }

    #[test]
    fn rate_change_rebuilds_stages() {
        let mut rs: Resampler<f64> =
            Resampler::new(ResamplerConfig::with_target_rate(25.0)).unwrap();
        rs.feed(&record(0.0, 100.0, vec![0.0; 200]));
        assert_eq!(rs.stage_factors(), vec![4]);

        // Mid-stream rate change: stages are rebuilt for 50 Hz -> 25 Hz
        rs.feed(&record(2.0, 50.0, vec![0.0; 100]));
        assert_eq!(rs.stage_factors(), vec![2]);
    }

    #[test]
    fn interpolator_fill_produces_no_record() {
        let mut rs: Resampler<f64> =
            Resampler::new(ResamplerConfig::with_target_rate(200.0)).unwrap();
        // Exactly fills the interpolation ring (2*3 + 2 samples): no
        // output record, and in particular no empty one stamped at the
        // epoch.
        assert!(rs.feed(&record(10.0, 100.0, vec![1.0; 8])).is_none());
        let out = rs.feed(&record(10.08, 100.0, vec![1.0; 100])).unwrap();
        assert!(!out.is_empty());
        assert!((out.start_time - 10.03).abs() < 1e-9);
    }

    #[test]
    fn mixed_ratio_builds_both_stages() {
        let mut rs: Resampler<f64> =
            Resampler::new(ResamplerConfig::with_target_rate(40.0)).unwrap();
        rs.feed(&record(0.0, 100.0, vec![0.0; 100]));
        // 40/100 = 2/5: upsample by 2, then decimate by 5
        assert_eq!(rs.stage_factors(), vec![2, 5]);
    }

    #[test]
    fn reset_clears_stream_state() {
        let mut rs: Resampler<f64> =
            Resampler::new(ResamplerConfig::with_target_rate(25.0)).unwrap();
        rs.feed(&record(0.0, 100.0, vec![0.0; 200]));
        assert!(!rs.stage_factors().is_empty());
        rs.reset();
        assert!(rs.stage_factors().is_empty());
    }

    #[test]
    fn clone_copies_config_only() {
        let mut rs: Resampler<f64> =
            Resampler::new(ResamplerConfig::with_target_rate(25.0)).unwrap();
        rs.feed(&record(0.0, 100.0, vec![0.0; 200]));
        let fresh = rs.clone();
        assert_eq!(fresh.target_rate(), 25.0);
        assert!(fresh.stage_factors().is_empty());
    }
}
