//! Resampling record-source decorator.
//!
//! Wraps any [`RecordSource`] and resamples every stream it carries to one
//! common rate, demultiplexing by stream id so each `NET.STA.LOC.CHA`
//! keeps its own filter state. Configured either programmatically or from
//! a chained address of the form
//! `service/address?rate=R&fp=F&fs=S&cs=C`.

use std::collections::HashMap;

use seisflow_foundation::{Record, RecordSource, StreamError};

use crate::resampler::{Resampler, ResamplerConfig};

/// A parsed chained stream address: the inner service specification plus
/// the resampling parameters from the query string.
#[derive(Debug, Clone)]
pub struct StreamAddress {
    /// Inner service name, e.g. `slink`.
    pub service: String,
    /// Inner service address, passed through untouched.
    pub address: String,
    pub config: ResamplerConfig,
}

impl StreamAddress {
    /// Parse `service/address?rate=R&fp=F&fs=S&cs=C`.
    ///
    /// `rate` is required; the filter parameters default like
    /// [`ResamplerConfig::default`]. Unknown query keys are ignored. A `?`
    /// inside the inner address is left alone, only the last one starts
    /// the resampling query.
    pub fn parse(input: &str) -> Result<Self, StreamError> {
        let (chain, query) = match input.rsplit_once('?') {
            Some((c, q)) => (c, Some(q)),
            None => (input, None),
        };

        let (service, address) = chain
            .split_once('/')
            .ok_or_else(|| StreamError::Config(format!("invalid address {input:?}: missing '/'")))?;

        let mut config = ResamplerConfig::default();
        let mut rate_seen = false;

        if let Some(query) = query {
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                let (key, value) = pair
                    .split_once('=')
                    .ok_or_else(|| StreamError::Config(format!("malformed parameter {pair:?}")))?;
                match key {
                    "rate" => {
                        config.target_rate = parse_positive_f64(key, value)?;
                        rate_seen = true;
                    }
                    "fp" => config.passband_edge = parse_positive_f64(key, value)?,
                    "fs" => config.stopband_edge = parse_positive_f64(key, value)?,
                    "cs" => {
                        config.coeff_scale = value.parse::<u32>().ok().filter(|&v| v > 0).ok_or_else(
                            || {
                                StreamError::Config(format!(
                                    "parameter cs must be a positive integer, got {value:?}"
                                ))
                            },
                        )?;
                    }
                    _ => {}
                }
            }
        }

        if !rate_seen {
            return Err(StreamError::Config(format!(
                "invalid address {input:?}: missing rate parameter"
            )));
        }
        config.validate()?;

        Ok(Self {
            service: service.to_string(),
            address: address.to_string(),
            config,
        })
    }
}

fn parse_positive_f64(key: &str, value: &str) -> Result<f64, StreamError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or_else(|| {
            StreamError::Config(format!(
                "parameter {key} must be a positive number, got {value:?}"
            ))
        })
}

/// Record source that resamples everything the wrapped source delivers.
pub struct ResampleStream<S: RecordSource> {
    source: S,
    config: ResamplerConfig,
    streams: HashMap<String, Resampler<f64>>,
}

impl<S: RecordSource> ResampleStream<S> {
    pub fn new(source: S, config: ResamplerConfig) -> Result<Self, StreamError> {
        config.validate()?;
        Ok(Self {
            source,
            config,
            streams: HashMap::new(),
        })
    }

    /// Build from a chained address; the inner source is already opened by
    /// the caller from `address.service` and `address.address`.
    pub fn open(source: S, address: &StreamAddress) -> Self {
        Self {
            source,
            config: address.config.clone(),
            streams: HashMap::new(),
        }
    }

    /// Number of stream identities seen so far.
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }
}

impl<S: RecordSource> RecordSource for ResampleStream<S> {
    /// Pulls from the wrapped source until some stream's resampler emits a
    /// record. Ends when the wrapped source is exhausted; per-stream state
    /// buffered for group delay is not flushed.
    fn next_record(&mut self) -> Option<Record> {
        loop {
            let record = self.source.next_record()?;
            let id = record.stream_id();
            let resampler = self
                .streams
                .entry(id)
                .or_insert_with(|| Resampler::from_validated(self.config.clone()));
            if let Some(out) = resampler.feed(&record) {
                return Some(out);
            }
        }
    }
}
