use crate::error::StreamError;
use crate::sample::{DataType, Sample};

/// Typed sample storage of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleBuffer {
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl SampleBuffer {
    pub fn data_type(&self) -> DataType {
        match self {
            SampleBuffer::Int(_) => DataType::Int,
            SampleBuffer::Float(_) => DataType::Float,
            SampleBuffer::Double(_) => DataType::Double,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SampleBuffer::Int(v) => v.len(),
            SampleBuffer::Float(v) => v.len(),
            SampleBuffer::Double(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the samples as plain f64 values.
    pub fn values(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        match self {
            SampleBuffer::Int(v) => Box::new(v.iter().map(|&s| s as f64)),
            SampleBuffer::Float(v) => Box::new(v.iter().map(|&s| s as f64)),
            SampleBuffer::Double(v) => Box::new(v.iter().copied()),
        }
    }

    /// Copy into the requested storage type.
    pub fn convert_to(&self, data_type: DataType) -> SampleBuffer {
        if self.data_type() == data_type {
            return self.clone();
        }
        match data_type {
            DataType::Int => SampleBuffer::Int(self.values().map(i32::from_f64).collect()),
            DataType::Float => SampleBuffer::Float(self.values().map(|v| v as f32).collect()),
            DataType::Double => SampleBuffer::Double(self.values().collect()),
        }
    }
}

/// A finite, timestamped block of samples at a fixed rate for one channel.
///
/// Times are seconds since the epoch. Records for one stream identity are
/// expected in non-decreasing start-time order; gaps and overlaps happen
/// and are detected downstream, never assumed absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub network: String,
    pub station: String,
    pub location: String,
    pub channel: String,
    /// Time of the first sample, seconds since the epoch.
    pub start_time: f64,
    pub sampling_rate: f64,
    pub samples: SampleBuffer,
}

impl Record {
    pub fn new(
        network: impl Into<String>,
        station: impl Into<String>,
        location: impl Into<String>,
        channel: impl Into<String>,
        start_time: f64,
        sampling_rate: f64,
        samples: SampleBuffer,
    ) -> Self {
        Self {
            network: network.into(),
            station: station.into(),
            location: location.into(),
            channel: channel.into(),
            start_time,
            sampling_rate,
            samples,
        }
    }

    /// "NET.STA.LOC.CHA" identity the stream is demultiplexed on.
    pub fn stream_id(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.network, self.station, self.location, self.channel
        )
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Time one sample period past the last sample.
    pub fn end_time(&self) -> Result<f64, StreamError> {
        if !self.start_time.is_finite()
            || !self.sampling_rate.is_finite()
            || self.sampling_rate <= 0.0
        {
            return Err(StreamError::InvalidEndTime {
                stream: self.stream_id(),
            });
        }
        Ok(self.start_time + self.len() as f64 / self.sampling_rate)
    }

    /// Same identity, new payload. Used by the resampler stages to emit
    /// output records that keep the input's channel naming.
    pub fn with_payload(&self, start_time: f64, sampling_rate: f64, samples: SampleBuffer) -> Self {
        Self {
            network: self.network.clone(),
            station: self.station.clone(),
            location: self.location.clone(),
            channel: self.channel.clone(),
            start_time,
            sampling_rate,
            samples,
        }
    }
}
