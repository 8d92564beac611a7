use std::borrow::Cow;
use std::fmt::Debug;

use crate::record::SampleBuffer;

/// Storage type of a record's sample array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int,
    Float,
    Double,
}

/// Numeric element type a resampler can operate on.
///
/// The filter math always runs in f64; conversion back to the native
/// element type happens only at the output boundary. Conversions are
/// value-preserving (a count of 1200 stays 1200), not amplitude-normalized.
pub trait Sample: Copy + PartialEq + Debug + Send + Sync + 'static {
    const DATA_TYPE: DataType;

    fn to_f64(self) -> f64;

    fn from_f64(value: f64) -> Self;

    /// Borrow the buffer's samples if it already holds this element type.
    fn slice(buffer: &SampleBuffer) -> Option<&[Self]>;

    fn into_buffer(samples: Vec<Self>) -> SampleBuffer;

    /// Borrow when the types match, convert element-wise otherwise.
    fn convert(buffer: &SampleBuffer) -> Cow<'_, [Self]> {
        match Self::slice(buffer) {
            Some(samples) => Cow::Borrowed(samples),
            None => Cow::Owned(buffer.values().map(Self::from_f64).collect()),
        }
    }
}

impl Sample for i32 {
    const DATA_TYPE: DataType = DataType::Int;

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> Self {
        // Saturating cast; NaN becomes 0. NaN accumulators are reported
        // by the stages before this conversion runs.
        value.round() as i32
    }

    fn slice(buffer: &SampleBuffer) -> Option<&[Self]> {
        match buffer {
            SampleBuffer::Int(v) => Some(v),
            _ => None,
        }
    }

    fn into_buffer(samples: Vec<Self>) -> SampleBuffer {
        SampleBuffer::Int(samples)
    }
}

impl Sample for f32 {
    const DATA_TYPE: DataType = DataType::Float;

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> Self {
        value as f32
    }

    fn slice(buffer: &SampleBuffer) -> Option<&[Self]> {
        match buffer {
            SampleBuffer::Float(v) => Some(v),
            _ => None,
        }
    }

    fn into_buffer(samples: Vec<Self>) -> SampleBuffer {
        SampleBuffer::Float(samples)
    }
}

impl Sample for f64 {
    const DATA_TYPE: DataType = DataType::Double;

    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(value: f64) -> Self {
        value
    }

    fn slice(buffer: &SampleBuffer) -> Option<&[Self]> {
        match buffer {
            SampleBuffer::Double(v) => Some(v),
            _ => None,
        }
    }

    fn into_buffer(samples: Vec<Self>) -> SampleBuffer {
        SampleBuffer::Double(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_conversion_preserves_counts() {
        let buffer = SampleBuffer::Int(vec![-1200, 0, 35_000]);
        let as_f64 = f64::convert(&buffer);
        assert_eq!(as_f64.as_ref(), &[-1200.0, 0.0, 35_000.0]);
    }

    #[test]
    fn int_from_f64_rounds_to_nearest() {
        assert_eq!(i32::from_f64(2.5001), 3);
        assert_eq!(i32::from_f64(-2.5001), -3);
        assert_eq!(i32::from_f64(2.4), 2);
    }

    #[test]
    fn matching_type_borrows() {
        let buffer = SampleBuffer::Float(vec![1.5, -0.5]);
        match f32::convert(&buffer) {
            Cow::Borrowed(_) => {}
            Cow::Owned(_) => panic!("same-type conversion should not copy"),
        }
    }
}
