//! Streaming rational resampling for timestamped waveform records.
//!
//! A [`Resampler`] converts a stream of records to a fixed target rate by
//! approximating `target / source` as a reduced integer fraction and
//! running a Lanczos interpolation stage and/or a chain of FIR decimation
//! stages. Timestamps are compensated for filter group delay, gaps reset
//! the stream state and overlapping decimation input is dropped.
//!
//! Three entry points, from lowest to highest level:
//! - [`Resampler`] for direct per-stream use,
//! - [`ResampleFilter`] behind the generic [`RecordFilter`] interface,
//! - [`ResampleStream`] wrapping a whole [`RecordSource`] with per-stream
//!   demultiplexing.
//!
//! [`RecordFilter`]: seisflow_foundation::RecordFilter
//! [`RecordSource`]: seisflow_foundation::RecordSource

pub mod coefficients;
mod downsample;
mod filter;
pub mod ratio;
pub mod remez;
mod resampler;
mod stage;
mod stream;
mod upsample;

pub use coefficients::{cached_factor_count, CacheHandle, FilterSpec};
pub use filter::ResampleFilter;
pub use resampler::{Resampler, ResamplerConfig};
pub use stream::{ResampleStream, StreamAddress};
