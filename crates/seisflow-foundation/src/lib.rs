pub mod error;
pub mod filter;
pub mod record;
pub mod sample;
pub mod source;

pub use error::StreamError;
pub use filter::RecordFilter;
pub use record::{Record, SampleBuffer};
pub use sample::{DataType, Sample};
pub use source::RecordSource;
