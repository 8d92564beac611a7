use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("no rational approximation for {source_rate} Hz -> {target_rate} Hz")]
    IncompatibleRate { source_rate: f64, target_rate: f64 },

    #[error("{stream}: cannot compute record end time")]
    InvalidEndTime { stream: String },

    #[error("filter design failed: {0}")]
    FilterDesign(String),

    #[error("configuration error: {0}")]
    Config(String),
}
