use crate::record::Record;

/// Pull interface for anything that produces records in stream order:
/// archive readers, network clients, and the resampling decorator that
/// wraps them.
pub trait RecordSource: Send {
    /// The next record, or `None` when the source is exhausted.
    fn next_record(&mut self) -> Option<Record>;
}

impl<S: RecordSource + ?Sized> RecordSource for Box<S> {
    fn next_record(&mut self) -> Option<Record> {
        (**self).next_record()
    }
}
