use crate::record::Record;

/// Push interface for in-place record transforms.
///
/// `feed` may buffer internally and return nothing until enough input has
/// accumulated; that is a normal outcome, not an error.
pub trait RecordFilter: Send {
    /// Feed one record, receive at most one transformed record.
    fn feed(&mut self, record: &Record) -> Option<Record>;

    /// Emit whatever the filter still holds at end of stream, if anything.
    fn flush(&mut self) -> Option<Record>;

    /// Drop all processing state, keep the configuration.
    fn reset(&mut self);

    /// A fresh filter with the same configuration and no state.
    fn clone_filter(&self) -> Box<dyn RecordFilter>;
}
