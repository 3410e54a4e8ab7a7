use thiserror::Error;

use crate::processor::event::Subject;

/// Errors raised by the reaction event processor.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProcessorError {
    /// Reaction toggles for one subject did not sum to -1, 0 or 1.
    ///
    /// The gateway delivers add/remove strictly alternating per user, so this
    /// indicates a bug upstream. The offending user's queue is discarded.
    #[error("Invalid net reaction count {net} on {subject}")]
    InvalidNetCount { subject: Subject, net: i64 },

    /// The drain loop was stopped before the queues became empty.
    #[error("Event processor is stopped")]
    Stopped,
}
