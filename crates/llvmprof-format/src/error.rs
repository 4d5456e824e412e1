//! Error types for the record format.

use thiserror::Error;

/// Format-level error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Tag does not name a known record type.
    #[error("Unknown record type tag: {0}")]
    UnknownRecordType(i32),

    /// Element count does not fit the record's count field.
    #[error("Element count {count} does not fit a {width}-byte count field")]
    CountOverflow {
        /// Number of elements requested.
        count: u64,
        /// Width of the count field in bytes.
        width: usize,
    },

    /// Input ended in the middle of a record.
    #[error("Truncated record at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        /// Byte offset of the record start.
        offset: usize,
        /// Bytes needed to finish the record.
        needed: usize,
        /// Bytes left in the input.
        available: usize,
    },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
