//! Error types for the profiling runtime.

use std::io;
use std::path::PathBuf;

use llvmprof_format::{ElementKind, RecordType};
use thiserror::Error;

/// Runtime error type.
///
/// The process-wide entry points treat every variant as fatal.
#[derive(Error, Debug)]
pub enum Error {
    /// Output file could not be opened.
    #[error("while opening '{}': {source}", .path.display())]
    Open {
        /// Fully composed output path.
        path: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },

    /// A write to the output file failed.
    #[error("unable to write to output file '{}': {source}", .path.display())]
    Write {
        /// Fully composed output path.
        path: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },

    /// A write to the output file was only partially applied.
    #[error("short write to output file '{}': wrote {written} of {expected} bytes", .path.display())]
    ShortWrite {
        /// Fully composed output path.
        path: PathBuf,
        /// Bytes accepted by the OS.
        written: usize,
        /// Bytes requested.
        expected: usize,
    },

    /// The output file failed to open earlier in this session.
    #[error("output file '{}' is unavailable after a failed open", .path.display())]
    StreamUnavailable {
        /// Output path of the failed open.
        path: PathBuf,
    },

    /// A C caller passed a null array with a nonzero length.
    #[error("null {what} array with {count} elements")]
    NullArray {
        /// Which argument was null.
        what: &'static str,
        /// Length the caller claimed.
        count: usize,
    },

    /// Record type does not hold the given element kind.
    #[error("record type '{}' cannot hold {element:?} elements", .record_type.name())]
    LayoutMismatch {
        /// Requested record type.
        record_type: RecordType,
        /// Element kind of the payload.
        element: ElementKind,
    },

    /// Record could not be framed.
    #[error(transparent)]
    Format(#[from] llvmprof_format::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
