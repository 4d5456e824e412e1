//! On-disk record format of the llvmprof profiling runtime.
//!
//! A profile file is a flat sequence of self-describing records:
//!
//! ```text
//! [i32 tag][count][payload]
//! ```
//!
//! - The first record is always [`RecordType::ArgumentInfo`]: a `u32` byte
//!   length, the space-joined command line, and zero padding to a multiple of
//!   four bytes.
//! - Word-counter records carry a `u32` count and `u32` elements.
//! - Wide-counter and timing records carry a `u64` count and 8-byte elements.
//!
//! All integers are native byte order; counter records are never padded.

pub mod element;
pub mod error;
pub mod frame;
pub mod record;

pub use element::{payload_bytes, CounterElement};
pub use error::{Error, Result};
pub use frame::{argument_padding, encode_arguments, Frame, FrameReader, RecordHeader};
pub use record::{CountWidth, ElementKind, Layout, RecordType, FORMAT_VERSION};
