//! Profiling runtime for llvmprof-instrumented programs.
//!
//! The runtime captures the program's command line once, lazily opens an
//! append-only output file, and writes counter arrays to it as framed binary
//! records (see [`llvmprof_format`]).
//!
//! # Configuration
//!
//! - `-llvmprof-output <path>`: output file, stripped from the arguments.
//! - `LLVMPROF_OUTPUT`: output file when no flag is given.
//! - `PROFILING_OUTDIR`: directory prefix, created if missing.
//! - `MASTER_RANK`: only this rank emits rank-filtered records.
//! - `LLVMPROF_LOG`: filter for runtime diagnostics (default `warn`).
//!
//! # Feature Flags
//!
//! - `ffi` (default): export the C entry points (`save_arguments`,
//!   `write_profiling_data`, ...).
//! - `pid-suffix`: append `.<pid>` to the output file name.
//!
//! # Usage
//!
//! Save the arguments at startup:
//!
//! ```ignore
//! let mut args: Vec<std::ffi::OsString> = std::env::args_os().collect();
//! llvmprof_runtime::save_arguments(&mut args);
//! ```
//!
//! Write counters whenever they are ready:
//!
//! ```ignore
//! use llvmprof_runtime::RecordType;
//!
//! llvmprof_runtime::write_counters(RecordType::EdgeInfo, &edge_counts);
//! ```
//!
//! A [`ProfileSession`] can also be built and used directly; its methods
//! return errors instead of terminating the process.
//!
//! # Logging
//!
//! Diagnostics go through `tracing`. The Rust API leaves the global
//! subscriber to the host; the C entry points install [`logging::init`]'s
//! stderr subscriber on first use.

mod config;
mod context;
pub mod env;
mod error;
#[cfg(feature = "ffi")]
pub mod ffi;
pub mod logging;
mod rank;
mod session;
mod stream;

// Re-export public API
pub use config::{
    ArgumentResolver, OutputTarget, RuntimeConfig, SavedInvocation, TargetSource, DEFAULT_OUTPUT,
    OUTPUT_FLAG, RESERVED_PREFIX,
};
pub use context::{
    fatal, install, is_initialized, save_arguments, session, write_counters,
    write_float_counters, write_mpi_time_counters, write_rank_float_counters,
    write_wide_counters, FATAL_EXIT_CODE,
};
pub use error::{Error, Result};
pub use rank::{parse_rank, RankFilter};
pub use session::{ProfileSession, SessionBuilder};
pub use stream::{compose_path, Filesystem, OpenStream, OsFilesystem, SinkFile, StreamStatus};

pub use llvmprof_format::RecordType;
