//! Global profiling session singleton.
//!
//! These entry points never return errors: an I/O failure while writing the
//! profile terminates the process, since a partially written profile cannot
//! be trusted.
//!
//! Nothing here installs a tracing subscriber. A Rust host keeps control of
//! its own logging; only the C entry points set one up.

use std::ffi::OsStr;
use std::sync::OnceLock;

#[cfg(feature = "ffi")]
use llvmprof_format::CounterElement;
use llvmprof_format::RecordType;
use tracing::error;

use crate::error::{Error, Result};
use crate::session::ProfileSession;

/// Process-wide session.
static SESSION: OnceLock<ProfileSession> = OnceLock::new();

/// Exit status used when profile output fails.
pub const FATAL_EXIT_CODE: i32 = 1;

/// Install `session` as the process-wide session.
///
/// Must happen before any other entry point is used. Returns the session back
/// if one is already installed.
pub fn install(session: ProfileSession) -> std::result::Result<(), ProfileSession> {
    let mut pending = Some(session);
    SESSION.get_or_init(|| pending.take().unwrap_or_default());
    pending.map_or(Ok(()), Err)
}

/// The process-wide session, created from the process environment on first use.
pub fn session() -> &'static ProfileSession {
    SESSION.get_or_init(ProfileSession::new)
}

/// Check if the process-wide session exists.
#[must_use]
pub fn is_initialized() -> bool {
    SESSION.get().is_some()
}

/// Strip runtime flags from `args` and save the invocation.
///
/// Call once at startup; later calls return `args.len()` unchanged.
pub fn save_arguments<T: AsRef<OsStr>>(args: &mut Vec<T>) -> usize {
    session().save_arguments(args)
}

/// Write 32-bit counters.
pub fn write_counters(ty: RecordType, data: &[u32]) {
    or_exit(session().write_counters(ty, data));
}

/// Write 64-bit counters.
pub fn write_wide_counters(ty: RecordType, data: &[u64]) {
    or_exit(session().write_wide_counters(ty, data));
}

/// Write floating-point values.
pub fn write_float_counters(ty: RecordType, data: &[f64]) {
    or_exit(session().write_float_counters(ty, data));
}

/// Write MPI timings.
pub fn write_mpi_time_counters(ty: RecordType, data: &[f64]) {
    or_exit(session().write_mpi_time_counters(ty, data));
}

/// Write floating-point values if this process is the master rank.
pub fn write_rank_float_counters(ty: RecordType, data: &[f64], ranks: &[i32]) -> bool {
    or_exit(session().write_rank_float_counters(ty, data, ranks))
}

/// Write a record with an unchecked raw tag.
#[cfg(feature = "ffi")]
pub(crate) fn write_tagged<T: CounterElement>(tag: i32, data: &[T], ranks: Option<&[i32]>) {
    or_exit(session().write_tagged(tag, data, ranks));
}

fn or_exit<T>(result: Result<T>) -> T {
    result.unwrap_or_else(|err| fatal(&err))
}

/// Report `err` and terminate the process.
///
/// The message always goes to stderr, whether or not a subscriber is
/// listening.
pub fn fatal(err: &Error) -> ! {
    error!("profiling runtime cannot continue: {}", err);
    eprintln!("llvmprof: profiling runtime cannot continue: {err}");
    std::process::exit(FATAL_EXIT_CODE)
}
