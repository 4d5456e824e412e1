//! C entry points called by instrumented code.
//!
//! Symbol names and signatures match the classic `libprofile` runtime so
//! existing instrumentation passes link against this crate unchanged. All of
//! them go through the process-wide session in [`crate::context`], and the
//! first call installs the stderr subscriber from [`crate::logging`].

use std::ffi::{c_char, c_int, c_uint, CStr, OsStr, OsString};
use std::ptr;
use std::sync::Once;

use crate::context;
use crate::error::Error;
use crate::logging;
use crate::session::ProfileSession;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(logging::init);
}

/// One `argv` entry with its raw bytes.
struct CArg {
    ptr: *const c_char,
    text: OsString,
}

impl CArg {
    /// # Safety
    /// `ptr` must be null or a valid NUL-terminated string.
    unsafe fn new(ptr: *const c_char) -> Self {
        let text = if ptr.is_null() {
            OsString::new()
        } else {
            // SAFETY: non-null and NUL-terminated per the caller's contract.
            os_string(unsafe { CStr::from_ptr(ptr) })
        };
        Self { ptr, text }
    }
}

impl AsRef<OsStr> for CArg {
    fn as_ref(&self) -> &OsStr {
        &self.text
    }
}

#[cfg(unix)]
fn os_string(text: &CStr) -> OsString {
    use std::os::unix::ffi::OsStrExt;
    OsStr::from_bytes(text.to_bytes()).to_os_string()
}

#[cfg(not(unix))]
fn os_string(text: &CStr) -> OsString {
    OsString::from(text.to_string_lossy().into_owned())
}

/// View `len` elements at `start`.
///
/// A null `start` is accepted only with `len == 0`; otherwise the caller's
/// count cannot be honored and the process terminates.
///
/// # Safety
/// `start` must be null or point to `len` initialized elements.
unsafe fn elements<'a, T>(what: &'static str, start: *const T, len: usize) -> &'a [T] {
    if len == 0 {
        &[]
    } else if start.is_null() {
        context::fatal(&Error::NullArray { what, count: len })
    } else {
        // SAFETY: guaranteed by the caller.
        unsafe { std::slice::from_raw_parts(start, len) }
    }
}

/// Strip `-llvmprof-*` arguments from `argv` in place and save the rest.
///
/// Returns the new argument count. Entries past it are nulled.
///
/// # Safety
/// `argv` must be null or point to `argc` valid, NUL-terminated strings in a
/// writable array.
#[no_mangle]
pub unsafe extern "C" fn save_arguments(argc: c_int, argv: *mut *const c_char) -> c_int {
    init_logging();
    // SAFETY: forwarded from the caller.
    unsafe { save_into(context::session(), argc, argv) }
}

/// # Safety
/// Same contract as [`save_arguments`].
unsafe fn save_into(session: &ProfileSession, argc: c_int, argv: *mut *const c_char) -> c_int {
    let Ok(len) = usize::try_from(argc) else {
        session.capture_environment();
        return argc;
    };
    if argv.is_null() {
        session.capture_environment();
        return argc;
    }

    // SAFETY: `argv` holds `argc` writable entries per the caller's contract.
    let slots = unsafe { std::slice::from_raw_parts_mut(argv, len) };
    // SAFETY: each entry is a valid C string per the caller's contract.
    let mut args: Vec<CArg> = slots.iter().map(|&arg| unsafe { CArg::new(arg) }).collect();
    let count = session.save_arguments(&mut args);

    for (slot, arg) in slots.iter_mut().zip(&args) {
        *slot = arg.ptr;
    }
    for slot in &mut slots[count..] {
        *slot = ptr::null();
    }
    c_int::try_from(count).unwrap_or(argc)
}

/// Write `num_elements` 32-bit counters.
///
/// # Safety
/// `start` must point to `num_elements` counters, or be null when
/// `num_elements` is 0.
#[no_mangle]
pub unsafe extern "C" fn write_profiling_data(pt: c_int, start: *const c_uint, num_elements: c_uint) {
    init_logging();
    // SAFETY: guaranteed by the caller.
    let data = unsafe { elements("counter", start, num_elements as usize) };
    context::write_tagged(pt, data, None);
}

/// Write `num_elements` 64-bit counters.
///
/// # Safety
/// `start` must point to `num_elements` counters, or be null when
/// `num_elements` is 0.
#[no_mangle]
pub unsafe extern "C" fn write_profiling_data_long(pt: c_int, start: *const u64, num_elements: u64) {
    init_logging();
    // SAFETY: guaranteed by the caller.
    let data = unsafe { elements("counter", start, element_count(num_elements)) };
    context::write_tagged(pt, data, None);
}

/// Write `num_elements` doubles.
///
/// # Safety
/// `start` must point to `num_elements` doubles, or be null when
/// `num_elements` is 0.
#[no_mangle]
pub unsafe extern "C" fn write_profiling_data_double(pt: c_int, start: *const f64, num_elements: u64) {
    init_logging();
    // SAFETY: guaranteed by the caller.
    let data = unsafe { elements("counter", start, element_count(num_elements)) };
    context::write_tagged(pt, data, None);
}

/// Write `num_elements` doubles if `start_rank[0]` equals `MASTER_RANK`.
///
/// # Safety
/// `start` must point to `num_elements` doubles and `start_rank` to
/// `num_rank_elements` ints. Either may be null when its length is 0.
#[no_mangle]
pub unsafe extern "C" fn write_time_rank_profiling_data_double(
    pt: c_int,
    start: *const f64,
    num_elements: u64,
    start_rank: *const c_int,
    num_rank_elements: c_int,
) {
    init_logging();
    // SAFETY: guaranteed by the caller.
    let data = unsafe { elements("counter", start, element_count(num_elements)) };
    let rank_len = usize::try_from(num_rank_elements).unwrap_or(0);
    // SAFETY: guaranteed by the caller.
    let ranks = unsafe { elements("rank", start_rank, rank_len) };
    context::write_tagged(pt, data, Some(ranks));
}

/// Write `num_elements` MPI timings.
///
/// # Safety
/// `start` must point to `num_elements` doubles, or be null when
/// `num_elements` is 0.
#[no_mangle]
pub unsafe extern "C" fn write_mpitime_profiling_data_double(
    pt: c_int,
    start: *const f64,
    num_elements: u64,
) {
    init_logging();
    // SAFETY: guaranteed by the caller.
    let data = unsafe { elements("counter", start, element_count(num_elements)) };
    context::write_tagged(pt, data, None);
}

fn element_count(num_elements: u64) -> usize {
    usize::try_from(num_elements).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    use crate::env::MapEnv;

    fn session() -> ProfileSession {
        ProfileSession::builder().environment(MapEnv::new()).build()
    }

    #[test]
    fn argv_bytes_are_saved_verbatim() {
        let owned = [
            CString::new("prog").unwrap(),
            CString::new(b"f\xffx".to_vec()).unwrap(),
        ];
        let mut argv: Vec<*const c_char> = owned.iter().map(|arg| arg.as_ptr()).collect();

        let s = session();
        // SAFETY: `argv` holds two valid C strings that outlive the call.
        let argc = unsafe { save_into(&s, 2, argv.as_mut_ptr()) };
        assert_eq!(argc, 2);
        assert_eq!(s.invocation().unwrap().as_bytes(), b"prog f\xffx ");
    }

    #[test]
    fn null_argv_only_reads_environment() {
        let s = ProfileSession::builder()
            .environment(MapEnv::new().with(crate::env::OUTPUT_VAR, "env.out"))
            .build();
        // SAFETY: a null `argv` is allowed.
        assert_eq!(unsafe { save_into(&s, 3, ptr::null_mut()) }, 3);
        assert!(s.invocation().is_none());
        assert_eq!(s.output_target().path(), "env.out");
    }

    #[test]
    fn null_array_with_zero_length_is_empty() {
        // SAFETY: zero elements are read.
        let data: &[u32] = unsafe { elements("counter", ptr::null(), 0) };
        assert!(data.is_empty());
    }
}
