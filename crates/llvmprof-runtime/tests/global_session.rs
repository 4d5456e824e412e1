//! The process-wide entry points, including the C ABI.

use std::ffi::{c_char, CString};
use std::fs;
use std::ptr;

use llvmprof_format::{FrameReader, RecordType, Result as FormatResult};
use llvmprof_runtime::env::{MapEnv, MASTER_RANK_VAR, OUTDIR_VAR};
use llvmprof_runtime::{ProfileSession, RuntimeConfig};
use tempfile::TempDir;

#[test]
fn test_global_entry_points() {
    let dir = TempDir::new().unwrap();
    let env = MapEnv::new()
        .with(OUTDIR_VAR, dir.path())
        .with(MASTER_RANK_VAR, "0");
    let session = ProfileSession::builder()
        .config(RuntimeConfig::default().with_pid_suffix(false))
        .environment(env)
        .build();
    assert!(llvmprof_runtime::install(session).is_ok());
    assert!(llvmprof_runtime::is_initialized());

    let owned: Vec<CString> = ["prog", "-llvmprof-output", "global.out", "data"]
        .iter()
        .map(|arg| CString::new(*arg).unwrap())
        .collect();
    let mut argv: Vec<*const c_char> = owned.iter().map(|arg| arg.as_ptr()).collect();

    // SAFETY: `argv` holds four valid C strings that outlive the call.
    let argc = unsafe { llvmprof_runtime::ffi::save_arguments(4, argv.as_mut_ptr()) };
    assert_eq!(argc, 2);
    assert_eq!(argv[0], owned[0].as_ptr());
    assert_eq!(argv[1], owned[3].as_ptr());
    assert!(argv[2].is_null());
    assert!(argv[3].is_null());

    // Already captured: the Rust entry point leaves this vector alone.
    let mut again = vec!["other", "-llvmprof-output", "ignored.out"];
    assert_eq!(llvmprof_runtime::save_arguments(&mut again), 3);

    llvmprof_runtime::write_counters(RecordType::EdgeInfo, &[1, 2]);
    assert!(llvmprof_runtime::write_rank_float_counters(
        RecordType::RankTimeInfo,
        &[2.0],
        &[0]
    ));
    assert!(!llvmprof_runtime::write_rank_float_counters(
        RecordType::RankTimeInfo,
        &[3.0],
        &[1]
    ));

    let wide = [9u64, 10];
    let times = [0.125f64];
    let ranks = [4i32];
    // SAFETY: every pointer refers to a live array of the stated length.
    unsafe {
        llvmprof_runtime::ffi::write_profiling_data_long(
            RecordType::WideCounterInfo.tag(),
            wide.as_ptr(),
            2,
        );
        llvmprof_runtime::ffi::write_mpitime_profiling_data_double(
            RecordType::MpiTimeInfo.tag(),
            times.as_ptr(),
            1,
        );
        llvmprof_runtime::ffi::write_time_rank_profiling_data_double(
            RecordType::RankTimeInfo.tag(),
            times.as_ptr(),
            1,
            ranks.as_ptr(),
            1,
        );
        llvmprof_runtime::ffi::write_profiling_data(RecordType::FunctionInfo.tag(), ptr::null(), 0);
    }

    let bytes = fs::read(dir.path().join("global.out")).unwrap();
    let frames: Vec<_> = FrameReader::new(&bytes)
        .collect::<FormatResult<_>>()
        .unwrap();
    let types: Vec<_> = frames.iter().map(|frame| frame.record_type).collect();
    assert_eq!(
        types,
        vec![
            RecordType::ArgumentInfo,
            RecordType::EdgeInfo,
            RecordType::RankTimeInfo,
            RecordType::WideCounterInfo,
            RecordType::MpiTimeInfo,
            RecordType::FunctionInfo,
        ]
    );
    assert_eq!(frames[0].arguments(), Some(&b"prog data "[..]));
    assert_eq!(frames[2].elements::<f64>(), Some(vec![2.0]));
    assert_eq!(frames[3].elements::<u64>(), Some(vec![9, 10]));
    assert_eq!(frames[5].count, 0);

    let duplicate = ProfileSession::builder().environment(MapEnv::new()).build();
    assert!(llvmprof_runtime::install(duplicate).is_err());
}
