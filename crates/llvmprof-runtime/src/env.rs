//! Environment variables read by the runtime.

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};

/// Output file name, overridden by `-llvmprof-output`.
pub const OUTPUT_VAR: &str = "LLVMPROF_OUTPUT";

/// Directory prefix for the output file, created if missing.
pub const OUTDIR_VAR: &str = "PROFILING_OUTDIR";

/// Rank allowed to emit rank-filtered records.
pub const MASTER_RANK_VAR: &str = "MASTER_RANK";

/// Tracing filter for runtime diagnostics.
pub const LOG_VAR: &str = "LLVMPROF_LOG";

/// Source of environment variables.
///
/// Values are kept as raw OS strings; nothing is re-encoded.
pub trait Environment: Send + Sync {
    /// Value of `key`, or `None` if unset.
    fn var(&self, key: &str) -> Option<OsString>;

    /// Value of `key`, treating an empty value as unset.
    fn non_empty(&self, key: &str) -> Option<OsString> {
        self.var(key).filter(|value| !value.is_empty())
    }
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<OsString> {
        std::env::var_os(key)
    }
}

/// A fixed set of variables, independent of the process environment.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, OsString>,
}

impl MapEnv {
    /// Create an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl AsRef<OsStr>) -> Self {
        self.vars.insert(key.into(), value.as_ref().to_os_string());
        self
    }
}

impl Environment for MapEnv {
    fn var(&self, key: &str) -> Option<OsString> {
        self.vars.get(key).cloned()
    }
}
