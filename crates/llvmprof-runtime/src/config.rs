//! Runtime configuration and command-line argument capture.
//!
//! The output file is chosen with the following precedence:
//!
//! 1. `-llvmprof-output <path>` on the command line
//! 2. the `LLVMPROF_OUTPUT` environment variable
//! 3. [`DEFAULT_OUTPUT`]
//!
//! Arguments starting with [`RESERVED_PREFIX`] belong to the runtime and are
//! stripped before the program sees its argument vector.
//!
//! Arguments and environment values are handled as OS strings, so bytes that
//! are not valid UTF-8 reach the output path and the argument record intact.

use std::ffi::{OsStr, OsString};

use tracing::{debug, warn};

use crate::env::{Environment, OUTPUT_VAR};

/// Output file name used when nothing else is configured.
pub const DEFAULT_OUTPUT: &str = "llvmprof.out";

/// Prefix of arguments reserved for the runtime.
pub const RESERVED_PREFIX: &str = "-llvmprof-";

/// Flag selecting the output file.
pub const OUTPUT_FLAG: &str = "-llvmprof-output";

/// Static runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Output file name when neither flag nor environment set one.
    pub default_output: String,
    /// Append `.<pid>` to the output file name.
    pub pid_suffix: bool,
    /// Permission bits for a created output directory.
    pub dir_mode: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_output: DEFAULT_OUTPUT.to_string(),
            pid_suffix: cfg!(feature = "pid-suffix"),
            dir_mode: 0o755,
        }
    }
}

impl RuntimeConfig {
    /// Set whether the process id is appended to the output file name.
    #[must_use]
    pub const fn with_pid_suffix(mut self, enabled: bool) -> Self {
        self.pid_suffix = enabled;
        self
    }
}

/// Where the active output target came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSource {
    /// [`RuntimeConfig::default_output`].
    Default,
    /// `LLVMPROF_OUTPUT`.
    Environment,
    /// `-llvmprof-output`.
    Flag,
}

/// The output file path, before directory prefix and pid suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    path: OsString,
    source: TargetSource,
}

impl OutputTarget {
    fn new(path: impl Into<OsString>, source: TargetSource) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }

    /// Target path.
    #[must_use]
    pub fn path(&self) -> &OsStr {
        &self.path
    }

    /// Origin of the target.
    #[must_use]
    pub const fn source(&self) -> TargetSource {
        self.source
    }
}

/// The program's residual command line, as written to the argument record.
///
/// Each argument is followed by a single space. On Unix the bytes are exactly
/// the `argv` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedInvocation {
    bytes: Vec<u8>,
}

impl SavedInvocation {
    /// Join `args`; `None` if the result would be empty.
    #[must_use]
    pub fn from_args<T: AsRef<OsStr>>(args: &[T]) -> Option<Self> {
        let len: usize = args.iter().map(|arg| arg.as_ref().len() + 1).sum();
        if len == 0 {
            return None;
        }
        let mut bytes = Vec::with_capacity(len);
        for arg in args {
            bytes.extend_from_slice(arg.as_ref().as_encoded_bytes());
            bytes.push(b' ');
        }
        Some(Self { bytes })
    }

    /// Joined bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Joined length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; empty invocations are never saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Captures the invocation and resolves the output target once.
#[derive(Debug, Clone)]
pub struct ArgumentResolver {
    target: OutputTarget,
    env_checked: bool,
    saved: Option<SavedInvocation>,
}

impl ArgumentResolver {
    /// Create a resolver starting from the configured default target.
    #[must_use]
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            target: OutputTarget::new(config.default_output.clone(), TargetSource::Default),
            env_checked: false,
            saved: None,
        }
    }

    /// Adopt `LLVMPROF_OUTPUT` as the target, once.
    ///
    /// Skipped after an invocation was captured, so a flag is never
    /// overridden by the environment.
    pub fn capture_environment(&mut self, env: &dyn Environment) {
        if self.env_checked || self.saved.is_some() {
            return;
        }
        self.env_checked = true;
        if let Some(path) = env.non_empty(OUTPUT_VAR) {
            debug!(path = ?path, "output target from {}", OUTPUT_VAR);
            self.target = OutputTarget::new(path, TargetSource::Environment);
        }
    }

    /// Strip runtime flags from `args` and save the rest.
    ///
    /// `args[0]` is the program name and is never treated as a flag. Returns
    /// the new argument count. Once an invocation has been saved, further
    /// calls leave `args` alone and return its current length.
    pub fn resolve<T: AsRef<OsStr>>(
        &mut self,
        env: &dyn Environment,
        args: &mut Vec<T>,
    ) -> usize {
        self.capture_environment(env);
        if self.saved.is_some() {
            return args.len();
        }

        while args.len() > 1 && is_reserved(args[1].as_ref()) {
            let flag = args.remove(1);
            if flag.as_ref() != OUTPUT_FLAG {
                warn!(
                    option = %flag.as_ref().to_string_lossy(),
                    "unknown option to the profiler runtime ignored"
                );
                continue;
            }
            if args.len() == 1 {
                warn!("{} requires a filename argument", OUTPUT_FLAG);
                continue;
            }
            let value = args.remove(1);
            debug!(path = ?value.as_ref(), "output target from {}", OUTPUT_FLAG);
            self.target = OutputTarget::new(value.as_ref(), TargetSource::Flag);
        }

        self.saved = SavedInvocation::from_args(args);
        args.len()
    }

    /// Active output target.
    #[must_use]
    pub const fn target(&self) -> &OutputTarget {
        &self.target
    }

    /// Saved invocation, if one was captured.
    #[must_use]
    pub const fn invocation(&self) -> Option<&SavedInvocation> {
        self.saved.as_ref()
    }
}

fn is_reserved(arg: &OsStr) -> bool {
    arg.as_encoded_bytes().starts_with(RESERVED_PREFIX.as_bytes())
}
