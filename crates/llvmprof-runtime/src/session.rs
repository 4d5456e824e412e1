//! Profiling session: argument capture, lazy stream and record writing.

use std::ffi::OsStr;
use std::path::PathBuf;

use llvmprof_format::{
    encode_arguments, payload_bytes, CounterElement, Layout, RecordHeader, RecordType,
};
use parking_lot::Mutex;
use tracing::{debug, error, trace, warn};

use crate::config::{ArgumentResolver, OutputTarget, RuntimeConfig, SavedInvocation};
use crate::env::{Environment, ProcessEnv, OUTDIR_VAR};
use crate::error::{Error, Result};
use crate::rank::RankFilter;
use crate::stream::{
    compose_path, Filesystem, OpenStream, OsFilesystem, StreamState, StreamStatus,
};

/// Builder for [`ProfileSession`].
pub struct SessionBuilder {
    config: RuntimeConfig,
    env: Box<dyn Environment>,
    fs: Box<dyn Filesystem>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    /// Start from the process environment and the real filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            env: Box::new(ProcessEnv),
            fs: Box::new(OsFilesystem),
        }
    }

    /// Set the runtime configuration.
    #[must_use]
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the environment variable source.
    #[must_use]
    pub fn environment(mut self, env: impl Environment + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    /// Set the filesystem used to open the output file.
    #[must_use]
    pub fn filesystem(mut self, fs: impl Filesystem + 'static) -> Self {
        self.fs = Box::new(fs);
        self
    }

    /// Build the session. Nothing is opened yet.
    #[must_use]
    pub fn build(self) -> ProfileSession {
        ProfileSession {
            resolver: Mutex::new(ArgumentResolver::new(&self.config)),
            stream: Mutex::new(StreamState::Unopened),
            config: self.config,
            env: self.env,
            fs: self.fs,
        }
    }
}

/// One profiling session, normally one per process.
///
/// The output file is opened on the first record write (or
/// [`acquire_stream`](Self::acquire_stream)), at most once. Opening writes the
/// argument record. Each record is written under the stream lock, so records
/// from concurrent callers never interleave.
pub struct ProfileSession {
    config: RuntimeConfig,
    env: Box<dyn Environment>,
    fs: Box<dyn Filesystem>,
    resolver: Mutex<ArgumentResolver>,
    stream: Mutex<StreamState>,
}

impl Default for ProfileSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileSession {
    /// Session on the process environment and the real filesystem.
    #[must_use]
    pub fn new() -> Self {
        SessionBuilder::new().build()
    }

    /// Start building a session.
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Strip runtime flags from `args` and save the invocation.
    ///
    /// See [`ArgumentResolver::resolve`].
    pub fn save_arguments<T: AsRef<OsStr>>(&self, args: &mut Vec<T>) -> usize {
        self.resolver.lock().resolve(self.env.as_ref(), args)
    }

    /// Read `LLVMPROF_OUTPUT` without capturing an invocation.
    pub fn capture_environment(&self) {
        self.resolver.lock().capture_environment(self.env.as_ref());
    }

    /// Active output target.
    #[must_use]
    pub fn output_target(&self) -> OutputTarget {
        self.resolver.lock().target().clone()
    }

    /// Saved invocation, if any.
    #[must_use]
    pub fn invocation(&self) -> Option<SavedInvocation> {
        self.resolver.lock().invocation().cloned()
    }

    /// Current stream lifecycle state.
    #[must_use]
    pub fn stream_status(&self) -> StreamStatus {
        self.stream.lock().status()
    }

    /// Full output path: `[PROFILING_OUTDIR/]target[.pid]`.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        let target = {
            let mut resolver = self.resolver.lock();
            resolver.capture_environment(self.env.as_ref());
            resolver.target().path().to_os_string()
        };
        let dir = self.env.non_empty(OUTDIR_VAR);
        let pid = self.config.pid_suffix.then(std::process::id);
        compose_path(dir.as_deref(), &target, pid)
    }

    /// Open the output file if needed.
    ///
    /// The first failure is returned as [`Error::Open`]; later calls return
    /// [`Error::StreamUnavailable`] without trying again.
    pub fn acquire_stream(&self) -> Result<()> {
        let mut state = self.stream.lock();
        self.ready(&mut state).map(|_| ())
    }

    /// Write 32-bit counters.
    pub fn write_counters(&self, ty: RecordType, data: &[u32]) -> Result<()> {
        self.write_typed(ty, data, None).map(|_| ())
    }

    /// Write 64-bit counters.
    pub fn write_wide_counters(&self, ty: RecordType, data: &[u64]) -> Result<()> {
        self.write_typed(ty, data, None).map(|_| ())
    }

    /// Write floating-point values.
    pub fn write_float_counters(&self, ty: RecordType, data: &[f64]) -> Result<()> {
        self.write_typed(ty, data, None).map(|_| ())
    }

    /// Write MPI timings. Same framing as [`write_float_counters`](Self::write_float_counters).
    pub fn write_mpi_time_counters(&self, ty: RecordType, data: &[f64]) -> Result<()> {
        self.write_float_counters(ty, data)
    }

    /// Write floating-point values if this process is the master rank.
    ///
    /// With `MASTER_RANK` set, the record is written only when it equals
    /// `ranks[0]`. The stream is opened either way. Returns whether the record
    /// was written.
    pub fn write_rank_float_counters(
        &self,
        ty: RecordType,
        data: &[f64],
        ranks: &[i32],
    ) -> Result<bool> {
        self.write_typed(ty, data, Some(ranks))
    }

    fn write_typed<T: CounterElement>(
        &self,
        ty: RecordType,
        data: &[T],
        ranks: Option<&[i32]>,
    ) -> Result<bool> {
        match ty.layout() {
            Layout::Counters(kind) if kind == T::KIND => self.write_tagged(ty.tag(), data, ranks),
            _ => Err(Error::LayoutMismatch {
                record_type: ty,
                element: T::KIND,
            }),
        }
    }

    /// Write a counter record with a raw tag.
    ///
    /// The single write path behind every entry point. The tag is not checked
    /// against the element type.
    pub(crate) fn write_tagged<T: CounterElement>(
        &self,
        tag: i32,
        data: &[T],
        ranks: Option<&[i32]>,
    ) -> Result<bool> {
        let mut state = self.stream.lock();
        let stream = self.ready(&mut state)?;

        if let Some(ranks) = ranks {
            let filter = RankFilter::from_env(self.env.as_ref());
            if !filter.admits(ranks) {
                trace!(tag, ?filter, rank = ?ranks.first(), "record skipped on non-master rank");
                return Ok(false);
            }
        }

        let header = RecordHeader::new(tag, T::KIND.count_width(), data.len() as u64)?;
        stream.write_part(header.as_bytes())?;
        stream.write_part(payload_bytes(data))?;
        trace!(tag, count = data.len(), "record written");
        Ok(true)
    }

    fn ready<'s>(&self, state: &'s mut StreamState) -> Result<&'s mut OpenStream> {
        if let StreamState::Unopened = state {
            *state = StreamState::Opening;
            let path = self.output_path();
            match self.open_stream(path.clone()) {
                Ok(stream) => *state = StreamState::Ready(stream),
                Err(err) => {
                    *state = StreamState::Failed(path);
                    return Err(err);
                }
            }
        }

        match state {
            StreamState::Ready(stream) => Ok(stream),
            StreamState::Failed(path) => Err(Error::StreamUnavailable { path: path.clone() }),
            StreamState::Unopened | StreamState::Opening => Err(Error::StreamUnavailable {
                path: self.output_path(),
            }),
        }
    }

    fn open_stream(&self, path: PathBuf) -> Result<OpenStream> {
        if let Some(dir) = self.env.non_empty(OUTDIR_VAR) {
            let dir = PathBuf::from(dir);
            if !self.fs.exists(&dir) {
                if let Err(e) = self.fs.create_dir(&dir, self.config.dir_mode) {
                    warn!(dir = %dir.display(), "failed to create output directory: {}", e);
                }
            }
        }

        let file = match self.fs.open_append(&path) {
            Ok(file) => file,
            Err(source) => {
                error!(path = %path.display(), "while opening profile output: {}", source);
                return Err(Error::Open { path, source });
            }
        };
        let mut stream = OpenStream::new(file, path);

        let record = {
            let resolver = self.resolver.lock();
            let args = resolver.invocation().map_or(&[][..], SavedInvocation::as_bytes);
            encode_arguments(args)?
        };
        stream.write_part(&record)?;

        debug!(path = %stream.path().display(), "profile output opened");
        Ok(stream)
    }
}
