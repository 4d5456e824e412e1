//! Output file access and the lazily opened stream state.

use std::ffi::{OsStr, OsString};
use std::fs::{self, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A writable output file.
pub trait SinkFile: Write + Send {}

impl<T: Write + Send> SinkFile for T {}

/// Filesystem operations used to open the output file.
pub trait Filesystem: Send + Sync {
    /// Whether `dir` exists.
    fn exists(&self, dir: &Path) -> bool;

    /// Create `dir` and any missing parents with permission bits `mode`.
    fn create_dir(&self, dir: &Path, mode: u32) -> io::Result<()>;

    /// Open `path` for writing, creating it if missing, positioned at its end.
    fn open_append(&self, path: &Path) -> io::Result<Box<dyn SinkFile>>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFilesystem;

impl Filesystem for OsFilesystem {
    fn exists(&self, dir: &Path) -> bool {
        dir.exists()
    }

    fn create_dir(&self, dir: &Path, mode: u32) -> io::Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;
        builder.create(dir)
    }

    fn open_append(&self, path: &Path) -> io::Result<Box<dyn SinkFile>> {
        let mut options = OpenOptions::new();
        options.write(true).create(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o666);
        }
        let mut file = options.open(path)?;
        // Not opened in append mode, so seek explicitly.
        file.seek(SeekFrom::End(0))?;
        Ok(Box::new(file))
    }
}

/// Compose `[dir/]target[.pid]`.
///
/// The directory is joined textually, so an absolute target still lands
/// under `dir`. Both parts keep their raw bytes.
#[must_use]
pub fn compose_path(dir: Option<&OsStr>, target: &OsStr, pid: Option<u32>) -> PathBuf {
    let mut path = OsString::with_capacity(target.len() + 16);
    if let Some(dir) = dir {
        path.push(dir);
        path.push("/");
    }
    path.push(target);
    if let Some(pid) = pid {
        path.push(format!(".{pid}"));
    }
    PathBuf::from(path)
}

/// An opened output file.
pub struct OpenStream {
    file: Box<dyn SinkFile>,
    path: PathBuf,
}

impl OpenStream {
    /// Wrap an opened file.
    #[must_use]
    pub fn new(file: Box<dyn SinkFile>, path: PathBuf) -> Self {
        Self { file, path }
    }

    /// Path the file was opened at.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `bytes` with a single write call.
    ///
    /// A partial write is an error; nothing is retried.
    pub fn write_part(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        let written = self.file.write(bytes).map_err(|source| Error::Write {
            path: self.path.clone(),
            source,
        })?;
        if written != bytes.len() {
            return Err(Error::ShortWrite {
                path: self.path.clone(),
                written,
                expected: bytes.len(),
            });
        }
        Ok(())
    }
}

/// Lifecycle of the output stream.
///
/// `Unopened -> Opening -> {Ready, Failed}`. The argument record is written
/// while in `Opening`, so `Ready` always means it is on disk.
pub enum StreamState {
    /// No open attempted yet.
    Unopened,
    /// Open in progress. Seen afterwards only if the attempt unwound.
    Opening,
    /// Open and bootstrapped.
    Ready(OpenStream),
    /// Open failed at this path; never retried.
    Failed(PathBuf),
}

/// Public view of [`StreamState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    /// No open attempted yet.
    Unopened,
    /// Open in progress.
    Opening,
    /// Open and bootstrapped.
    Ready,
    /// Open failed.
    Failed,
}

impl StreamState {
    /// Public view of this state.
    #[must_use]
    pub const fn status(&self) -> StreamStatus {
        match self {
            Self::Unopened => StreamStatus::Unopened,
            Self::Opening => StreamStatus::Opening,
            Self::Ready(_) => StreamStatus::Ready,
            Self::Failed(_) => StreamStatus::Failed,
        }
    }
}
