//! Module discovery via the Go module listing command
//!
//! Wraps `go list -m -json all` (or any substitute producer) as a byte
//! stream with bounded-time shutdown, and decodes its back-to-back JSON
//! records into [`Module`] values.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use serde::Deserialize;
use thiserror::Error;

/// Grace period a producer gets to exit once its output has been drained.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(3);

/// Interval at which [`ModuleStream::close`] polls for producer exit.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Errors that can occur while listing modules
#[derive(Debug, Error)]
pub enum ModuleError {
    /// The listing command could not be launched
    #[error("Failed to start module listing command: {0}")]
    Start(#[source] io::Error),

    /// A record in the listing output could not be decoded
    #[error("Malformed module record: {0}")]
    Decode(#[source] serde_json::Error),

    /// The listing command did not exit within the close grace period
    #[error("Module listing command did not exit within {0:?}")]
    ShutdownTimeout(Duration),

    /// The listing command exited with a failure status
    #[error("Module listing command failed: {0}")]
    CommandFailed(ExitStatus),

    /// I/O error while draining or waiting on the listing command
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

/// One module visible to the workspace, as reported by `go list -m -json`.
///
/// Unknown keys in a record (`GoMod`, `GoVersion`, `Indirect`, ...) are
/// ignored; absent keys take their zero value, matching the listing
/// command's omitted-key encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Module {
    /// Import path of the module
    pub path: String,

    /// Local directory holding the module source; empty if the module is
    /// not materialized on disk
    pub dir: PathBuf,

    /// Module version; empty for the main module
    pub version: String,

    /// Whether this is the workspace's main module
    pub main: bool,
}

/// Options for launching the module listing producer.
///
/// The default producer is `go list -m -json all` run in the current
/// working directory. Both the command and the directory can be replaced,
/// which is how tests substitute a canned producer for the real toolchain.
#[derive(Debug, Default)]
pub struct GoList {
    dir: Option<PathBuf>,
    command: Option<Command>,
    grace_period: Option<Duration>,
}

impl GoList {
    /// Create options for the default producer
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the producer in the given working directory
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Replace the default producer with an arbitrary command
    pub fn with_command(mut self, command: Command) -> Self {
        self.command = Some(command);
        self
    }

    /// Override the grace period [`ModuleStream::close`] grants the
    /// producer (default 3 seconds)
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = Some(grace_period);
        self
    }

    /// Launch the producer and return its output stream.
    ///
    /// # Returns
    /// A [`ModuleStream`] reading the producer's standard output.
    ///
    /// Fails with [`ModuleError::Start`] if the command cannot be
    /// spawned; launch failures surface here, not at the first read.
    pub fn open(self) -> Result<ModuleStream, ModuleError> {
        let mut command = self.command.unwrap_or_else(|| {
            let mut command = Command::new("go");
            command.args(["list", "-m", "-json", "all"]);
            command
        });
        if let Some(dir) = &self.dir {
            command.current_dir(dir);
        }

        let mut child = command
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(ModuleError::Start)?;

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ModuleError::Start(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "listing command has no captured stdout",
                )));
            }
        };

        Ok(ModuleStream {
            stdout,
            state: Mutex::new(CloseState { child, exited: None }),
            grace_period: self.grace_period.unwrap_or(DEFAULT_GRACE_PERIOD),
        })
    }

    /// Launch the producer, decode every record, and close the stream.
    ///
    /// A decode failure takes precedence over whatever the close then
    /// reports. After a successful decode the close outcome is the
    /// result, so a producer that exited with a failure status (e.g. the
    /// listing command run outside a module) fails the listing instead of
    /// yielding an empty module set.
    pub fn read_modules(self) -> Result<Vec<Module>, ModuleError> {
        let mut stream = self.open()?;
        let modules = match decode_modules(&mut stream) {
            Ok(modules) => modules,
            Err(err) => {
                let _ = stream.close();
                return Err(err);
            }
        };
        stream.close()?;
        Ok(modules)
    }
}

/// Exit bookkeeping shared by [`ModuleStream::close`] callers.
struct CloseState {
    child: Child,
    exited: Option<ExitStatus>,
}

/// A running module listing producer.
///
/// Reads yield the producer's raw output until it closes its end of the
/// pipe; end of stream is reported regardless of how the producer later
/// exits. [`close`](Self::close) reaps the producer within a bounded
/// grace period, and dropping an unclosed stream kills it.
pub struct ModuleStream {
    stdout: ChildStdout,
    state: Mutex<CloseState>,
    grace_period: Duration,
}

impl Read for ModuleStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stdout.read(buf)
    }
}

impl ModuleStream {
    /// Wait for the producer to exit, bounded by the grace period.
    ///
    /// The first caller does the wait; concurrent and later callers
    /// observe the recorded outcome. A producer that has not exited when
    /// the grace period elapses yields [`ModuleError::ShutdownTimeout`]
    /// and leaves the stream open, so a later close may retry the wait.
    pub fn close(&self) -> Result<(), ModuleError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(status) = state.exited {
            return exit_result(status);
        }

        let deadline = Instant::now() + self.grace_period;
        loop {
            if let Some(status) = state.child.try_wait()? {
                state.exited = Some(status);
                return exit_result(status);
            }
            if Instant::now() >= deadline {
                return Err(ModuleError::ShutdownTimeout(self.grace_period));
            }
            thread::sleep(EXIT_POLL_INTERVAL);
        }
    }
}

impl Drop for ModuleStream {
    fn drop(&mut self) {
        let state = match self.state.get_mut() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Kill and reap a producer nobody waited on so aborted runs do
        // not leak processes.
        if state.exited.is_none() {
            let _ = state.child.kill();
            let _ = state.child.wait();
        }
    }
}

fn exit_result(status: ExitStatus) -> Result<(), ModuleError> {
    if status.success() {
        Ok(())
    } else {
        Err(ModuleError::CommandFailed(status))
    }
}

/// Decode back-to-back JSON module records until end of stream.
///
/// A stream of exactly N well-formed records yields N modules; a
/// malformed record fails the whole decode with [`ModuleError::Decode`],
/// discarding any records decoded before it.
pub fn decode_modules<R: Read>(reader: R) -> Result<Vec<Module>, ModuleError> {
    let mut modules = Vec::new();
    for record in serde_json::Deserializer::from_reader(reader).into_iter::<Module>() {
        modules.push(record.map_err(ModuleError::Decode)?);
    }
    Ok(modules)
}

/// Drop modules that cannot be mirrored into a source tree.
///
/// A module is kept only if it has a local directory and (it is not the
/// main module or it carries a version). Relative order is preserved.
pub fn filter_modules(modules: Vec<Module>) -> Vec<Module> {
    modules
        .into_iter()
        .filter(|module| {
            // Skip modules without directories / unversioned main modules.
            !(module.dir.as_os_str().is_empty() || module.version.is_empty() && module.main)
        })
        .collect()
}
