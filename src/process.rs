use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::AsyncRead;
use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::error::FindpassError;

/// A readable child stream.
pub type OutputStream = Box<dyn AsyncRead + Send + Unpin>;

/// A started search command.
pub struct Launched {
    pub stdout:  OutputStream,
    pub stderr:  OutputStream,
    pub process: ChildProcess,
}

impl Launched {
    /// Streams with no OS process behind them.
    pub fn from_streams(stdout: OutputStream, stderr: OutputStream) -> Self {
        Self {
            stdout,
            stderr,
            process: ChildProcess { pid: None, child: None },
        }
    }
}

/// The OS process behind a [`Launched`] command, if any. Used to kill on
/// stop and to reap once both streams are closed.
pub struct ChildProcess {
    pub pid:   Option<u32>,
    pub child: Option<Child>,
}

/// Starts search commands.
///
/// [`ProcessLauncher`] spawns real processes. Implement this to feed the
/// engine from anything else that produces stdout/stderr bytes.
pub trait Launcher {
    /// Start `argv` (program first).
    ///
    /// # Errors
    ///
    /// [`FindpassError::CommandSpawn`] when the program cannot be started.
    /// No streams exist in that case.
    fn launch(&mut self, argv: &[String]) -> Result<Launched, FindpassError>;
}

/// Spawns commands as child processes of this one.
///
/// The child runs in `working_dir`, inherits the environment, is looked up
/// on `PATH`, and gets no stdin.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    working_dir: PathBuf,
}

impl ProcessLauncher {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self { working_dir: working_dir.into() }
    }
}

impl Launcher for ProcessLauncher {
    fn launch(&mut self, argv: &[String]) -> Result<Launched, FindpassError> {
        let (program, args) = argv.split_first().ok_or_else(|| FindpassError::CommandSpawn {
            program: String::new(),
            source:  std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
        })?;

        let mut child = Command::new(program)
            .args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| FindpassError::CommandSpawn {
                program: program.clone(),
                source,
            })?;

        let missing = |what: &str| FindpassError::CommandSpawn {
            program: program.clone(),
            source:  std::io::Error::other(format!("child has no {what} pipe")),
        };
        let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing("stderr"))?;
        let pid = child.id();

        info!(program = %program, pid, "spawned search command");
        Ok(Launched {
            stdout:  Box::new(stdout),
            stderr:  Box::new(stderr),
            process: ChildProcess { pid, child: Some(child) },
        })
    }
}

impl ChildProcess {
    /// Ask the OS to kill the child. Does not wait.
    pub fn kill(&mut self) {
        if let Some(child) = self.child.as_mut() {
            if let Err(e) = child.start_kill() {
                debug!(pid = self.pid, error = %e, "kill failed, child probably gone");
            }
        }
    }

    /// Wait for the child to exit once its streams are drained.
    pub async fn reap(&mut self) {
        if let Some(child) = self.child.as_mut() {
            match child.wait().await {
                Ok(status) => debug!(pid = self.pid, %status, "search command exited"),
                Err(e) => debug!(pid = self.pid, error = %e, "could not reap search command"),
            }
        }
    }
}
