use super::error::EngineError;
use async_trait::async_trait;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// A single execution of an external program.
///
/// The working directory is always explicit; the calling process never
/// changes its own. Redirect paths are resolved relative to the working
/// directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub stdin: Option<PathBuf>,
    pub stdout: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            stdin: None,
            stdout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin_from(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdin = Some(path.into());
        self
    }

    pub fn stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout = Some(path.into());
        self
    }

    pub fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    /// Returns `true` if `arg` is one of the arguments.
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        if let Some(stdin) = &self.stdin {
            write!(f, " < {}", stdin.display())?;
        }
        if let Some(stdout) = &self.stdout {
            write!(f, " > {}", stdout.display())?;
        }
        Ok(())
    }
}

/// How a finished process exited. `code` is `None` when it was killed by a signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitReport {
    pub program: String,
    pub code: Option<i32>,
}

impl ExitReport {
    pub fn new(program: impl Into<String>, code: Option<i32>) -> Self {
        Self {
            program: program.into(),
            code,
        }
    }

    fn from_status(program: &str, status: ExitStatus) -> Self {
        Self::new(program, status.code())
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for ExitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} exited with code {}", self.program, code),
            None => write!(f, "{} was terminated by a signal", self.program),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    Completed(ExitReport),
    TimedOut,
}

/// A running external process.
#[async_trait]
pub trait Instance: Send {
    /// Waits for the process to exit, giving up at `deadline`.
    ///
    /// A timed out process keeps running; call [`Instance::kill`] to stop it.
    async fn wait_until(&mut self, deadline: Instant) -> Result<WaitOutcome, EngineError>;

    /// Waits for the process to exit without a deadline.
    async fn wait(&mut self) -> Result<ExitReport, EngineError>;

    /// Forcibly terminates the process and reaps it. Killing an already
    /// exited process is a no-op.
    async fn kill(&mut self) -> Result<(), EngineError>;
}

/// Starts external programs. The seam between the orchestration logic and the operating system.
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn spawn(&self, invocation: Invocation) -> Result<Box<dyn Instance>, EngineError>;

    /// Runs a program to completion.
    async fn run(&self, invocation: Invocation) -> Result<ExitReport, EngineError> {
        let mut instance = self.spawn(invocation).await?;
        instance.wait().await
    }
}

/// [`Launcher`] backed by operating system processes.
///
/// Output streams that are not redirected to a file are forwarded line by line
/// to the `debug` log. Children are killed if their handle is dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

impl ProcessLauncher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn spawn(&self, invocation: Invocation) -> Result<Box<dyn Instance>, EngineError> {
        let program = invocation.program_name();
        debug!(command = %invocation, dir = %invocation.working_dir.display(), "Spawning process.");

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match &invocation.stdin {
            Some(path) => {
                let file = File::open(invocation.working_dir.join(path))?;
                command.stdin(Stdio::from(file));
            }
            None => {
                command.stdin(Stdio::null());
            }
        }
        match &invocation.stdout {
            Some(path) => {
                let file = File::create(invocation.working_dir.join(path))?;
                command.stdout(Stdio::from(file));
            }
            None => {
                command.stdout(Stdio::piped());
            }
        }

        let mut child = command.spawn().map_err(|source| EngineError::Launch {
            program: program.clone(),
            source,
        })?;

        let mut forwarders = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            forwarders.push(forward_lines(stdout, program.clone(), "stdout"));
        }
        if let Some(stderr) = child.stderr.take() {
            forwarders.push(forward_lines(stderr, program.clone(), "stderr"));
        }

        Ok(Box::new(ProcessInstance {
            program,
            child,
            forwarders,
        }))
    }
}

fn forward_lines<R>(stream: R, program: String, name: &'static str) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(program = %program, stream = name, "{}", line);
        }
    })
}

struct ProcessInstance {
    program: String,
    child: Child,
    forwarders: Vec<JoinHandle<()>>,
}

impl ProcessInstance {
    async fn finish_forwarding(&mut self) {
        for forwarder in self.forwarders.drain(..) {
            let _ = forwarder.await;
        }
    }
}

#[async_trait]
impl Instance for ProcessInstance {
    async fn wait_until(&mut self, deadline: Instant) -> Result<WaitOutcome, EngineError> {
        match tokio::time::timeout_at(deadline, self.child.wait()).await {
            Ok(status) => {
                let report = ExitReport::from_status(&self.program, status?);
                self.finish_forwarding().await;
                Ok(WaitOutcome::Completed(report))
            }
            Err(_) => Ok(WaitOutcome::TimedOut),
        }
    }

    async fn wait(&mut self) -> Result<ExitReport, EngineError> {
        let status = self.child.wait().await?;
        self.finish_forwarding().await;
        Ok(ExitReport::from_status(&self.program, status))
    }

    async fn kill(&mut self) -> Result<(), EngineError> {
        if self.child.try_wait()?.is_none() {
            if let Err(e) = self.child.kill().await {
                warn!(program = %self.program, error = %e, "Failed to kill process.");
                return Err(e.into());
            }
        }
        self.finish_forwarding().await;
        Ok(())
    }
}

/// Resolves a program the way the operating system would when spawning it.
///
/// A program given with a directory component is checked as is; a bare name
/// is searched for in the directories of `PATH`.
pub fn locate_executable(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        return is_executable(program).then(|| program.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
