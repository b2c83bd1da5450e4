//! External tool invocation
//!
//! Debugger front-ends (OpenOCD, GDB) are driven as child processes. A
//! [`ToolCommand`] is the command line, a [`CommandRunner`] launches it and
//! blocks until it exits, and [`ToolOutput`] carries what it printed.
//!
//! The runner is a trait so backends can be exercised without the real tools
//! installed.

use crate::error::{FlashError, Result};
use std::fmt;
use std::io::{self, Read};
use std::process::{Child, Command, Output, Stdio};

/// Program plus argument vector for one tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
}

impl ToolCommand {
    /// Start a command line for `program`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument
    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    /// Append a flag followed by its value (e.g. `-c init`)
    pub fn option(&mut self, flag: &str, value: impl Into<String>) -> &mut Self {
        self.arg(flag).arg(value)
    }

    /// Executable name or path
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments, in launch order
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Values passed after every occurrence of `flag`, in order
    pub fn values_of<'a>(&'a self, flag: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.args
            .windows(2)
            .filter(move |pair| pair[0] == flag)
            .map(|pair| pair[1].as_str())
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished tool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` if the process was terminated by a signal
    pub code: Option<i32>,
    /// Everything written to stdout
    pub stdout: String,
    /// Everything written to stderr
    pub stderr: String,
}

impl ToolOutput {
    /// True if the process exited with code zero
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stdout followed by stderr, trimmed
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (_, true) => stdout.to_string(),
            (true, false) => stderr.to_string(),
            (false, false) => format!("{}\n{}", stdout, stderr),
        }
    }
}

impl From<Output> for ToolOutput {
    fn from(output: Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Launches a tool and blocks until it exits
pub trait CommandRunner {
    /// Run `command` to completion, capturing its output.
    ///
    /// A non-zero exit is not an error here; callers inspect
    /// [`ToolOutput::code`]. `Err` means the process could not be run.
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput>;
}

/// [`CommandRunner`] backed by `std::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        let child = Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| FlashError::Spawn {
                tool: command.program().to_string(),
                source,
            })?;

        let output = ChildGuard::new(child).wait_with_output()?;
        Ok(output.into())
    }
}

/// Owns a spawned child until it has been reaped.
///
/// If the guard is dropped before [`ChildGuard::wait_with_output`] ran (an
/// early return or a panic), the child is killed and waited for so no
/// process or pipe outlives the caller.
pub struct ChildGuard {
    child: Option<Child>,
}

impl ChildGuard {
    /// Take ownership of a freshly spawned child
    pub fn new(child: Child) -> Self {
        Self { child: Some(child) }
    }

    /// OS process id of the guarded child, if still owned
    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Block until the child exits and collect its output.
    ///
    /// The child stays guarded until it has been reaped, so a failed read
    /// still kills it on drop.
    pub fn wait_with_output(mut self) -> io::Result<Output> {
        let child = self.child.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "child process already reaped")
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stderr_reader = std::thread::spawn(move || read_pipe(stderr));
        let stdout = read_pipe(stdout);
        let stderr = stderr_reader
            .join()
            .map_err(|_| io::Error::other("stderr reader panicked"))?;
        let (stdout, stderr) = (stdout?, stderr?);

        let status = child.wait()?;
        self.child = None;
        Ok(Output {
            status,
            stdout,
            stderr,
        })
    }
}

fn read_pipe(pipe: Option<impl Read>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf)?;
    }
    Ok(buf)
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            log::debug!("Killing abandoned child process {}", child.id());
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
