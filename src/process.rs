//! Detached background processes (emulator, forwarder).
//!
//! Processes are launched with their stdio wired to specific stream
//! endpoints and are never waited on while the pipeline runs. A plain
//! command line is split into words and executed directly, so a missing
//! program fails at spawn time; anything that needs shell syntax (pipes,
//! redirections, `;`, variables) runs under `sh -c`. A crashed
//! emulator is only noticed indirectly, through the stream closing or an
//! expected marker never arriving. The registry exists so that teardown can
//! kill whatever is still running once the run is over.

use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::fs::File;
use std::io;
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};
use tracing::{debug, info, warn};

/// Characters that only mean something to a shell.
const SHELL_SYNTAX: &[char] = &[
    '|', '&', ';', '<', '>', '(', ')', '$', '`', '*', '?', '[', '~', '#', '\n',
];

/// Where one stdio slot of a launched process is connected.
#[derive(Debug)]
pub enum Endpoint {
    Null,
    /// A live channel end (pty side, socket, device node). Cloned per spawn.
    File(File),
}

impl Endpoint {
    fn to_stdio(&self) -> io::Result<Stdio> {
        Ok(match self {
            Endpoint::Null => Stdio::null(),
            Endpoint::File(file) => Stdio::from(file.try_clone()?),
        })
    }
}

/// A shell command plus its stdio wiring.
#[derive(Debug)]
pub struct Launch {
    command: String,
    stdin: Endpoint,
    stdout: Endpoint,
    stderr: Endpoint,
}

impl Launch {
    /// A command line, quoted the way a shell would. All stdio defaults to
    /// null.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            stdin: Endpoint::Null,
            stdout: Endpoint::Null,
            stderr: Endpoint::Null,
        }
    }

    pub fn stdin(mut self, endpoint: Endpoint) -> Self {
        self.stdin = endpoint;
        self
    }

    pub fn stdout(mut self, endpoint: Endpoint) -> Self {
        self.stdout = endpoint;
        self
    }

    pub fn stderr(mut self, endpoint: Endpoint) -> Self {
        self.stderr = endpoint;
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Words to execute directly, or `None` when the command line needs a
    /// shell to mean what it says.
    fn argv(&self) -> Option<Vec<String>> {
        if self.command.contains(SHELL_SYNTAX) {
            return None;
        }
        let argv = shlex::split(&self.command)?;
        // `VAR=value prog` is an environment assignment.
        match argv.first() {
            Some(program) if !program.contains('=') => Some(argv),
            _ => None,
        }
    }

    /// Start the process without waiting for it. It leads its own process
    /// group so teardown also reaches whatever a shell started.
    pub fn spawn(&self) -> io::Result<Child> {
        let mut command = match self.argv() {
            Some(argv) => {
                let mut command = Command::new(&argv[0]);
                command.args(&argv[1..]);
                command
            }
            None => {
                debug!(command = %self.command, "running through sh -c");
                let mut command = Command::new("sh");
                command.arg("-c").arg(&self.command);
                command
            }
        };
        command
            .process_group(0)
            .stdin(self.stdin.to_stdio()?)
            .stdout(self.stdout.to_stdio()?)
            .stderr(self.stderr.to_stdio()?)
            .spawn()
    }
}

/// Processes launched during one run.
#[derive(Debug, Default)]
pub struct BackgroundProcesses {
    children: Vec<(String, Child)>,
}

impl BackgroundProcesses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Launch and register a detached process. Returns its pid.
    pub fn spawn(&mut self, launch: &Launch) -> io::Result<u32> {
        let child = launch.spawn()?;
        let pid = child.id();
        info!(pid, command = launch.command(), "spawned background process");
        self.children.push((launch.command().to_string(), child));
        Ok(pid)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Kill and reap every process that has not exited on its own.
    pub fn shutdown(&mut self) {
        for (command, mut child) in self.children.drain(..) {
            match child.try_wait() {
                Ok(Some(status)) => {
                    info!(command = %command, %status, "background process already exited");
                }
                Ok(None) => {
                    kill_group(&mut child, &command);
                    let _ = child.wait();
                }
                Err(e) => warn!(command = %command, "failed to poll background process: {e}"),
            }
        }
    }
}

fn kill_group(child: &mut Child, command: &str) {
    let pgid = Pid::from_raw(child.id() as i32);
    if killpg(pgid, Signal::SIGKILL).is_ok() {
        return;
    }
    if let Err(e) = child.kill() {
        warn!(command = %command, "failed to kill background process: {e}");
    }
}

impl Drop for BackgroundProcesses {
    fn drop(&mut self) {
        self.shutdown();
    }
}
