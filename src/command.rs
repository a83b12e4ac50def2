use std::fmt;
use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use encoding_rs::Encoding;

use crate::error::CommandError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// A single external program call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: &'static str,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new<I, S>(program: &'static str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Invocation {
            program,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// True when `flag` appears among the arguments.
    pub fn has_arg(&self, flag: &str) -> bool {
        self.args.iter().any(|arg| arg == flag)
    }

    /// Value following `flag`, e.g. `value_of("/st")` on a create call.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|arg| arg == flag)
            .and_then(|idx| self.args.get(idx + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn ok(stdout: impl Into<String>) -> Self {
        CommandOutput {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        CommandOutput {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Runs external programs on behalf of the scheduler.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for Box<R> {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        (**self).run(invocation)
    }
}

/// Spawns real processes and kills them once `timeout` has elapsed.
///
/// Output is decoded with `encoding`, which should match the console code
/// page of the scheduler tools.
#[derive(Debug, Clone)]
pub struct SystemCommandRunner {
    timeout: Duration,
    encoding: &'static Encoding,
}

impl SystemCommandRunner {
    pub fn new(timeout: Duration) -> Self {
        SystemCommandRunner {
            timeout,
            encoding: encoding_rs::UTF_8,
        }
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    fn wait_with_timeout(
        &self,
        invocation: &Invocation,
        child: &mut std::process::Child,
    ) -> Result<ExitStatus, CommandError> {
        let start = Instant::now();
        loop {
            let polled = child.try_wait().map_err(|source| CommandError::Spawn {
                program: invocation.program.to_string(),
                source,
            })?;
            if let Some(status) = polled {
                return Ok(status);
            }

            if start.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CommandError::Timeout {
                    program: invocation.program.to_string(),
                    timeout_secs: self.timeout.as_secs(),
                });
            }

            thread::sleep(POLL_INTERVAL);
        }
    }

    fn collect(&self, handle: Option<thread::JoinHandle<Vec<u8>>>) -> String {
        let Some(bytes) = handle.and_then(|h| h.join().ok()) else {
            return String::new();
        };
        let (text, _, had_errors) = self.encoding.decode(&bytes);
        if had_errors {
            log::debug!("output was not valid {}", self.encoding.name());
        }
        text.into_owned()
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        log::debug!("running: {}", invocation);

        let mut cmd = Command::new(invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        let mut child = cmd.spawn().map_err(|source| CommandError::Spawn {
            program: invocation.program.to_string(),
            source,
        })?;

        // Drain both pipes on their own threads so a chatty child cannot
        // block on a full pipe while we poll for its exit.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = self.wait_with_timeout(invocation, &mut child)?;

        let output = CommandOutput {
            code: status.code(),
            stdout: self.collect(stdout),
            stderr: self.collect(stderr),
        };
        log::debug!("{} exited with {:?}", invocation.program, output.code);
        Ok(output)
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        buf
    })
}


/// Logs every invocation and reports success without running anything.
#[derive(Debug, Clone, Default)]
pub struct DryRunRunner;

impl CommandRunner for DryRunRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        log::info!("DRY RUN: {}", invocation);
        Ok(CommandOutput::ok(""))
    }
}
