//! External command execution
//!
//! Every external tool (git, curl, tar) is invoked through [`CommandRunner`]
//! with an explicit argv list. No shell is involved, so values taken from
//! the configuration document are never reinterpreted. The echoed form of a
//! command uses POSIX single-quote escaping so log lines can be pasted into
//! a shell verbatim.

use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::process::Command;

use tracing::{info, warn};

/// Errors from running an external command
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("command `{command}` {}", describe_exit(.code))]
    Failed { command: String, code: Option<i32> },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

/// A single external command: program and arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: OsString,
    args: Vec<OsString>,
}

impl CommandSpec {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Program followed by arguments, lossily converted to UTF-8
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words: Vec<String> = self.argv().iter().map(|w| quote(w).into_owned()).collect();
        f.write_str(&words.join(" "))
    }
}

/// Quote a word for a POSIX shell.
///
/// Words made only of safe characters are returned unchanged; anything else
/// is wrapped in single quotes, with embedded single quotes spliced as
/// `'"'"'`.
pub fn quote(word: &str) -> Cow<'_, str> {
    let safe = !word.is_empty()
        && word
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"@%+=:,./-_".contains(&b));

    if safe {
        Cow::Borrowed(word)
    } else {
        Cow::Owned(format!("'{}'", word.replace('\'', "'\"'\"'")))
    }
}

/// Runs external commands to completion
pub trait CommandRunner {
    /// Run `cmd`, returning an error if it cannot be spawned or exits nonzero
    fn run(&self, cmd: &CommandSpec) -> Result<(), ProcessError>;
}

/// Runs commands as child processes inheriting stdio
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &CommandSpec) -> Result<(), ProcessError> {
        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args);

        let status = command.status().map_err(|source| ProcessError::Spawn {
            command: cmd.to_string(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(ProcessError::Failed {
                command: cmd.to_string(),
                code: status.code(),
            })
        }
    }
}

/// Echo and run a command; any failure is returned to the caller.
pub fn run_checked(runner: &dyn CommandRunner, cmd: &CommandSpec) -> Result<(), ProcessError> {
    info!("+ {}", cmd);
    runner.run(cmd)
}

/// Echo and run a command whose failure is tolerated.
///
/// Returns whether the command succeeded.
pub fn run_best_effort(runner: &dyn CommandRunner, cmd: &CommandSpec) -> bool {
    info!("+ {}", cmd);
    match runner.run(cmd) {
        Ok(()) => true,
        Err(e) => {
            warn!("ignoring failure: {}", e);
            false
        }
    }
}
