//! Recording command runner
//!
//! In-process stand-in for [`SystemRunner`](crate::process::SystemRunner)
//! used by unit and integration tests. It records every argv it is asked to
//! run and returns scripted exit codes instead of spawning processes.
//!
//! With [`RecordingRunner::materialize_clones`], a recorded `git clone`
//! also creates `<dest>/.git`, so repeated fetches observe the checkout the
//! way they would against a real repository.

use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::process::{CommandRunner, CommandSpec, ProcessError};

#[derive(Debug, Clone)]
enum Matcher {
    Program(String),
    Arg(String),
}

impl Matcher {
    fn matches(&self, argv: &[String]) -> bool {
        match self {
            Matcher::Program(program) => argv.first() == Some(program),
            Matcher::Arg(arg) => argv.iter().skip(1).any(|a| a == arg),
        }
    }
}

/// Records commands instead of running them
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    failures: Vec<(Matcher, i32)>,
    materialize_clones: bool,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit with `code` for any command whose program is `program`
    pub fn fail_when_program(mut self, program: &str, code: i32) -> Self {
        self.failures.push((Matcher::Program(program.to_string()), code));
        self
    }

    /// Exit with `code` for any command with `arg` among its arguments
    pub fn fail_when_arg(mut self, arg: &str, code: i32) -> Self {
        self.failures.push((Matcher::Arg(arg.to_string()), code));
        self
    }

    /// Create `<dest>/.git` for each successful `git clone <repo> <dest>`
    pub fn materialize_clones(mut self) -> Self {
        self.materialize_clones = true;
        self
    }

    /// argv of every recorded command, in order
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.lock().iter().map(CommandSpec::argv).collect()
    }

    /// Recorded commands, in order
    pub fn commands(&self) -> Vec<CommandSpec> {
        self.lock().clone()
    }

    /// Number of recorded commands whose first argument is `subcommand`
    /// (after any `-C <dir>`)
    pub fn count_git(&self, subcommand: &str) -> usize {
        self.calls()
            .iter()
            .filter(|argv| argv.first().map(String::as_str) == Some("git"))
            .filter(|argv| {
                let skip = if argv.get(1).map(String::as_str) == Some("-C") { 3 } else { 1 };
                let rest = argv.get(skip..).unwrap_or_default();
                rest.first().map(String::as_str) == Some(subcommand)
            })
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CommandSpec>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn simulate_clone(argv: &[String]) {
        if argv.len() >= 3 && argv[0] == "git" && argv[1] == "clone" {
            if let Some(dest) = argv.last() {
                let _ = fs::create_dir_all(Path::new(dest).join(".git"));
            }
        }
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, cmd: &CommandSpec) -> Result<(), ProcessError> {
        self.lock().push(cmd.clone());

        let argv = cmd.argv();
        if let Some((_, code)) = self.failures.iter().find(|(m, _)| m.matches(&argv)) {
            return Err(ProcessError::Failed {
                command: cmd.to_string(),
                code: Some(*code),
            });
        }

        if self.materialize_clones {
            Self::simulate_clone(&argv);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let runner = RecordingRunner::new();
        runner.run(&CommandSpec::new("git").arg("status")).unwrap();
        runner.run(&CommandSpec::new("tar").arg("-xf")).unwrap();

        assert_eq!(runner.calls(), vec![vec!["git", "status"], vec!["tar", "-xf"]]);
    }

    #[test]
    fn test_scripted_failure() {
        let runner = RecordingRunner::new().fail_when_arg("fetch", 128);
        assert!(runner.run(&CommandSpec::new("git").arg("status")).is_ok());

        let err = runner
            .run(&CommandSpec::new("git").args(["-C", "sdk", "fetch"]))
            .unwrap_err();
        assert!(matches!(err, ProcessError::Failed { code: Some(128), .. }));
        assert_eq!(runner.calls().len(), 2);
    }

    #[test]
    fn test_count_git_skips_dash_c() {
        let runner = RecordingRunner::new();
        runner.run(&CommandSpec::new("git").args(["clone", "r", "d"])).unwrap();
        runner.run(&CommandSpec::new("git").args(["-C", "d", "checkout", "v1"])).unwrap();

        assert_eq!(runner.count_git("clone"), 1);
        assert_eq!(runner.count_git("checkout"), 1);
        assert_eq!(runner.count_git("fetch"), 0);
    }

    #[test]
    fn test_materialize_clones() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("sdk");
        let runner = RecordingRunner::new().materialize_clones();

        runner
            .run(&CommandSpec::new("git").args(["clone", "--depth=1", "r"]).arg(&dest))
            .unwrap();

        assert!(dest.join(".git").is_dir());
    }
}
