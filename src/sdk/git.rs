//! git and submodule strategies

use std::fs;
use std::path::Path;
use tracing::info;

use super::fetch::FetchError;
use super::GitSource;
use crate::process::{run_best_effort, run_checked, CommandRunner, CommandSpec};

/// Marks the end of git options; later arguments are taken literally
const END_OF_OPTIONS: &str = "--end-of-options";

fn git_in(path: &Path) -> CommandSpec {
    CommandSpec::new("git").arg("-C").arg(path)
}

/// Clone (once), sync the ref (best effort), then sync submodules.
///
/// The clone is skipped when `<path>/.git` already exists, so re-running
/// against a populated checkout only refreshes the ref. Ref fetch and
/// checkout failures are tolerated: an earlier checkout may already be at
/// the right commit. A submodule failure is fatal.
///
/// `repo`, `path`, and `ref` always follow `--end-of-options`, so git never
/// parses them as options.
pub(super) fn fetch(source: &GitSource, runner: &dyn CommandRunner) -> Result<(), FetchError> {
    let path = source.path.as_path();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| FetchError::CreateDir {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    if path.join(".git").is_dir() {
        info!("{} is already a git checkout, skipping clone", path.display());
    } else {
        let clone = CommandSpec::new("git")
            .args(["clone", "--depth=1", END_OF_OPTIONS])
            .arg(&source.repo)
            .arg(path);
        run_checked(runner, &clone)?;
    }

    if let Some(git_ref) = source.git_ref() {
        let fetch = git_in(path)
            .args(["fetch", "--depth=1", END_OF_OPTIONS, "origin"])
            .arg(git_ref);
        run_best_effort(runner, &fetch);

        let checkout = git_in(path).args(["checkout", END_OF_OPTIONS]).arg(git_ref);
        run_best_effort(runner, &checkout);
    }

    if source.submodules() {
        let update = git_in(path).args(["submodule", "update", "--init", "--recursive"]);
        run_checked(runner, &update)?;
    }

    Ok(())
}

/// Sync submodules of the checkout in the current directory
pub(super) fn sync_host_submodules(runner: &dyn CommandRunner) -> Result<(), FetchError> {
    let update = CommandSpec::new("git").args(["submodule", "update", "--init", "--recursive"]);
    run_checked(runner, &update)?;
    Ok(())
}
