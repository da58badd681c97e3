//! archive strategy

use std::fs;
use tracing::debug;

use super::fetch::{FetchError, FetchOptions};
use super::ArchiveSource;
use crate::process::{run_checked, CommandRunner, CommandSpec};

/// Download `url` and extract it into `path`.
///
/// There is no existence check: every call downloads and extracts again.
/// The download lands in a uniquely named temporary file, removed on
/// return, so concurrent fetches on one host never share a path. The URL
/// is passed as the value of `--url` so curl never reads it as an option.
pub(super) fn fetch(
    source: &ArchiveSource,
    runner: &dyn CommandRunner,
    options: &FetchOptions,
) -> Result<(), FetchError> {
    fs::create_dir_all(&source.path).map_err(|e| FetchError::CreateDir {
        path: source.path.clone(),
        source: e,
    })?;

    let mut builder = tempfile::Builder::new();
    builder.prefix("sdk-").suffix(".tgz");
    let download = match options.temp_dir {
        Some(ref dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(FetchError::TempFile)?;
    debug!("downloading to {}", download.path().display());

    let curl = CommandSpec::new("curl")
        .args(["--fail", "-L", "--url"])
        .arg(&source.url)
        .arg("-o")
        .arg(download.path());
    run_checked(runner, &curl)?;

    let tar = CommandSpec::new("tar")
        .arg("-xf")
        .arg(download.path())
        .arg("-C")
        .arg(&source.path)
        .arg(format!("--strip-components={}", source.strip_components()));
    run_checked(runner, &tar)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::RecordingRunner;

    #[test]
    fn test_download_then_extract() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("sdk");
        let runner = RecordingRunner::new();
        let options = FetchOptions {
            temp_dir: Some(dir.path().to_path_buf()),
            ..FetchOptions::default()
        };

        let source = ArchiveSource::new(&target, "http://x/f.tgz").with_strip_components(1);
        fetch(&source, &runner, &options).unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);

        let curl = &calls[0];
        assert_eq!(&curl[..5], ["curl", "--fail", "-L", "--url", "http://x/f.tgz"]);
        assert_eq!(curl[5], "-o");
        let download = curl[6].clone();
        assert!(download.starts_with(&dir.path().display().to_string()));

        let tar = &calls[1];
        assert_eq!(
            tar,
            &vec![
                "tar".to_string(),
                "-xf".to_string(),
                download.clone(),
                "-C".to_string(),
                target.display().to_string(),
                "--strip-components=1".to_string(),
            ]
        );

        assert!(target.is_dir());
        assert!(!std::path::Path::new(&download).exists(), "download should be removed");
    }

    #[test]
    fn test_download_path_unique_per_call() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::new();
        let source = ArchiveSource::new(dir.path().join("sdk"), "http://x/f.tgz");

        fetch(&source, &runner, &FetchOptions::default()).unwrap();
        fetch(&source, &runner, &FetchOptions::default()).unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 4, "archive fetch always downloads again");
        assert_ne!(calls[0][6], calls[2][6]);
        assert_eq!(calls[1].last().unwrap(), "--strip-components=0");
    }

    #[test]
    fn test_download_failure_skips_extract() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::new().fail_when_program("curl", 22);
        let source = ArchiveSource::new(dir.path().join("sdk"), "http://x/missing.tgz");

        assert!(fetch(&source, &runner, &FetchOptions::default()).is_err());
        assert_eq!(runner.calls().len(), 1);
    }
}
