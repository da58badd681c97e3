//! Matrix emission
//!
//! GitHub Actions collects step outputs from the file named by
//! `GITHUB_OUTPUT`; the matrix is appended there as one `matrix=<json>`
//! line. Without that variable the JSON goes to stdout.

use std::env;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

use super::Matrix;

/// Environment variable naming the step output file
pub const GITHUB_OUTPUT_ENV: &str = "GITHUB_OUTPUT";

/// Output key the matrix is assigned to
const OUTPUT_KEY: &str = "matrix";

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Failed to write {}: {source}", .path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Where the matrix is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputSink {
    Stdout,
    /// Append `matrix=<json>` to this file
    File(PathBuf),
}

impl OutputSink {
    /// The file named by `var`, or stdout when unset or empty
    pub fn from_env(var: &str) -> Self {
        match env::var_os(var) {
            Some(path) if !path.is_empty() => OutputSink::File(PathBuf::from(path)),
            _ => OutputSink::Stdout,
        }
    }
}

/// Write `matrix=<single-line json>\n`
pub fn write_assignment<W: Write>(writer: &mut W, matrix: &Matrix) -> Result<(), OutputError> {
    writeln!(writer, "{}={}", OUTPUT_KEY, matrix.to_json()?)?;
    Ok(())
}

/// Emit the matrix to `sink`.
///
/// `pretty` only affects stdout; the output file always gets one line.
pub fn emit(matrix: &Matrix, sink: &OutputSink, pretty: bool) -> Result<(), OutputError> {
    match sink {
        OutputSink::Stdout => {
            let json = if pretty {
                matrix.to_json_pretty()?
            } else {
                matrix.to_json()?
            };
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", json)?;
            stdout.flush()?;
        }
        OutputSink::File(path) => {
            let sink_err = |source| OutputError::Sink {
                path: path.clone(),
                source,
            };
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(sink_err)?;
            let mut line = Vec::new();
            write_assignment(&mut line, matrix)?;
            file.write_all(&line).map_err(sink_err)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{resolve, ResolveOptions};
    use serde_json::json;
    use std::fs;

    fn sample_matrix() -> Matrix {
        let config = serde_json::from_value(json!({
            "targets": [{"id": "rp2040"}, {"id": "native"}]
        }))
        .unwrap();
        resolve(config, &ResolveOptions::default()).unwrap()
    }

    #[test]
    fn test_assignment_line() {
        let mut buf = Vec::new();
        write_assignment(&mut buf, &sample_matrix()).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with("matrix={\"include\":["));
        assert!(text.ends_with('\n'));
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn test_emit_appends_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("github_output");
        fs::write(&path, "previous=1\n").unwrap();

        emit(&sample_matrix(), &OutputSink::File(path.clone()), true).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "previous=1");
        let json = lines[1].strip_prefix("matrix=").unwrap();
        let parsed: Matrix = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, sample_matrix());
    }

    #[test]
    fn test_sink_from_env() {
        let var = "MCU_CI_TEST_OUTPUT_SINK";
        env::remove_var(var);
        assert_eq!(OutputSink::from_env(var), OutputSink::Stdout);

        env::set_var(var, "");
        assert_eq!(OutputSink::from_env(var), OutputSink::Stdout);

        env::set_var(var, "/tmp/out");
        assert_eq!(OutputSink::from_env(var), OutputSink::File(PathBuf::from("/tmp/out")));
        env::remove_var(var);
    }
}
