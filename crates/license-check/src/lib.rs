//! SPDX license marker check
//!
//! Scans C/C++ sources under `include/`, `src/` and each `hw/<platform>/`
//! directory for an `SPDX-License-Identifier:` line. Files without one fail.

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex_lite::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// File patterns that are checked
pub const SOURCE_PATTERNS: &[&str] = &["*.h", "*.c", "*.hpp", "*.cpp"];

/// Directories under the repository root that are always scanned
pub const SOURCE_DIRS: &[&str] = &["include", "src"];

/// Directory whose immediate subdirectories are scanned (one per platform)
pub const PLATFORM_DIR: &str = "hw";

const SPDX_PATTERN: &str = r"SPDX-License-Identifier:\s*([A-Za-z0-9.+-]+)";

/// Message recorded for a file without a marker
pub const MISSING_SPDX: &str = "missing SPDX license";

#[derive(Debug, thiserror::Error)]
pub enum LicenseError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Glob pattern error: {0}")]
    Glob(#[from] globset::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex_lite::Error),
}

/// Result of checking one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    /// Detected SPDX expression, if any
    pub license: Option<String>,
    /// Problems found; empty when the file passes
    pub messages: Vec<String>,
}

impl FileReport {
    pub fn passed(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Result of a full scan
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub files: Vec<FileReport>,
}

impl Report {
    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| !f.passed())
    }

    pub fn passed(&self) -> bool {
        self.files.iter().all(FileReport::passed)
    }

    /// Render failures the way CI logs show them
    pub fn render_failures(&self) -> String {
        let mut out = String::new();
        for file in self.failures() {
            out.push_str(&format!(
                "[FAIL] {}:\n\t{}\n",
                file.path.display(),
                file.messages.join("\n\t")
            ));
        }
        out
    }
}

/// The default scan roots under `root`: `include`, `src`, and `hw/*`.
///
/// Missing directories are left out.
pub fn default_roots(root: &Path) -> Result<Vec<PathBuf>, LicenseError> {
    let mut roots: Vec<PathBuf> = SOURCE_DIRS
        .iter()
        .map(|dir| root.join(dir))
        .filter(|dir| dir.is_dir())
        .collect();

    let hw = root.join(PLATFORM_DIR);
    if hw.is_dir() {
        let entries = fs::read_dir(&hw).map_err(|source| LicenseError::Io {
            path: hw.clone(),
            source,
        })?;
        let mut platforms = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| LicenseError::Io {
                path: hw.clone(),
                source,
            })?;
            if entry.path().is_dir() {
                platforms.push(entry.path());
            }
        }
        platforms.sort();
        roots.extend(platforms);
    }

    Ok(roots)
}

/// Checks files for an SPDX license marker
#[derive(Debug)]
pub struct Checker {
    sources: GlobSet,
    marker: Regex,
}

impl Checker {
    pub fn new() -> Result<Self, LicenseError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in SOURCE_PATTERNS {
            builder.add(Glob::new(pattern)?);
        }

        Ok(Self {
            sources: builder.build()?,
            marker: Regex::new(SPDX_PATTERN)?,
        })
    }

    /// Whether `path` has a checked extension
    pub fn is_source(&self, path: &Path) -> bool {
        path.file_name()
            .is_some_and(|name| self.sources.is_match(Path::new(name)))
    }

    /// Find the SPDX expression in `text`
    pub fn license_of(&self, text: &str) -> Option<String> {
        self.marker
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Check a single file
    pub fn check_file(&self, path: &Path) -> Result<FileReport, LicenseError> {
        let bytes = fs::read(path).map_err(|source| LicenseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);

        let license = self.license_of(&text);
        let messages = if license.is_none() {
            vec![MISSING_SPDX.to_string()]
        } else {
            Vec::new()
        };

        Ok(FileReport {
            path: path.to_path_buf(),
            license,
            messages,
        })
    }

    /// Check every source file under `roots`, in sorted order per root.
    ///
    /// Roots that do not exist are skipped.
    pub fn scan(&self, roots: &[PathBuf]) -> Result<Report, LicenseError> {
        let mut report = Report::default();

        for root in roots {
            if !root.exists() {
                debug!("skipping missing root {}", root.display());
                continue;
            }

            for entry in WalkDir::new(root).sort_by_file_name() {
                let entry = entry?;
                if !entry.file_type().is_file() || !self.is_source(entry.path()) {
                    continue;
                }
                report.files.push(self.check_file(entry.path())?);
            }
        }

        Ok(report)
    }
}
