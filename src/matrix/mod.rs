//! Build matrix resolution
//!
//! Merges `defaults` into each target:
//! - `toolchain`: target value, else the default, else absent
//! - `apt`: defaults then target, duplicates removed, first occurrence kept
//! - `cmake_args`: defaults then target, concatenated as-is
//! - `desc`: defaults to `id`
//! - `sdk`: defaults to `{"method": "none"}`
//!
//! Resolved targets keep the order of the input list so job numbering and
//! log ordering downstream stay stable.

mod output;

pub use output::{emit, write_assignment, OutputError, OutputSink, GITHUB_OUTPUT_ENV};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use crate::config::{self, ConfigError, DefaultsConfig, MatrixConfig, TargetConfig};
use crate::sdk::SdkDescriptor;

/// A target after defaults have been merged in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTarget {
    pub id: String,

    pub desc: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolchain: Option<String>,

    pub apt: Vec<String>,

    pub cmake_args: Vec<String>,

    pub sdk: SdkDescriptor,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResolvedTarget {
    /// Apply `defaults` to `target`
    pub fn merge(defaults: &DefaultsConfig, target: TargetConfig) -> Self {
        let TargetConfig {
            id,
            desc,
            toolchain,
            apt,
            cmake_args,
            sdk,
            extra,
        } = target;

        Self {
            desc: desc.unwrap_or_else(|| id.clone()),
            id,
            toolchain: toolchain.or_else(|| defaults.toolchain.clone()),
            apt: dedup(defaults.apt.iter().chain(apt.iter())),
            cmake_args: defaults.cmake_args.iter().chain(cmake_args.iter()).cloned().collect(),
            sdk: sdk.unwrap_or_default(),
            extra,
        }
    }
}

/// Remove duplicates, keeping the first occurrence of each entry
fn dedup<'a>(items: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.as_str()))
        .cloned()
        .collect()
}

/// The matrix handed to the CI orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub include: Vec<ResolvedTarget>,
}

impl Matrix {
    /// Single-line JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn len(&self) -> usize {
        self.include.len()
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty()
    }
}

/// Resolution options
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Reject duplicate target ids and unrecognized SDK methods
    pub strict: bool,

    /// Where the configuration came from, for error messages
    pub source: Option<String>,
}

/// Resolve every target of `config`, in input order
pub fn resolve(config: MatrixConfig, options: &ResolveOptions) -> Result<Matrix, ConfigError> {
    let MatrixConfig { defaults, targets } = config;

    if targets.is_empty() {
        let source = options
            .source
            .clone()
            .unwrap_or_else(|| "configuration".to_string());
        return Err(ConfigError::NoTargets(source));
    }

    if options.strict {
        validate_strict(&targets)?;
    }

    let include: Vec<ResolvedTarget> = targets
        .into_iter()
        .map(|target| {
            let resolved = ResolvedTarget::merge(&defaults, target);
            debug!(
                "resolved {}: {} apt packages, {} cmake args, sdk {}",
                resolved.id,
                resolved.apt.len(),
                resolved.cmake_args.len(),
                resolved.sdk.method()
            );
            resolved
        })
        .collect();

    Ok(Matrix { include })
}

/// Errors from producing the matrix output
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Load the configuration document at `path` and resolve it
pub fn load(path: &Path, strict: bool) -> Result<Matrix, ConfigError> {
    let config = config::load_file(path)?;
    let options = ResolveOptions {
        strict,
        source: Some(path.display().to_string()),
    };
    resolve(config, &options)
}

/// Load, resolve, and emit the matrix for `path`.
///
/// `sink` is only touched once resolution has succeeded, so a rejected
/// configuration leaves the output file as it was.
pub fn generate(
    path: &Path,
    sink: &OutputSink,
    strict: bool,
    pretty: bool,
) -> Result<Matrix, GenerateError> {
    let matrix = load(path, strict)?;
    emit(&matrix, sink, pretty)?;
    Ok(matrix)
}

fn validate_strict(targets: &[TargetConfig]) -> Result<(), ConfigError> {
    let mut ids = HashSet::new();
    for target in targets {
        if !ids.insert(target.id.as_str()) {
            return Err(ConfigError::DuplicateTarget(target.id.clone()));
        }
        if let Some(ref sdk) = target.sdk {
            if !sdk.is_recognized() {
                return Err(ConfigError::UnrecognizedMethod(sdk.method().to_string()));
            }
        }
    }
    Ok(())
}
