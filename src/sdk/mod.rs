//! SDK acquisition
//!
//! Each build target names how its SDK source tree is obtained through a
//! descriptor tagged by `method`:
//!
//! - `git`: shallow clone, optional ref sync, optional submodule sync
//! - `archive`: download and extract a tarball
//! - `submodule`: sync submodules of the host checkout
//! - `none`: nothing to fetch
//!
//! Descriptors with any other method are kept as [`SdkDescriptor::Unrecognized`]
//! so the permissive fallback stays visible and strict mode can reject them.

mod archive;
mod fetch;
mod git;

pub use fetch::{fetch, FetchError, FetchOptions};

use serde::de::{self, Deserializer};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::warn;

use crate::config::ConfigError;

/// Method tags understood by the fetcher
pub const KNOWN_METHODS: &[&str] = &["none", "git", "archive", "submodule"];

/// SDK acquisition descriptor
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SdkDescriptor {
    /// No SDK required
    #[default]
    None,
    /// Clone a git repository
    Git(GitSource),
    /// Download and extract an archive
    Archive(ArchiveSource),
    /// Sync submodules of the current checkout
    Submodule,
    /// A method this fetcher does not know; handled like `None` unless strict
    Unrecognized {
        method: String,
        fields: Map<String, Value>,
    },
}

/// Fields of a `git` descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitSource {
    /// Checkout location
    pub path: PathBuf,

    /// Clone URL
    pub repo: String,

    /// Branch, tag, or commit to check out after cloning
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,

    /// Recursively init and update submodules after checkout
    #[serde(
        default,
        deserialize_with = "deserialize_truthy",
        skip_serializing_if = "Option::is_none"
    )]
    pub submodules: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GitSource {
    pub fn new(path: impl Into<PathBuf>, repo: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            repo: repo.into(),
            git_ref: None,
            submodules: None,
            extra: Map::new(),
        }
    }

    pub fn with_ref(mut self, git_ref: impl Into<String>) -> Self {
        self.git_ref = Some(git_ref.into());
        self
    }

    pub fn with_submodules(mut self, submodules: bool) -> Self {
        self.submodules = Some(submodules);
        self
    }

    /// The ref to sync, ignoring an empty string
    pub fn git_ref(&self) -> Option<&str> {
        self.git_ref.as_deref().filter(|r| !r.is_empty())
    }

    pub fn submodules(&self) -> bool {
        self.submodules.unwrap_or(false)
    }
}

/// Fields of an `archive` descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveSource {
    /// Extraction directory
    pub path: PathBuf,

    /// Download URL
    pub url: String,

    /// Leading path components removed on extraction (default 0)
    #[serde(
        default,
        deserialize_with = "deserialize_strip_components",
        skip_serializing_if = "Option::is_none"
    )]
    pub strip_components: Option<u32>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ArchiveSource {
    pub fn new(path: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            url: url.into(),
            strip_components: None,
            extra: Map::new(),
        }
    }

    pub fn with_strip_components(mut self, strip: u32) -> Self {
        self.strip_components = Some(strip);
        self
    }

    pub fn strip_components(&self) -> u32 {
        self.strip_components.unwrap_or(0)
    }
}

/// Any JSON value, read by truthiness: `null`, `false`, `0`, `""`, `[]`, and
/// `{}` are false
fn deserialize_truthy<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => Some(n.as_f64().is_some_and(|n| n != 0.0)),
        Some(Value::String(s)) => Some(!s.is_empty()),
        Some(Value::Array(a)) => Some(!a.is_empty()),
        Some(Value::Object(o)) => Some(!o.is_empty()),
    })
}

/// Reject values git or curl would parse as an option
fn reject_option_like(method: &str, field: &str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with('-') {
        return Err(ConfigError::ValidationError(format!(
            "Invalid {} SDK descriptor: '{}' must not start with '-', got {:?}",
            method, field, value
        )));
    }
    Ok(())
}

/// Accepts `1` as well as `"1"`
fn deserialize_strip_components<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("strip_components must be a non-negative integer, got {}", n))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("strip_components must be a non-negative integer, got {:?}", s))),
        Some(other) => Err(de::Error::custom(format!(
            "strip_components must be a non-negative integer, got {}",
            other
        ))),
    }
}

impl SdkDescriptor {
    /// The `method` tag of this descriptor
    pub fn method(&self) -> &str {
        match self {
            SdkDescriptor::None => "none",
            SdkDescriptor::Git(_) => "git",
            SdkDescriptor::Archive(_) => "archive",
            SdkDescriptor::Submodule => "submodule",
            SdkDescriptor::Unrecognized { method, .. } => method,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, SdkDescriptor::Unrecognized { .. })
    }

    /// Build a descriptor from a JSON value.
    ///
    /// A missing or null `method` means `none`; a method that is not a string
    /// is unrecognized. Required fields of `git` and `archive` descriptors
    /// must be present, and `repo`, `ref`, and `url` may not start with `-`.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let mut fields = match value {
            Value::Object(map) => map,
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "SDK descriptor must be an object, got {}",
                    other
                )))
            }
        };

        let method = match fields.remove("method") {
            None | Some(Value::Null) => "none".to_string(),
            Some(Value::String(method)) => method,
            Some(other) => {
                // Keep the original value so it passes through unchanged
                let method = other.to_string();
                fields.insert("method".to_string(), other);
                return Ok(SdkDescriptor::Unrecognized { method, fields });
            }
        };

        match method.as_str() {
            "none" => Ok(SdkDescriptor::None),
            "submodule" => Ok(SdkDescriptor::Submodule),
            "git" => {
                let source: GitSource = serde_json::from_value(Value::Object(fields))
                    .map_err(|e| {
                        ConfigError::ValidationError(format!("Invalid git SDK descriptor: {}", e))
                    })?;
                reject_option_like("git", "repo", &source.repo)?;
                if let Some(ref git_ref) = source.git_ref {
                    reject_option_like("git", "ref", git_ref)?;
                }
                Ok(SdkDescriptor::Git(source))
            }
            "archive" => {
                let source: ArchiveSource = serde_json::from_value(Value::Object(fields))
                    .map_err(|e| {
                        ConfigError::ValidationError(format!(
                            "Invalid archive SDK descriptor: {}",
                            e
                        ))
                    })?;
                reject_option_like("archive", "url", &source.url)?;
                Ok(SdkDescriptor::Archive(source))
            }
            _ => Ok(SdkDescriptor::Unrecognized { method, fields }),
        }
    }

    /// Parse the descriptor handed to the fetch entry point.
    ///
    /// Absent, blank, null, or unparseable input means `none`. Input that
    /// parses but is missing required fields is an error.
    pub fn from_arg(arg: Option<&str>) -> Result<Self, ConfigError> {
        let raw = match arg.map(str::trim) {
            None | Some("") => return Ok(SdkDescriptor::None),
            Some(raw) => raw,
        };

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Null) => Ok(SdkDescriptor::None),
            Ok(value @ Value::Object(_)) => Self::from_value(value),
            Ok(other) => {
                warn!("SDK descriptor is not an object ({}), treating as none", other);
                Ok(SdkDescriptor::None)
            }
            Err(e) => {
                warn!("Could not parse SDK descriptor ({}), treating as none", e);
                Ok(SdkDescriptor::None)
            }
        }
    }

    /// Convert to the JSON form used in the matrix
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        let body = match self {
            SdkDescriptor::None | SdkDescriptor::Submodule => Map::new(),
            SdkDescriptor::Git(source) => into_object(serde_json::to_value(source)?),
            SdkDescriptor::Archive(source) => into_object(serde_json::to_value(source)?),
            SdkDescriptor::Unrecognized { fields, .. } => fields.clone(),
        };

        let mut map = Map::new();
        map.insert("method".to_string(), Value::String(self.method().to_string()));
        map.extend(body);
        Ok(Value::Object(map))
    }
}

fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl<'de> Deserialize<'de> for SdkDescriptor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        SdkDescriptor::from_value(value).map_err(de::Error::custom)
    }
}

impl Serialize for SdkDescriptor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value()
            .map_err(ser::Error::custom)?
            .serialize(serializer)
    }
}
