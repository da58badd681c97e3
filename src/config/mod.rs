//! Multi-target build configuration
//!
//! The configuration document (`.github/mcus.json` by default) holds a
//! `defaults` record applied to every target and an ordered `targets` list.
//! JSON and TOML documents deserialize into the same schema.

mod load;
mod schema;

pub use load::{load_file, parse_json, parse_toml, DEFAULT_CONFIG_PATH};
pub use schema::{DefaultsConfig, MatrixConfig, TargetConfig};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("No targets found in {0}")]
    NoTargets(String),

    #[error("Duplicate target id '{0}'")]
    DuplicateTarget(String),

    #[error(
        "Unrecognized SDK method '{0}' (expected one of: {})",
        crate::sdk::KNOWN_METHODS.join(", ")
    )]
    UnrecognizedMethod(String),
}
