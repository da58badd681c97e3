//! Typed records for the configuration document

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::sdk::SdkDescriptor;

/// Settings applied to every target unless the target overrides them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Toolchain identifier (e.g., "arm-none-eabi-gcc")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolchain: Option<String>,

    /// apt packages installed for every target
    #[serde(default)]
    pub apt: Vec<String>,

    /// CMake arguments prepended to every target's own arguments
    #[serde(default)]
    pub cmake_args: Vec<String>,
}

/// One build target as written in the configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Job identity (e.g., "rp2040")
    pub id: String,

    /// Human-readable description; resolves to `id` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolchain: Option<String>,

    #[serde(default)]
    pub apt: Vec<String>,

    #[serde(default)]
    pub cmake_args: Vec<String>,

    /// SDK acquisition descriptor; resolves to `{"method": "none"}` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk: Option<SdkDescriptor>,

    /// Fields the resolver does not interpret, passed through unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The whole configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixConfig {
    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}
