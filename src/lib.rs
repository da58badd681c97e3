//! MCU CI - build matrix and SDK acquisition for multi-target CI
//!
//! Resolves the per-MCU build matrix from a defaults-plus-targets
//! configuration document and fetches the SDK source tree a single target
//! compiles against.

pub mod config;
pub mod matrix;
pub mod mock;
pub mod process;
pub mod sdk;

pub use config::{ConfigError, DefaultsConfig, MatrixConfig, TargetConfig};
pub use matrix::{resolve, Matrix, ResolveOptions, ResolvedTarget};
pub use process::{CommandRunner, CommandSpec, ProcessError, SystemRunner};
pub use sdk::{fetch, FetchError, FetchOptions, SdkDescriptor};
