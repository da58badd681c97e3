//! Strategy dispatch for SDK acquisition

use std::io;
use std::path::PathBuf;
use tracing::{info, warn};

use super::{archive, git, SdkDescriptor};
use crate::config::ConfigError;
use crate::process::{CommandRunner, ProcessError};

/// Options for a single fetch
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Reject unrecognized methods instead of treating them as `none`
    pub strict: bool,

    /// Directory for temporary downloads (system temp dir when `None`)
    pub temp_dir: Option<PathBuf>,
}

/// Errors that abort an SDK fetch
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create temporary download file: {0}")]
    TempFile(#[source] io::Error),
}

/// Acquire the SDK described by `sdk`, running external commands through
/// `runner`.
pub fn fetch(
    sdk: &SdkDescriptor,
    runner: &dyn CommandRunner,
    options: &FetchOptions,
) -> Result<(), FetchError> {
    match sdk {
        SdkDescriptor::None => {
            info!("No SDK fetch required.");
            Ok(())
        }
        SdkDescriptor::Git(source) => git::fetch(source, runner),
        SdkDescriptor::Archive(source) => archive::fetch(source, runner, options),
        SdkDescriptor::Submodule => git::sync_host_submodules(runner),
        SdkDescriptor::Unrecognized { method, .. } => {
            if options.strict {
                return Err(ConfigError::UnrecognizedMethod(method.clone()).into());
            }
            warn!("Unrecognized SDK method '{}', skipping fetch", method);
            info!("No SDK fetch required.");
            Ok(())
        }
    }
}
