use std::path::PathBuf;
use thiserror::Error;

/// Startup failures. The restrictor cannot produce a frame after any of these.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("failed to read config {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("eye render target has zero size ({width}x{height})")]
    EmptyEyeTarget { width: u32, height: u32 },
}

impl SetupError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SetupError::Invalid { field, reason: reason.into() }
    }
}
