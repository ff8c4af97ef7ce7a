//! Error types for loadout-core.
//!
//! Only the manifest layer can fail; the change-set engine is total.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from manifest operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with file path and line context from serde_yaml.
    #[error("failed to parse manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The manifest did not exist at the expected path.
    #[error("manifest not found at {path}; run `loadout init` first")]
    ManifestNotFound { path: PathBuf },

    /// A slug that cannot be used to derive file paths.
    #[error("invalid slug '{slug}' in {category}: must be lowercase alphanumeric with hyphens")]
    InvalidSlug { category: String, slug: String },

    /// Two artifacts of one category share a slug.
    #[error("duplicate {category} slug '{slug}'")]
    DuplicateSlug { category: String, slug: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io { path: path.into(), source }
}
