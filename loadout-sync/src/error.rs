//! Error types for loadout-sync.

use std::path::PathBuf;

use thiserror::Error;

use loadout_core::CoreError;
use loadout_renderer::RenderError;

/// All errors that can arise from install, remove and status operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from the rendering engine.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// An error from the manifest layer.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (deployment state).
    #[error("deployment state JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A write flagged `isBase64` whose content does not decode.
    #[error("invalid base64 content for {path}: {source}")]
    Base64 {
        path: String,
        #[source]
        source: base64::DecodeError,
    },

    /// A shared file holding bytes that are not UTF-8, so its sections
    /// cannot be patched without rewriting the user's content.
    #[error("cannot patch sections of {path}: file is not valid UTF-8 ({source})")]
    InvalidUtf8 {
        path: String,
        #[source]
        source: std::str::Utf8Error,
    },

    /// A change-set path that would land outside the checkout.
    #[error("refusing to touch '{path}': path is absolute or escapes the checkout root")]
    UnsafePath { path: String },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
