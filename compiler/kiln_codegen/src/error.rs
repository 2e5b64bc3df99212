//! Errors raised while emitting artifacts.

use std::io;
use std::path::Path;

/// Error type for artifact emission.
///
/// Every backend returns this; the coordinator propagates it unchanged.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// Output path is not valid.
    #[error("invalid output path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
    /// Writing the artifact failed.
    #[error("failed to write '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    /// The object writer rejected the object.
    #[error("failed to emit object file '{path}': {message}")]
    ObjectWrite { path: String, message: String },
    /// The target has no native backend for this artifact.
    #[error("target '{target}' has no native {artifact} backend")]
    UnsupportedTarget {
        target: String,
        artifact: &'static str,
    },
    /// The module could not be serialized as bitcode.
    #[error("failed to encode bitcode: {0}")]
    BitcodeEncode(String),
    /// A bitcode payload could not be deserialized.
    #[error("failed to decode bitcode: {0}")]
    BitcodeDecode(String),
    /// The file does not start with the bitcode magic.
    #[error("not a kiln bitcode file")]
    BadBitcodeMagic,
    /// The bitcode was written by an incompatible format version.
    #[error("unsupported bitcode version {found} (expected {expected})")]
    BitcodeVersion { found: u32, expected: u32 },
}

impl EmitError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Validate that the parent directory exists for an output path.
pub(crate) fn validate_parent_exists(path: &Path) -> Result<(), EmitError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(EmitError::InvalidPath {
                path: path.display().to_string(),
                reason: "parent directory does not exist".to_string(),
            });
        }
    }
    Ok(())
}

/// Write a complete artifact in one scoped call.
pub(crate) fn write_artifact(path: &Path, contents: &[u8]) -> Result<(), EmitError> {
    validate_parent_exists(path)?;
    std::fs::write(path, contents).map_err(|e| EmitError::io(path, e))?;
    tracing::trace!(path = %path.display(), bytes = contents.len(), "artifact written");
    Ok(())
}
