//! Replay error taxonomy.
//!
//! Fallible functions in this crate return `anyhow::Result`. Conditions the
//! caller may need to tell apart are raised as `ReplayError` and converted
//! with `.into()`, so they survive as a downcastable source:
//!
//! ```ignore
//! if let Some(ReplayError::ImageUnavailable { path, .. }) = err.downcast_ref() { ... }
//! ```

use std::path::PathBuf;

#[derive(Debug)]
pub enum ReplayError {
    /// Invalid or incomplete run configuration. No frames are processed.
    Configuration { message: String },
    /// The manifest could not be opened or read.
    ManifestIo {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A non-blank manifest line carries no numeric timestamp.
    ManifestParse { line: usize, content: String },
    /// The left or right image for a frame could not be loaded.
    ImageUnavailable {
        index: usize,
        path: PathBuf,
        reason: String,
    },
}

impl ReplayError {
    pub fn configuration(message: impl Into<String>) -> Self {
        ReplayError::Configuration {
            message: message.into(),
        }
    }

    /// Stable short code, used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            ReplayError::Configuration { .. } => "CONFIGURATION",
            ReplayError::ManifestIo { .. } => "MANIFEST_IO",
            ReplayError::ManifestParse { .. } => "MANIFEST_PARSE",
            ReplayError::ImageUnavailable { .. } => "IMAGE_UNAVAILABLE",
        }
    }
}

impl std::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplayError::Configuration { message } => {
                write!(f, "{}: {}", self.code(), message)
            }
            ReplayError::ManifestIo { path, source } => write!(
                f,
                "{}: failed to read manifest {}: {}",
                self.code(),
                path.display(),
                source
            ),
            ReplayError::ManifestParse { line, content } => write!(
                f,
                "{}: manifest line {} has no numeric timestamp: {:?}",
                self.code(),
                line,
                content
            ),
            ReplayError::ImageUnavailable {
                index,
                path,
                reason,
            } => write!(
                f,
                "{}: could not read image at {} (frame {}): {}",
                self.code(),
                path.display(),
                index,
                reason
            ),
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReplayError::ManifestIo { source, .. } => Some(source),
            _ => None,
        }
    }
}
