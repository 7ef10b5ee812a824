//! Error types for the enclave key vault

use std::path::Path;

use thiserror::Error;

/// Errors returned by enclave operations
#[derive(Debug, Error)]
pub enum EnclaveError {
    /// Sealing failed
    #[error("failed to seal data: {0}")]
    Seal(String),

    /// Unsealing failed, either a foreign enclave identity or a corrupted blob
    #[error("failed to unseal data: {0}")]
    Unseal(String),

    /// Report generation failed
    #[error("failed to generate remote report: {0}")]
    Report(String),

    /// The report is malformed or its platform signature is invalid
    #[error("invalid remote report: {0}")]
    InvalidReport(String),

    /// The report is authentic but does not satisfy the verification policy
    #[error("remote report verification failed: {reason}")]
    ReportVerification {
        /// Which check failed
        reason: String,
    },

    /// The platform key material is unusable
    #[error("invalid platform key: {0}")]
    PlatformKey(String),

    /// A sealed file is never overwritten
    #[error("sealed file `{path}` already exists")]
    SealedFileExists {
        /// Path of the file
        path: String,
    },

    /// Filesystem error on a sealed file
    #[error("I/O error on `{path}`: {source}")]
    Io {
        /// Path of the file
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl EnclaveError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::AlreadyExists {
            return Self::SealedFileExists {
                path: path.display().to_string(),
            };
        }
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn verification(reason: impl Into<String>) -> Self {
        Self::ReportVerification {
            reason: reason.into(),
        }
    }
}
