//! Enclave key vault for the oracle node.
//!
//! Binds secret material to the measured identity of the running enclave
//! ([`Enclave::seal`] / [`Enclave::unseal`]) and produces or checks remote
//! attestation reports that bind arbitrary data to that identity.
#![deny(clippy::nursery, clippy::pedantic, warnings, missing_docs)]

pub mod error;
pub mod info;
pub mod report;
pub mod sealing;
pub mod simulated;

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::Path,
};

pub use error::EnclaveError;
pub use info::EnclaveInfo;
pub use report::{verify_remote_report, Report, ReportPolicy};
pub use simulated::{Measurement, PlatformKey, SimulatedEnclave};

/// Payload used when an enclave reports on itself to learn its own identity.
const SELF_REPORT_DATA: &[u8] = b"oracle-enclave-self-report";

/// A running enclave able to seal data and attest to its measurement.
///
/// Implementations must be safe to share across tasks.
pub trait Enclave: Send + Sync {
    /// Encrypts `plaintext` with a key only this enclave measurement can derive.
    ///
    /// # Errors
    /// Returns [`EnclaveError::Seal`] on hardware or environment failure.
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, EnclaveError>;

    /// Inverse of [`Enclave::seal`].
    ///
    /// # Errors
    /// Returns [`EnclaveError::Unseal`] if the blob was sealed by a different
    /// enclave identity or is corrupted.
    fn unseal(&self, sealed: &[u8]) -> Result<Vec<u8>, EnclaveError>;

    /// Produces a signed report binding `report_data` to this enclave's
    /// measurement.
    ///
    /// # Errors
    /// Returns [`EnclaveError::Report`] if the report cannot be produced.
    fn generate_remote_report(&self, report_data: &[u8]) -> Result<Vec<u8>, EnclaveError>;

    /// Checks the authenticity of a report and decodes it.
    ///
    /// This only validates the platform signature. Identity and data checks
    /// live in [`verify_remote_report`].
    ///
    /// # Errors
    /// Returns [`EnclaveError::InvalidReport`] if the report is malformed or
    /// its signature does not verify.
    fn verify_report_signature(&self, report: &[u8]) -> Result<Report, EnclaveError>;

    /// Seals `plaintext` and writes the blob to a new file at `path`.
    ///
    /// # Errors
    /// Same as [`Enclave::seal`], plus [`EnclaveError::SealedFileExists`] if
    /// `path` is already taken and [`EnclaveError::Io`].
    fn seal_to_file(&self, plaintext: &[u8], path: &Path) -> Result<(), EnclaveError> {
        let sealed = self.seal(plaintext)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| EnclaveError::io(parent, e))?;
        }
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| EnclaveError::io(path, e))?;
        file.write_all(&sealed)
            .and_then(|()| file.sync_all())
            .map_err(|e| EnclaveError::io(path, e))
    }

    /// Reads the blob at `path` and unseals it.
    ///
    /// # Errors
    /// Same as [`Enclave::unseal`], plus [`EnclaveError::Io`].
    fn unseal_from_file(&self, path: &Path) -> Result<Vec<u8>, EnclaveError> {
        let sealed = fs::read(path).map_err(|e| EnclaveError::io(path, e))?;
        self.unseal(&sealed)
    }

    /// Reports on a fixed payload and extracts this binary's own identity.
    ///
    /// # Errors
    /// Returns an error if the self report cannot be generated or decoded.
    fn generate_self_enclave_info(&self) -> Result<EnclaveInfo, EnclaveError> {
        let report = self.generate_remote_report(SELF_REPORT_DATA)?;
        let report = self.verify_report_signature(&report)?;
        Ok(EnclaveInfo::new(report.product_id, report.unique_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enclave(image: &[u8]) -> SimulatedEnclave {
        let platform = PlatformKey::from_seed(b"test platform").unwrap();
        SimulatedEnclave::new(platform, Measurement::from_image(1, image, 2))
    }

    #[test]
    fn self_info_matches_measurement() {
        let enclave = enclave(b"oracle binary v1");
        let info = enclave.generate_self_enclave_info().unwrap();

        assert_eq!(info.unique_id, enclave.measurement().unique_id.to_vec());
        assert_eq!(info.product_id, 1u16.to_le_bytes().to_vec());
        assert_eq!(info.unique_id_hex().len(), 64);
    }

    #[test]
    fn seal_to_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys").join("oracle_priv_key.sealed");
        let enclave = enclave(b"oracle binary v1");

        enclave.seal_to_file(b"secret key", &path).unwrap();
        assert_ne!(std::fs::read(&path).unwrap(), b"secret key".to_vec());
        assert_eq!(enclave.unseal_from_file(&path).unwrap(), b"secret key".to_vec());
    }

    #[test]
    fn seal_to_file_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oracle_priv_key.sealed");
        let enclave = enclave(b"oracle binary v1");

        enclave.seal_to_file(b"first key", &path).unwrap();
        let err = enclave.seal_to_file(b"second key", &path).unwrap_err();

        assert!(matches!(err, EnclaveError::SealedFileExists { .. }));
        assert_eq!(enclave.unseal_from_file(&path).unwrap(), b"first key".to_vec());
    }

    #[test]
    fn unseal_from_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let enclave = enclave(b"oracle binary v1");

        let err = enclave
            .unseal_from_file(&dir.path().join("missing.sealed"))
            .unwrap_err();
        assert!(matches!(err, EnclaveError::Io { .. }));
    }

    #[test]
    fn other_measurement_cannot_unseal_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node_priv_key.sealed");

        enclave(b"oracle binary v1")
            .seal_to_file(b"node key", &path)
            .unwrap();
        let err = enclave(b"oracle binary v2")
            .unseal_from_file(&path)
            .unwrap_err();
        assert!(matches!(err, EnclaveError::Unseal(_)));
    }
}
