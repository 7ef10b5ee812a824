//! Software enclave backend.
//!
//! A configured platform seed stands in for the hardware root of trust: it
//! yields both the sealing root and the key that signs remote reports. Two
//! nodes configured with the same seed can attest to each other, and sealed
//! files only open under the same seed and measurement.

use std::{fmt, path::Path};

use k256::ecdsa::{
    signature::{Signer, Verifier},
    Signature, SigningKey, VerifyingKey,
};
use prost::Message;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::{
    report::{to_report_data, ReportBody, SignedReport},
    sealing::SealingKey,
    Enclave, EnclaveError, Report,
};

/// Hardware root stand-in: sealing root plus report-signing key.
#[derive(Clone)]
pub struct PlatformKey {
    sealing_root: Zeroizing<[u8; 32]>,
    signing_key: SigningKey,
}

impl fmt::Debug for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformKey")
            .field("verifying_key", &hex::encode(self.verifying_key_bytes()))
            .finish_non_exhaustive()
    }
}

impl PlatformKey {
    /// Derives the platform keys from a secret seed.
    ///
    /// # Errors
    /// Returns [`EnclaveError::PlatformKey`] if the seed is empty or derives
    /// an invalid signing key.
    pub fn from_seed(seed: &[u8]) -> Result<Self, EnclaveError> {
        if seed.is_empty() {
            return Err(EnclaveError::PlatformKey("platform seed is empty".into()));
        }

        let sealing_root: [u8; 32] = Sha256::new()
            .chain_update(b"seal")
            .chain_update(seed)
            .finalize()
            .into();
        let attest = Zeroizing::new(
            Sha256::new()
                .chain_update(b"attest")
                .chain_update(seed)
                .finalize(),
        );
        let signing_key = SigningKey::from_slice(attest.as_slice())
            .map_err(|e| EnclaveError::PlatformKey(e.to_string()))?;

        Ok(Self {
            sealing_root: Zeroizing::new(sealing_root),
            signing_key,
        })
    }

    /// Public half of the report-signing key.
    #[must_use]
    pub fn verifying_key(&self) -> &VerifyingKey {
        self.signing_key.verifying_key()
    }

    fn verifying_key_bytes(&self) -> Vec<u8> {
        self.verifying_key().to_encoded_point(true).as_bytes().to_vec()
    }

    /// Identity of the enclave author derived from the platform key.
    #[must_use]
    pub fn signer_id(&self) -> [u8; 32] {
        Sha256::digest(self.verifying_key_bytes()).into()
    }
}

/// Measured identity of an enclave binary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Measurement {
    /// Product identifier
    pub product_id: u16,
    /// SHA-256 of the measured image
    pub unique_id: [u8; 32],
    /// Security version
    pub security_version: u32,
    /// Debug mode
    pub debug: bool,
}

impl Measurement {
    /// Measures an in-memory image.
    #[must_use]
    pub fn from_image(product_id: u16, image: &[u8], security_version: u32) -> Self {
        Self::with_unique_id(product_id, Sha256::digest(image).into(), security_version)
    }

    /// Builds a measurement from a known unique id.
    #[must_use]
    pub const fn with_unique_id(product_id: u16, unique_id: [u8; 32], security_version: u32) -> Self {
        Self {
            product_id,
            unique_id,
            security_version,
            debug: false,
        }
    }

    /// Measures the executable at `path`.
    ///
    /// # Errors
    /// Returns [`EnclaveError::Io`] if the file cannot be read.
    pub fn from_executable(
        product_id: u16,
        path: &Path,
        security_version: u32,
    ) -> Result<Self, EnclaveError> {
        let image = std::fs::read(path).map_err(|e| EnclaveError::io(path, e))?;
        Ok(Self::from_image(product_id, &image, security_version))
    }

    /// Measures the running executable.
    ///
    /// # Errors
    /// Returns [`EnclaveError::Io`] if the executable cannot be located or read.
    pub fn of_current_executable(product_id: u16, security_version: u32) -> Result<Self, EnclaveError> {
        let path = std::env::current_exe().map_err(|e| EnclaveError::io(Path::new("<current exe>"), e))?;
        Self::from_executable(product_id, &path, security_version)
    }

    /// Marks the measurement as a debug enclave.
    #[must_use]
    pub const fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// [`Enclave`] implemented in software on top of a [`PlatformKey`].
#[derive(Debug)]
pub struct SimulatedEnclave {
    platform: PlatformKey,
    measurement: Measurement,
    sealing_key: SealingKey,
}

impl SimulatedEnclave {
    /// Starts an enclave with the given measurement on `platform`.
    #[must_use]
    pub fn new(platform: PlatformKey, measurement: Measurement) -> Self {
        let sealing_key = SealingKey::derive(
            &platform.sealing_root,
            &measurement.product_id.to_le_bytes(),
            &measurement.unique_id,
        );
        tracing::debug!(
            unique_id = %hex::encode(measurement.unique_id),
            product_id = measurement.product_id,
            security_version = measurement.security_version,
            "simulated enclave started"
        );

        Self {
            platform,
            measurement,
            sealing_key,
        }
    }

    /// Measurement of this enclave.
    #[must_use]
    pub const fn measurement(&self) -> &Measurement {
        &self.measurement
    }
}

impl Enclave for SimulatedEnclave {
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, EnclaveError> {
        self.sealing_key.seal(plaintext)
    }

    fn unseal(&self, sealed: &[u8]) -> Result<Vec<u8>, EnclaveError> {
        self.sealing_key.unseal(sealed)
    }

    fn generate_remote_report(&self, report_data: &[u8]) -> Result<Vec<u8>, EnclaveError> {
        let body = ReportBody {
            report_data: to_report_data(report_data),
            unique_id: self.measurement.unique_id.to_vec(),
            signer_id: self.platform.signer_id().to_vec(),
            product_id: self.measurement.product_id.to_le_bytes().to_vec(),
            security_version: self.measurement.security_version,
            debug: self.measurement.debug,
        };
        let signature: Signature = self
            .platform
            .signing_key
            .try_sign(&body.encode_to_vec())
            .map_err(|e| EnclaveError::Report(e.to_string()))?;

        Ok(SignedReport {
            body: Some(body),
            signature: signature.to_bytes().to_vec(),
        }
        .encode_to_vec())
    }

    fn verify_report_signature(&self, report: &[u8]) -> Result<Report, EnclaveError> {
        let signed = SignedReport::decode(report)
            .map_err(|e| EnclaveError::InvalidReport(format!("cannot decode report: {e}")))?;
        let body = signed
            .body
            .ok_or_else(|| EnclaveError::InvalidReport("report has no body".into()))?;
        let signature = Signature::from_slice(&signed.signature)
            .map_err(|e| EnclaveError::InvalidReport(format!("malformed signature: {e}")))?;

        self.platform
            .verifying_key()
            .verify(&body.encode_to_vec(), &signature)
            .map_err(|_| EnclaveError::InvalidReport("platform signature does not verify".into()))?;

        if body.signer_id != self.platform.signer_id() {
            return Err(EnclaveError::InvalidReport("unexpected signer id".into()));
        }

        Ok(body.into())
    }
}
