//! Sealed key files and their attestation.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};
use oracle_crypto::{PrivateKey, PublicKey};
use oracle_enclave::Enclave;
use oracle_types::OraclePubKeyInfo;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::OracleError;

/// Sealed node private key.
pub const NODE_PRIV_KEY_FILE: &str = "node_priv_key.sealed";
/// Sealed oracle private key.
pub const ORACLE_PRIV_KEY_FILE: &str = "oracle_priv_key.sealed";
/// Public oracle key and its report, written by `gen-oracle-key`.
pub const ORACLE_PUB_KEY_FILE: &str = "oracle_pub_key.json";

/// Locations of the key files of one node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyPaths {
    /// Sealed node private key
    pub node_priv_key: PathBuf,
    /// Sealed oracle private key
    pub oracle_priv_key: PathBuf,
    /// Oracle public key artifact
    pub oracle_pub_key: PathBuf,
}

impl KeyPaths {
    /// Key files under `data_dir`.
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Self {
            node_priv_key: data_dir.join(NODE_PRIV_KEY_FILE),
            oracle_priv_key: data_dir.join(ORACLE_PRIV_KEY_FILE),
            oracle_pub_key: data_dir.join(ORACLE_PUB_KEY_FILE),
        }
    }
}

/// A node key with a fresh report over its public key.
pub struct AttestedKey {
    /// The private key
    pub private_key: PrivateKey,
    /// Report binding `sha256(public key)` to this enclave
    pub remote_report: Vec<u8>,
}

impl AttestedKey {
    /// Compressed public key.
    #[must_use]
    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.private_key.public_key().to_bytes()
    }
}

/// Report data binding `public_key`.
#[must_use]
pub fn public_key_report_data(public_key: &[u8]) -> Vec<u8> {
    Sha256::digest(public_key).to_vec()
}

/// Produces a report binding `public_key` to `enclave`.
///
/// # Errors
/// Enclave report failures.
pub fn attest_public_key(enclave: &dyn Enclave, public_key: &PublicKey) -> Result<Vec<u8>, OracleError> {
    Ok(enclave.generate_remote_report(&public_key_report_data(&public_key.to_bytes()))?)
}

/// Reuses the sealed node key at `path`, or generates and seals a new one.
///
/// # Errors
/// Fails if an existing key cannot be unsealed, or on sealing and report
/// failures.
pub fn load_or_generate_node_key(enclave: &dyn Enclave, path: &Path) -> Result<AttestedKey, OracleError> {
    let private_key = if path.exists() {
        info!(path = %path.display(), "reusing the sealed node key");
        unseal_key(enclave, path)?
    } else {
        let key = PrivateKey::generate();
        enclave.seal_to_file(&key.to_bytes(), path)?;
        info!(path = %path.display(), "node key generated and sealed");
        key
    };

    let remote_report = attest_public_key(enclave, &private_key.public_key())?;
    Ok(AttestedKey {
        private_key,
        remote_report,
    })
}

/// Generates the oracle key of a new chain, seals it and writes its public
/// artifact.
///
/// # Errors
/// [`OracleError::OracleKeyExists`] if a sealed oracle key is already on
/// disk, or sealing, report and I/O failures.
pub fn generate_oracle_key(enclave: &dyn Enclave, paths: &KeyPaths) -> Result<OraclePubKeyInfo, OracleError> {
    if paths.oracle_priv_key.exists() {
        return Err(OracleError::OracleKeyExists);
    }

    let key = PrivateKey::generate();
    enclave.seal_to_file(&key.to_bytes(), &paths.oracle_priv_key)?;
    let public_key = key.public_key();
    let report = attest_public_key(enclave, &public_key)?;

    let info = OraclePubKeyInfo {
        public_key_base64: STANDARD.encode(public_key.to_bytes()),
        remote_report_base64: STANDARD.encode(report),
    };
    let artifact_error = |reason: String| OracleError::Artifact {
        path: paths.oracle_pub_key.display().to_string(),
        reason,
    };
    let json = serde_json::to_vec_pretty(&info).map_err(|e| artifact_error(e.to_string()))?;
    std::fs::write(&paths.oracle_pub_key, json).map_err(|e| artifact_error(e.to_string()))?;

    info!(path = %paths.oracle_priv_key.display(), "oracle key generated and sealed");
    Ok(info)
}

/// Unseals the private key at `path`.
///
/// # Errors
/// Unsealing failures, or a blob that is not a private key.
pub fn unseal_key(enclave: &dyn Enclave, path: &Path) -> Result<PrivateKey, OracleError> {
    let bytes = zeroize::Zeroizing::new(enclave.unseal_from_file(path)?);
    Ok(PrivateKey::from_bytes(&bytes)?)
}
