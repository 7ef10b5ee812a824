//! Error types for the crypto helpers

use thiserror::Error;

/// Errors returned by the crypto helpers
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Private key bytes are not a valid secp256k1 scalar
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Public key bytes are not a valid SEC1 point
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// A symmetric key has the wrong length
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength {
        /// Required length
        expected: usize,
        /// Supplied length
        actual: usize,
    },

    /// Encryption failed
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Authentication of the ciphertext failed
    #[error("decryption failed: wrong key or corrupted ciphertext")]
    Decryption,

    /// Signature is malformed or does not verify
    #[error("invalid signature: {0}")]
    Signature(String),

    /// Mnemonic or derivation path is invalid
    #[error("failed to derive key from mnemonic: {0}")]
    Mnemonic(String),

    /// Address encoding or decoding failed
    #[error("invalid address: {0}")]
    Address(String),
}
