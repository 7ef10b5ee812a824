//! secp256k1 key pairs and signatures.

use k256::ecdsa::{
    signature::{Signer, Verifier},
    Signature, SigningKey, VerifyingKey,
};
use rand_core::OsRng;
use zeroize::Zeroizing;

use crate::CryptoError;

/// Length of a compressed SEC1 public key.
pub const COMPRESSED_PUBLIC_KEY_LEN: usize = 33;

/// A secp256k1 private key.
#[derive(Clone)]
pub struct PrivateKey(k256::SecretKey);

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PrivateKey")
            .field(&hex::encode(self.public_key().to_bytes()))
            .finish()
    }
}

impl PrivateKey {
    /// Generates a fresh key from the OS random number generator.
    #[must_use]
    pub fn generate() -> Self {
        Self(k256::SecretKey::random(&mut OsRng))
    }

    /// Parses a 32-byte big-endian scalar.
    ///
    /// # Errors
    /// Returns [`CryptoError::InvalidPrivateKey`] if the bytes are not a
    /// valid non-zero scalar.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        k256::SecretKey::from_slice(bytes)
            .map(Self)
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))
    }

    /// Raw 32-byte scalar.
    #[must_use]
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.0.to_bytes().to_vec())
    }

    /// The matching public key.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.public_key())
    }

    /// Signs `msg` with ECDSA over its SHA-256 digest.
    ///
    /// Returns the 64-byte `r || s` encoding with a normalized low `s`.
    #[must_use]
    pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
        let signature: Signature = SigningKey::from(&self.0).sign(msg);
        signature.to_bytes().to_vec()
    }

    pub(crate) const fn secret(&self) -> &k256::SecretKey {
        &self.0
    }
}

impl From<&SigningKey> for PrivateKey {
    fn from(key: &SigningKey) -> Self {
        Self(k256::SecretKey::from(*key.as_nonzero_scalar()))
    }
}

/// A secp256k1 public key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicKey(k256::PublicKey);

impl PublicKey {
    /// Parses a SEC1 encoded point, compressed or not.
    ///
    /// # Errors
    /// Returns [`CryptoError::InvalidPublicKey`] if the bytes are not a point
    /// on the curve.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        k256::PublicKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }

    /// Compressed 33-byte SEC1 encoding.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_sec1_bytes().to_vec()
    }

    /// Verifies a 64-byte `r || s` signature over the SHA-256 digest of `msg`.
    ///
    /// # Errors
    /// Returns [`CryptoError::Signature`] if the signature is malformed or
    /// does not verify.
    pub fn verify(&self, msg: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        let signature = Signature::from_slice(signature)
            .map_err(|e| CryptoError::Signature(e.to_string()))?;
        VerifyingKey::from(&self.0)
            .verify(msg, &signature)
            .map_err(|_| CryptoError::Signature("signature does not verify".into()))
    }

    pub(crate) const fn inner(&self) -> &k256::PublicKey {
        &self.0
    }
}
