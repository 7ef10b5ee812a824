//! Sealed blob format.
//!
//! ```text
//! MAGIC (5) | VERSION (1) | NONCE (12) | AES-256-GCM CIPHERTEXT
//! ```
//!
//! The measurement that sealed the blob is bound as associated data, so a
//! blob moved to another enclave fails authentication rather than decrypting
//! to garbage.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
    Aes256Gcm, Key, Nonce,
};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::EnclaveError;

const MAGIC: &[u8; 5] = b"OSEAL";
const VERSION: u8 = 1;
const NONCE_LEN: usize = 12;
const HEADER_LEN: usize = MAGIC.len() + 1 + NONCE_LEN;

/// Symmetric key bound to one enclave measurement.
pub struct SealingKey {
    key: Zeroizing<[u8; 32]>,
    aad: Vec<u8>,
}

impl std::fmt::Debug for SealingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealingKey")
            .field("aad", &hex::encode(&self.aad))
            .finish_non_exhaustive()
    }
}

impl SealingKey {
    /// Derives the sealing key for `unique_id` from a platform sealing root.
    #[must_use]
    pub fn derive(sealing_root: &[u8; 32], product_id: &[u8], unique_id: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(sealing_root);
        hasher.update(product_id);
        hasher.update(unique_id);

        Self {
            key: Zeroizing::new(hasher.finalize().into()),
            aad: unique_id.to_vec(),
        }
    }

    /// Seals `plaintext` into a self-describing blob.
    ///
    /// # Errors
    /// Returns [`EnclaveError::Seal`] if encryption fails.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, EnclaveError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.key.as_slice()));
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: plaintext,
                    aad: &self.aad,
                },
            )
            .map_err(|e| EnclaveError::Seal(e.to_string()))?;

        let mut blob = Vec::with_capacity(HEADER_LEN + ciphertext.len());
        blob.extend_from_slice(MAGIC);
        blob.push(VERSION);
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    /// Opens a blob produced by [`SealingKey::seal`].
    ///
    /// # Errors
    /// Returns [`EnclaveError::Unseal`] on a malformed blob or failed
    /// authentication.
    pub fn unseal(&self, blob: &[u8]) -> Result<Vec<u8>, EnclaveError> {
        if blob.len() < HEADER_LEN || &blob[..MAGIC.len()] != MAGIC {
            return Err(EnclaveError::Unseal("not a sealed blob".into()));
        }
        if blob[MAGIC.len()] != VERSION {
            return Err(EnclaveError::Unseal(format!(
                "unsupported sealed blob version {}",
                blob[MAGIC.len()]
            )));
        }

        let (nonce, ciphertext) = blob[MAGIC.len() + 1..].split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.key.as_slice()));
        cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: &self.aad,
                },
            )
            .map_err(|_| {
                EnclaveError::Unseal("sealed by another enclave identity or corrupted".into())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: [u8; 32] = [7; 32];

    #[test]
    fn round_trip() {
        let key = SealingKey::derive(&ROOT, &[1, 0], &[0xaa; 32]);
        let blob = key.seal(b"oracle private key").unwrap();

        assert_eq!(&blob[..5], MAGIC);
        assert_eq!(key.unseal(&blob).unwrap(), b"oracle private key".to_vec());
    }

    #[test]
    fn fails_for_other_unique_id() {
        let blob = SealingKey::derive(&ROOT, &[1, 0], &[0xaa; 32])
            .seal(b"secret")
            .unwrap();

        let other = SealingKey::derive(&ROOT, &[1, 0], &[0xbb; 32]);
        assert!(matches!(other.unseal(&blob), Err(EnclaveError::Unseal(_))));
    }

    #[test]
    fn fails_on_corruption() {
        let key = SealingKey::derive(&ROOT, &[1, 0], &[0xaa; 32]);
        let mut blob = key.seal(b"secret").unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0x01;

        assert!(matches!(key.unseal(&blob), Err(EnclaveError::Unseal(_))));
    }

    #[test]
    fn fails_on_truncated_or_foreign_blob() {
        let key = SealingKey::derive(&ROOT, &[1, 0], &[0xaa; 32]);

        assert!(key.unseal(b"OSEAL").is_err());
        assert!(key.unseal(&[0u8; 64]).is_err());
    }
}
