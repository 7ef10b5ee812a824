//! ECDH shared keys.

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::{PrivateKey, PublicKey};

/// Derives the symmetric key shared between `private_key` and `public_key`.
///
/// The key is a single SHA-256 over the raw X coordinate of the ECDH point.
/// The on-chain verifier derives it the same way, so no further KDF is
/// applied.
#[must_use]
pub fn derive_shared_key(private_key: &PrivateKey, public_key: &PublicKey) -> Zeroizing<[u8; 32]> {
    let shared = k256::ecdh::diffie_hellman(
        private_key.secret().to_nonzero_scalar(),
        public_key.inner().as_affine(),
    );
    Zeroizing::new(Sha256::digest(shared.raw_secret_bytes()).into())
}
