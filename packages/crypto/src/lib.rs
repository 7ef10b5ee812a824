//! Cryptographic primitives shared by the oracle node.
//!
//! - secp256k1 key handling and ECDSA signatures over SHA-256 digests
//! - ECDH shared keys (`SHA-256` of the raw X coordinate)
//! - AES-256-GCM with a random nonce prepended to the ciphertext
//! - the oracle account derived from a BIP-39 mnemonic
#![deny(clippy::nursery, clippy::pedantic, warnings, missing_docs)]

pub mod account;
pub mod aes;
pub mod ecdh;
pub mod error;
pub mod keys;

pub use account::OracleAccount;
pub use ecdh::derive_shared_key;
pub use error::CryptoError;
pub use keys::{PrivateKey, PublicKey};
