//! The oracle account: the chain account this node signs transactions with.

use bech32::{Bech32, Hrp};
use bip32::{DerivationPath, Language, Mnemonic, XPrv};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::{CryptoError, PrivateKey, PublicKey};

/// BIP-44 coin type of the chain.
pub const COIN_TYPE: u32 = 371;

/// Default bech32 prefix of account addresses.
pub const DEFAULT_ACCOUNT_PREFIX: &str = "panacea";

/// Key pair and bech32 address of the account signing transactions.
#[derive(Clone, Debug)]
pub struct OracleAccount {
    private_key: PrivateKey,
    public_key: PublicKey,
    address: String,
}

impl OracleAccount {
    /// Derives the account at `m/44'/371'/{account_number}'/0/{index}`.
    ///
    /// # Errors
    /// Returns [`CryptoError::Mnemonic`] if the mnemonic or path is invalid and
    /// [`CryptoError::Address`] if `prefix` is not a valid bech32 prefix.
    pub fn from_mnemonic(
        mnemonic: &str,
        account_number: u32,
        index: u32,
        prefix: &str,
    ) -> Result<Self, CryptoError> {
        let mnemonic = Mnemonic::new(mnemonic.trim(), Language::English)
            .map_err(|e| CryptoError::Mnemonic(e.to_string()))?;
        let seed = mnemonic.to_seed("");
        let path: DerivationPath = format!("m/44'/{COIN_TYPE}'/{account_number}'/0/{index}")
            .parse()
            .map_err(|e: bip32::Error| CryptoError::Mnemonic(e.to_string()))?;
        let xprv = XPrv::derive_from_path(&seed, &path)
            .map_err(|e| CryptoError::Mnemonic(e.to_string()))?;

        Self::from_private_key(PrivateKey::from(xprv.private_key()), prefix)
    }

    /// Wraps an existing private key.
    ///
    /// # Errors
    /// Returns [`CryptoError::Address`] if `prefix` is not a valid bech32 prefix.
    pub fn from_private_key(private_key: PrivateKey, prefix: &str) -> Result<Self, CryptoError> {
        let public_key = private_key.public_key();
        let address = account_address(&public_key, prefix)?;
        Ok(Self {
            private_key,
            public_key,
            address,
        })
    }

    /// Bech32 account address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Public key of the account.
    #[must_use]
    pub const fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Signs `msg` (typically a protobuf sign doc).
    #[must_use]
    pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
        self.private_key.sign(msg)
    }
}

/// `RIPEMD160(SHA256(compressed public key))` encoded as bech32.
///
/// # Errors
/// Returns [`CryptoError::Address`] if `prefix` is not a valid bech32 prefix.
pub fn account_address(public_key: &PublicKey, prefix: &str) -> Result<String, CryptoError> {
    let hash = Ripemd160::digest(Sha256::digest(public_key.to_bytes()));
    let hrp = Hrp::parse(prefix).map_err(|e| CryptoError::Address(e.to_string()))?;
    bech32::encode::<Bech32>(hrp, &hash).map_err(|e| CryptoError::Address(e.to_string()))
}

/// Decodes a bech32 address into its raw bytes, checking the prefix.
///
/// # Errors
/// Returns [`CryptoError::Address`] if the address is malformed or carries
/// another prefix.
pub fn address_bytes(address: &str, prefix: &str) -> Result<Vec<u8>, CryptoError> {
    let (hrp, bytes) = bech32::decode(address).map_err(|e| CryptoError::Address(e.to_string()))?;
    if hrp.as_str() != prefix {
        return Err(CryptoError::Address(format!(
            "expected prefix {prefix}, got {}",
            hrp.as_str()
        )));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon \
                            abandon abandon abandon abandon abandon abandon abandon abandon \
                            abandon abandon abandon abandon abandon abandon abandon art";

    #[test]
    fn derivation_is_deterministic() {
        let a = OracleAccount::from_mnemonic(MNEMONIC, 0, 0, DEFAULT_ACCOUNT_PREFIX).unwrap();
        let b = OracleAccount::from_mnemonic(MNEMONIC, 0, 0, DEFAULT_ACCOUNT_PREFIX).unwrap();
        let c = OracleAccount::from_mnemonic(MNEMONIC, 0, 1, DEFAULT_ACCOUNT_PREFIX).unwrap();

        assert_eq!(a.address(), b.address());
        assert_ne!(a.address(), c.address());
        assert!(a.address().starts_with("panacea1"));
    }

    #[test]
    fn address_decodes_to_pubkey_hash() {
        let account = OracleAccount::from_mnemonic(MNEMONIC, 0, 0, DEFAULT_ACCOUNT_PREFIX).unwrap();
        let bytes = address_bytes(account.address(), DEFAULT_ACCOUNT_PREFIX).unwrap();

        assert_eq!(bytes.len(), 20);
        assert!(address_bytes(account.address(), "cosmos").is_err());
    }

    #[test]
    fn invalid_mnemonic_is_rejected() {
        assert!(matches!(
            OracleAccount::from_mnemonic("not a mnemonic", 0, 0, DEFAULT_ACCOUNT_PREFIX),
            Err(CryptoError::Mnemonic(_))
        ));
    }

    #[test]
    fn account_signature_verifies_with_its_public_key() {
        let account = OracleAccount::from_mnemonic(MNEMONIC, 0, 0, DEFAULT_ACCOUNT_PREFIX).unwrap();
        let signature = account.sign(b"sign doc");
        account.public_key().verify(b"sign doc", &signature).unwrap();
    }
}
