//! Trust inputs.

use std::time::{SystemTime, UNIX_EPOCH};

use tendermint_light_client_verifier::types::Time;

use crate::LightClientError;

/// A block the operator or a peer claims to trust.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrustedBlockInfo {
    /// Block height, strictly positive
    pub height: u64,
    /// Header hash
    pub hash: Vec<u8>,
}

impl TrustedBlockInfo {
    /// Builds trust inputs from a height and a hex header hash.
    ///
    /// # Errors
    /// Returns [`LightClientError::InvalidTrustOptions`] if the height is not
    /// positive or the hash is not 32 bytes of hex.
    pub fn from_hex(height: i64, hash: &str) -> Result<Self, LightClientError> {
        let hash = hex::decode(hash)
            .map_err(|e| LightClientError::InvalidTrustOptions(format!("block hash: {e}")))?;
        Self::new(height, hash)
    }

    /// Builds trust inputs from raw parts as stored on chain.
    ///
    /// # Errors
    /// Returns [`LightClientError::InvalidTrustOptions`] if the height is not
    /// positive or the hash is not 32 bytes.
    pub fn new(height: i64, hash: Vec<u8>) -> Result<Self, LightClientError> {
        let height = u64::try_from(height)
            .ok()
            .filter(|h| *h > 0)
            .ok_or_else(|| {
                LightClientError::InvalidTrustOptions(format!("height must be positive, got {height}"))
            })?;
        if hash.len() != 32 {
            return Err(LightClientError::InvalidTrustOptions(format!(
                "block hash must be 32 bytes, got {}",
                hash.len()
            )));
        }
        Ok(Self { height, hash })
    }

    /// Upper-case hex of the hash, as Tendermint prints it.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hex::encode_upper(&self.hash)
    }
}

/// Current wall-clock time as a Tendermint [`Time`].
///
/// # Errors
/// Returns an error if the system clock is before the Unix epoch.
pub fn now() -> Result<Time, LightClientError> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| LightClientError::InvalidTrustOptions(format!("system clock: {e}")))?;
    let secs = i64::try_from(elapsed.as_secs())
        .map_err(|e| LightClientError::InvalidTrustOptions(format!("system clock: {e}")))?;
    Time::from_unix_timestamp(secs, elapsed.subsec_nanos())
        .map_err(|e| LightClientError::InvalidTrustOptions(format!("system clock: {e}")))
}
