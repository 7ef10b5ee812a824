//! The capability the rest of the node needs from the light client.

use async_trait::async_trait;
use tendermint_light_client_verifier::types::{LightBlock, Time};

use crate::{LightClientError, TrustedBlockInfo};

/// Source of verified light blocks.
///
/// Implementations serialize calls, so callers may share one instance across
/// tasks.
#[async_trait]
pub trait TrustedHeaders: Send + Sync {
    /// Advances trust to the primary's latest block.
    ///
    /// Returns the new trusted block, or `None` when already at the tip.
    ///
    /// # Errors
    /// Fails if the new header does not verify or a witness disagrees. Trust
    /// is left unchanged in that case.
    async fn update(&self, now: Time) -> Result<Option<LightBlock>, LightClientError>;

    /// Verifies the block at `height`, below or above the current trust root.
    ///
    /// # Errors
    /// [`LightClientError::HeightTooHigh`] if the chain has not reached
    /// `height` yet, otherwise any verification or provider error.
    async fn verify_at_height(&self, height: u64, now: Time) -> Result<LightBlock, LightClientError>;

    /// The highest block verified so far.
    async fn latest_trusted(&self) -> LightBlock;
}

/// Verifies the block at `info.height` and checks that it hashes to `info.hash`.
///
/// Used to confirm a trusted block claimed by another node.
///
/// # Errors
/// Returns [`LightClientError::TrustedHashMismatch`] if the verified header
/// differs from the claim, or any error from [`TrustedHeaders::verify_at_height`].
pub async fn verify_trusted_block(
    headers: &(impl TrustedHeaders + ?Sized),
    info: &TrustedBlockInfo,
    now: Time,
) -> Result<LightBlock, LightClientError> {
    let block = headers.verify_at_height(info.height, now).await?;
    let actual = block.signed_header.header.hash();

    if actual.as_bytes() != info.hash.as_slice() {
        return Err(LightClientError::TrustedHashMismatch {
            height: info.height,
            expected: info.hash_hex(),
            actual: actual.to_string(),
        });
    }
    Ok(block)
}
