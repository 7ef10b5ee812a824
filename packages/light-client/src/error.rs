//! Error types for the light client

use thiserror::Error;

/// Errors returned by the light client
#[derive(Debug, Error)]
pub enum LightClientError {
    /// The requested height has not been produced yet
    #[error("height {height} is too high: the chain has not reached it yet")]
    HeightTooHigh {
        /// Requested height
        height: u64,
    },

    /// The provider has no light block at this height
    #[error("light block not found at height {height}")]
    LightBlockNotFound {
        /// Requested height
        height: u64,
    },

    /// Transport or decoding error talking to a provider
    #[error("provider {provider}: {reason}")]
    Rpc {
        /// Provider that failed
        provider: String,
        /// Underlying error
        reason: String,
    },

    /// A light block failed verification
    #[error("verification failed at height {height}: {reason}")]
    Verification {
        /// Height of the rejected block
        height: u64,
        /// Why it was rejected
        reason: String,
    },

    /// A witness reports another header than the primary
    #[error("witness {witness} disagrees with the primary at height {height}: primary {primary_hash}, witness {witness_hash}")]
    WitnessDivergence {
        /// Witness that disagrees
        witness: String,
        /// Height compared
        height: u64,
        /// Header hash from the primary
        primary_hash: String,
        /// Header hash from the witness
        witness_hash: String,
    },

    /// The header at a trusted height does not hash to the expected value
    #[error("header hash mismatch at height {height}: expected {expected}, got {actual}")]
    TrustedHashMismatch {
        /// Height compared
        height: u64,
        /// Hash that was claimed
        expected: String,
        /// Hash of the verified header
        actual: String,
    },

    /// Trust options are unusable
    #[error("invalid trust options: {0}")]
    InvalidTrustOptions(String),

    /// There is neither a trust root in the store nor trust options
    #[error("no trusted state: provide a trusted block height and hash")]
    NoTrustedState,

    /// Trusted store failure
    #[error("trusted store: {0}")]
    Store(String),
}

impl LightClientError {
    /// Whether the operation may succeed if retried once the chain advances.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::HeightTooHigh { .. } | Self::LightBlockNotFound { .. }
        )
    }

    pub(crate) fn verification(height: u64, reason: impl Into<String>) -> Self {
        Self::Verification {
            height,
            reason: reason.into(),
        }
    }
}
