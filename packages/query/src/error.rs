//! Error types for verified queries

use oracle_light_client::LightClientError;
use thiserror::Error;

/// Errors returned by [`crate::VerifiedQueryClient`]
#[derive(Debug, Error)]
pub enum QueryError {
    /// The ABCI response carried an empty key
    #[error("empty key")]
    EmptyKey,

    /// The ABCI response answered for a different key than the one queried
    #[error("response key {returned} does not match queried key {requested}")]
    KeyMismatch {
        /// Hex of the key that was queried
        requested: String,
        /// Hex of the key the response carried
        returned: String,
    },

    /// The ABCI response carried an empty value
    #[error("empty value")]
    EmptyValue,

    /// The ABCI response reported a height that is not positive
    #[error("negative or zero height")]
    NegativeOrZeroHeight,

    /// A proof was requested but the response has none
    #[error("merkle proof is missing from the query response")]
    ProofMissing,

    /// The application rejected the query
    #[error("query failed with code {code}: {log}")]
    AppError {
        /// ABCI response code
        code: u32,
        /// Raw log from the application
        log: String,
    },

    /// The block after the queried height never became verifiable
    #[error("cannot get next trusted block")]
    CannotGetNextTrustedBlock,

    /// Proof ops could not be decoded
    #[error("invalid proof: {0}")]
    InvalidProof(String),

    /// The proof does not commit to the value under the trusted app hash
    #[error("proof verification failed: {0}")]
    ProofVerification(String),

    /// Light client failure
    #[error(transparent)]
    LightClient(#[from] LightClientError),

    /// Transport error talking to the ABCI endpoint
    #[error("abci query: {0}")]
    Rpc(String),
}
