//! Errors of the oracle node protocol.

use oracle_crypto::CryptoError;
use oracle_enclave::EnclaveError;
use oracle_light_client::LightClientError;
use oracle_query::QueryError;
use oracle_types::TypesError;
use thiserror::Error;

/// Errors raised while serving the key-sharing protocol.
#[derive(Debug, Error)]
pub enum OracleError {
    /// A node running another binary asked for the oracle key
    #[error("requester's unique ID differs from this binary's unique ID")]
    RequesterIdentityMismatch,

    /// An upgrade targets a binary other than the one the chain allows
    #[error("unique ID {actual} of the upgrade differs from the upgrade info {expected}")]
    UpgradeIdentityMismatch {
        /// Unique id recorded in the upgrade info
        expected: String,
        /// Unique id claimed by the upgrading node
        actual: String,
    },

    /// An upgrade targets an oracle the chain does not know
    #[error("oracle {address} is not registered: {reason}")]
    NotRegistered {
        /// Address of the upgrading oracle
        address: String,
        /// Why the lookup failed
        reason: String,
    },

    /// A sealed oracle key is already on disk
    #[error("the oracle private key already exists")]
    OracleKeyExists,

    /// The sealed node key was never generated
    #[error("the node private key is not exists")]
    NodeKeyMissing,

    /// The unwrapped key is not the oracle key announced on chain
    #[error("the decrypted oracle private key does not match the oracle public key in params")]
    OracleKeyMismatch,

    /// An event lacks an attribute the handler needs
    #[error("event is missing attribute {0}")]
    MissingAttribute(String),

    /// The chain rejected a transaction
    #[error("transaction failed with code {code}: {log}")]
    TxFailed {
        /// ABCI response code
        code: u32,
        /// Raw log from the chain
        log: String,
    },

    /// The public key artifact could not be written
    #[error("writing {path}: {reason}")]
    Artifact {
        /// Artifact path
        path: String,
        /// Underlying error
        reason: String,
    },

    /// RPC transport error
    #[error("rpc: {0}")]
    Rpc(String),

    /// Event subscription error
    #[error("subscription: {0}")]
    Subscription(String),

    /// The completion channel closed before a result was delivered
    #[error("approval handler stopped before reporting a result")]
    CompletionDropped,

    /// Verified query failure
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Light client failure
    #[error(transparent)]
    LightClient(#[from] LightClientError),

    /// Enclave failure
    #[error(transparent)]
    Enclave(#[from] EnclaveError),

    /// Key handling or encryption failure
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Malformed on-chain record
    #[error(transparent)]
    Types(#[from] TypesError),
}
