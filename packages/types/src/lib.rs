//! Types of the on-chain oracle module as seen by the oracle node.
#![deny(clippy::nursery, clippy::pedantic, warnings, missing_docs)]

pub mod artifact;
pub mod error;
pub mod events;
pub mod keys;
pub mod msgs;
pub mod records;

pub use artifact::OraclePubKeyInfo;
pub use error::TypesError;
pub use msgs::{
    ApprovalSharingOracleKey, MsgApproveOracleRegistration, MsgApproveOracleUpgrade,
    MsgRegisterOracle, MsgUpgradeOracle, TypedMsg,
};
pub use records::{Oracle, OracleRegistration, OracleUpgrade, OracleUpgradeInfo, Params};

/// Decodes a protobuf record read from the chain.
///
/// # Errors
/// Returns [`TypesError::Decode`] if `bytes` is not a valid encoding of `T`.
pub fn decode<T: prost::Message + Default>(bytes: &[u8]) -> Result<T, TypesError> {
    T::decode(bytes).map_err(|e| TypesError::Decode {
        type_name: std::any::type_name::<T>(),
        reason: e.to_string(),
    })
}
