//! ICS23 membership verification of store values.

use ibc_core_commitment_types::{
    commitment::CommitmentRoot,
    merkle::{MerklePath, MerkleProof},
    proto::ics23::{CommitmentProof, HostFunctionsManager},
    specs::ProofSpecs,
};
use ibc_core_host_types::path::PathBytes;
use prost::Message;
use tendermint::merkle::proof::ProofOps;

use crate::QueryError;

/// Verifies that `store_key/key` holds `value` in the state committed to by
/// `app_hash`.
///
/// `proof_ops` must hold the IAVL proof of `key` within the store followed by
/// the simple merkle proof of the store within the multistore.
///
/// # Errors
/// [`QueryError::InvalidProof`] if an op does not decode as an ICS23 proof,
/// [`QueryError::ProofVerification`] if the proof does not check out.
pub fn verify_store_proof(
    app_hash: &[u8],
    store_key: &str,
    key: &[u8],
    value: &[u8],
    proof_ops: &ProofOps,
) -> Result<(), QueryError> {
    let proofs = proof_ops
        .ops
        .iter()
        .map(|op| {
            CommitmentProof::decode(op.data.as_slice())
                .map_err(|e| QueryError::InvalidProof(format!("{}: {e}", op.field_type)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let merkle_proof = MerkleProof { proofs };
    let commitment_root = CommitmentRoot::from_bytes(app_hash);
    let merkle_path = MerklePath::new(vec![
        PathBytes::from_bytes(store_key.as_bytes()),
        PathBytes::from_bytes(key),
    ]);

    merkle_proof
        .verify_membership::<HostFunctionsManager>(
            &ProofSpecs::cosmos(),
            commitment_root.into(),
            merkle_path,
            value.to_vec(),
            0,
        )
        .map_err(|e| QueryError::ProofVerification(e.to_string()))
}
