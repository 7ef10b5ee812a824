//! Merkle-proof verified queries.
//!
//! [`VerifiedQueryClient`] turns an untrusted ABCI endpoint into a source of
//! authenticated key/value state: every value it returns is proven against
//! the app hash of a header verified by the light client.
#![deny(clippy::nursery, clippy::pedantic, warnings, missing_docs)]

pub mod abci;
pub mod client;
pub mod error;
pub mod proof;

pub use abci::{AbciClient, AbciResponse};
pub use client::{VerifiedQueryClient, NEXT_BLOCK_ATTEMPTS, NEXT_BLOCK_POLL_INTERVAL};
pub use error::QueryError;
pub use proof::verify_store_proof;
pub use tendermint::merkle::proof::{ProofOp, ProofOps};
