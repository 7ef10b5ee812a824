//! Tendermint light client for the oracle node.
//!
//! [`TrustManager`] owns the trusted light block behind a single async mutex.
//! Every verification, whether from the periodic refresh task or from a
//! proof query, runs under that lock, one at a time.
#![deny(clippy::nursery, clippy::pedantic, warnings, missing_docs)]

pub mod error;
pub mod headers;
pub mod manager;
pub mod provider;
pub mod refresh;
pub mod store;
pub mod types;

pub use error::LightClientError;
pub use headers::{verify_trusted_block, TrustedHeaders};
pub use manager::{LightClientConfig, TrustManager, DEFAULT_TRUSTING_PERIOD};
pub use provider::{LightBlockProvider, RpcProvider};
pub use refresh::spawn_refresh;
pub use store::{FileTrustedStore, MemoryTrustedStore, TrustedStore};
pub use tendermint_light_client_verifier::types::{LightBlock, Time, TrustThreshold};
pub use types::{now, TrustedBlockInfo};
