//! The key-sharing protocol.
//!
//! Per oracle identity the protocol moves `NoKey -> PendingApproval -> HasKey`:
//! a node registers (or upgrades) with an attested node key, an approved
//! oracle verifies it and shares the oracle key wrapped for that node key,
//! and the node unwraps the key and seals it into its own enclave.

pub mod approve;
pub mod completion;
pub mod keys;
pub mod receive;

use std::sync::Arc;

use oracle_crypto::OracleAccount;
use oracle_enclave::{Enclave, EnclaveInfo, ReportPolicy};
use oracle_light_client::TrustedHeaders;

pub use approve::{ApproveRegistrationHandler, ApproveUpgradeHandler};
pub use completion::{completion, CompletionReceiver, CompletionSignal};
pub use keys::KeyPaths;
pub use receive::{ApprovalKind, ApprovalReceiver};

use crate::{broadcaster::TxBroadcaster, querier::ChainQuerier};

/// Everything a protocol handler needs.
pub struct OracleContext {
    /// The enclave this node runs in
    pub enclave: Arc<dyn Enclave>,
    /// Identity of this binary
    pub enclave_info: EnclaveInfo,
    /// Account signing transactions
    pub account: Arc<OracleAccount>,
    /// Proven chain state
    pub querier: Arc<ChainQuerier>,
    /// Light client
    pub headers: Arc<dyn TrustedHeaders>,
    /// Transaction submission
    pub broadcaster: Arc<dyn TxBroadcaster>,
    /// Requirements on peer reports
    pub report_policy: ReportPolicy,
    /// Sealed key files
    pub key_paths: KeyPaths,
}
