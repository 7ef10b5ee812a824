//! Approving nodes that ask for the oracle key.
//!
//! Every check runs before anything is encrypted, signed or broadcast, so a
//! rejected request leaves no trace on chain.

use std::sync::Arc;

use async_trait::async_trait;
use oracle_crypto::{aes, derive_shared_key, PrivateKey, PublicKey};
use oracle_enclave::verify_remote_report;
use oracle_light_client::{now, verify_trusted_block, TrustedBlockInfo};
use oracle_types::{
    events::{
        register_oracle_query, upgrade_oracle_query, ATTRIBUTE_KEY_ORACLE_ADDRESS,
        ATTRIBUTE_KEY_UNIQUE_ID, EVENT_TYPE_REGISTER, EVENT_TYPE_UPGRADE,
    },
    ApprovalSharingOracleKey, MsgApproveOracleRegistration, MsgApproveOracleUpgrade,
};
use prost::Message;
use tracing::{info, instrument};

use super::{keys::public_key_report_data, OracleContext};
use crate::{
    broadcaster::{to_any, BroadcastResult},
    dispatcher::EventHandler,
    events::ChainEvent,
    OracleError,
};

/// What a node asking for the oracle key recorded on chain.
struct KeyRequest<'a> {
    unique_id: &'a str,
    oracle_address: &'a str,
    node_pub_key: &'a [u8],
    node_pub_key_remote_report: &'a [u8],
    trusted_block_height: i64,
    trusted_block_hash: &'a [u8],
}

struct Approver {
    ctx: Arc<OracleContext>,
    oracle_key: PrivateKey,
}

impl Approver {
    /// Verifies `request` and wraps the oracle key for its node key.
    async fn approve(
        &self,
        request: &KeyRequest<'_>,
    ) -> Result<(ApprovalSharingOracleKey, Vec<u8>), OracleError> {
        let ctx = &self.ctx;

        let trusted = TrustedBlockInfo::new(
            request.trusted_block_height,
            request.trusted_block_hash.to_vec(),
        )?;
        verify_trusted_block(ctx.headers.as_ref(), &trusted, now()?).await?;

        verify_remote_report(
            ctx.enclave.as_ref(),
            request.node_pub_key_remote_report,
            &public_key_report_data(request.node_pub_key),
            request.unique_id,
            &ctx.report_policy,
        )?;

        let node_pub_key = PublicKey::from_bytes(request.node_pub_key)?;
        let shared_key = derive_shared_key(&self.oracle_key, &node_pub_key);
        let encrypted_oracle_priv_key = aes::encrypt(&*shared_key, &self.oracle_key.to_bytes())?;

        let approval = ApprovalSharingOracleKey {
            approver_unique_id: ctx.enclave_info.unique_id_hex(),
            approver_oracle_address: ctx.account.address().to_string(),
            target_unique_id: request.unique_id.to_string(),
            target_oracle_address: request.oracle_address.to_string(),
            encrypted_oracle_priv_key,
        };
        let signature = self.oracle_key.sign(&approval.encode_to_vec());
        Ok((approval, signature))
    }
}

/// Shares the oracle key with nodes registering the same binary.
pub struct ApproveRegistrationHandler {
    approver: Approver,
}

impl ApproveRegistrationHandler {
    /// Creates a handler sharing `oracle_key`.
    #[must_use]
    pub const fn new(ctx: Arc<OracleContext>, oracle_key: PrivateKey) -> Self {
        Self {
            approver: Approver { ctx, oracle_key },
        }
    }

    /// Approves the registration of `unique_id` by `oracle_address`.
    ///
    /// # Errors
    /// [`OracleError::RequesterIdentityMismatch`] if the requester runs
    /// another binary, or any verification, encryption or broadcast failure.
    #[instrument(skip(self), err(Display))]
    pub async fn approve_registration(
        &self,
        unique_id: &str,
        oracle_address: &str,
    ) -> Result<BroadcastResult, OracleError> {
        let ctx = &self.approver.ctx;
        if !ctx.enclave_info.is_same_binary(unique_id) {
            return Err(OracleError::RequesterIdentityMismatch);
        }

        let registration = ctx
            .querier
            .oracle_registration(unique_id, oracle_address)
            .await?;
        let (approval, signature) = self
            .approver
            .approve(&KeyRequest {
                unique_id,
                oracle_address,
                node_pub_key: &registration.node_pub_key,
                node_pub_key_remote_report: &registration.node_pub_key_remote_report,
                trusted_block_height: registration.trusted_block_height,
                trusted_block_hash: &registration.trusted_block_hash,
            })
            .await?;

        let msg = MsgApproveOracleRegistration {
            approval_sharing_oracle_key: Some(approval),
            signature,
        };
        let result = ctx.broadcaster.broadcast(vec![to_any(&msg)]).await?;
        info!(tx_hash = %result.tx_hash, "oracle registration approved");
        Ok(result)
    }
}

#[async_trait]
impl EventHandler for ApproveRegistrationHandler {
    fn name(&self) -> &'static str {
        "approve-registration"
    }

    fn query(&self) -> String {
        register_oracle_query()
    }

    async fn handle(&self, event: ChainEvent) -> Result<(), OracleError> {
        let unique_id = event.require(EVENT_TYPE_REGISTER, ATTRIBUTE_KEY_UNIQUE_ID)?;
        let address = event.require(EVENT_TYPE_REGISTER, ATTRIBUTE_KEY_ORACLE_ADDRESS)?;
        self.approve_registration(unique_id, address).await?;
        Ok(())
    }
}

/// Shares the oracle key with registered oracles upgrading to the binary the
/// chain allows.
pub struct ApproveUpgradeHandler {
    approver: Approver,
}

impl ApproveUpgradeHandler {
    /// Creates a handler sharing `oracle_key`.
    #[must_use]
    pub const fn new(ctx: Arc<OracleContext>, oracle_key: PrivateKey) -> Self {
        Self {
            approver: Approver { ctx, oracle_key },
        }
    }

    /// Approves the upgrade of `oracle_address` to `unique_id`.
    ///
    /// # Errors
    /// [`OracleError::UpgradeIdentityMismatch`] if `unique_id` is not the
    /// scheduled upgrade, [`OracleError::NotRegistered`] for an unknown
    /// oracle, or any verification, encryption or broadcast failure.
    #[instrument(skip(self), err(Display))]
    pub async fn approve_upgrade(
        &self,
        unique_id: &str,
        oracle_address: &str,
    ) -> Result<BroadcastResult, OracleError> {
        let ctx = &self.approver.ctx;

        let upgrade_info = ctx.querier.oracle_upgrade_info().await?;
        if upgrade_info.unique_id != unique_id {
            return Err(OracleError::UpgradeIdentityMismatch {
                expected: upgrade_info.unique_id,
                actual: unique_id.to_string(),
            });
        }
        ctx.querier
            .oracle(oracle_address)
            .await
            .map_err(|e| OracleError::NotRegistered {
                address: oracle_address.to_string(),
                reason: e.to_string(),
            })?;

        let upgrade = ctx.querier.oracle_upgrade(unique_id, oracle_address).await?;
        let (approval, signature) = self
            .approver
            .approve(&KeyRequest {
                unique_id,
                oracle_address,
                node_pub_key: &upgrade.node_pub_key,
                node_pub_key_remote_report: &upgrade.node_pub_key_remote_report,
                trusted_block_height: upgrade.trusted_block_height,
                trusted_block_hash: &upgrade.trusted_block_hash,
            })
            .await?;

        let msg = MsgApproveOracleUpgrade {
            approval_sharing_oracle_key: Some(approval),
            signature,
        };
        let result = ctx.broadcaster.broadcast(vec![to_any(&msg)]).await?;
        info!(tx_hash = %result.tx_hash, "oracle upgrade approved");
        Ok(result)
    }
}

#[async_trait]
impl EventHandler for ApproveUpgradeHandler {
    fn name(&self) -> &'static str {
        "approve-upgrade"
    }

    fn query(&self) -> String {
        upgrade_oracle_query()
    }

    async fn handle(&self, event: ChainEvent) -> Result<(), OracleError> {
        let unique_id = event.require(EVENT_TYPE_UPGRADE, ATTRIBUTE_KEY_UNIQUE_ID)?;
        let address = event.require(EVENT_TYPE_UPGRADE, ATTRIBUTE_KEY_ORACLE_ADDRESS)?;
        self.approve_upgrade(unique_id, address).await?;
        Ok(())
    }
}
