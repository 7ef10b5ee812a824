//! Receiving the oracle key once an approved oracle has shared it.

use std::sync::Arc;

use async_trait::async_trait;
use oracle_crypto::{aes, derive_shared_key, PrivateKey, PublicKey};
use oracle_types::events::{approve_registration_query, approve_upgrade_query};
use tracing::{info, instrument};
use zeroize::Zeroizing;

use super::{keys::unseal_key, CompletionSignal, OracleContext};
use crate::{dispatcher::EventHandler, events::ChainEvent, OracleError};

/// Which approval the node is waiting for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApprovalKind {
    /// Approval of a first registration
    Registration,
    /// Approval of an upgrade to a new binary
    Upgrade,
}

impl ApprovalKind {
    const fn name(self) -> &'static str {
        match self {
            Self::Registration => "receive-registration-approval",
            Self::Upgrade => "receive-upgrade-approval",
        }
    }
}

/// Waits for the approval of this node and stores the shared oracle key.
pub struct ApprovalReceiver {
    ctx: Arc<OracleContext>,
    kind: ApprovalKind,
    completion: CompletionSignal,
}

impl ApprovalReceiver {
    /// Creates a receiver reporting to `completion`.
    #[must_use]
    pub const fn new(ctx: Arc<OracleContext>, kind: ApprovalKind, completion: CompletionSignal) -> Self {
        Self {
            ctx,
            kind,
            completion,
        }
    }

    /// Unwraps the oracle key shared with this node and seals it.
    ///
    /// # Errors
    /// [`OracleError::OracleKeyExists`] if the key is already sealed,
    /// [`OracleError::NodeKeyMissing`] without a sealed node key,
    /// [`OracleError::OracleKeyMismatch`] if the unwrapped key is not the
    /// oracle key of the chain, or query, decryption and sealing failures.
    #[instrument(skip(self), fields(kind = ?self.kind), err(Display))]
    pub async fn retrieve_oracle_key(&self) -> Result<PublicKey, OracleError> {
        let ctx = &self.ctx;
        let paths = &ctx.key_paths;
        if paths.oracle_priv_key.exists() {
            return Err(OracleError::OracleKeyExists);
        }
        if !paths.node_priv_key.exists() {
            return Err(OracleError::NodeKeyMissing);
        }
        let node_key = unseal_key(ctx.enclave.as_ref(), &paths.node_priv_key)?;

        let unique_id = ctx.enclave_info.unique_id_hex();
        let address = ctx.account.address();
        let encrypted = match self.kind {
            ApprovalKind::Registration => {
                ctx.querier
                    .oracle_registration(&unique_id, address)
                    .await?
                    .encrypted_oracle_priv_key
            }
            ApprovalKind::Upgrade => {
                ctx.querier
                    .oracle_upgrade(&unique_id, address)
                    .await?
                    .encrypted_oracle_priv_key
            }
        };

        let params = ctx.querier.params().await?;
        let oracle_public_key = PublicKey::from_bytes(&params.oracle_public_key)?;
        let shared_key = derive_shared_key(&node_key, &oracle_public_key);
        let plaintext = Zeroizing::new(aes::decrypt(&*shared_key, &encrypted)?);
        let oracle_key = PrivateKey::from_bytes(&plaintext)?;

        if oracle_key.public_key() != oracle_public_key {
            return Err(OracleError::OracleKeyMismatch);
        }

        ctx.enclave
            .seal_to_file(&oracle_key.to_bytes(), &paths.oracle_priv_key)?;
        info!(path = %paths.oracle_priv_key.display(), "oracle key received and sealed");
        Ok(oracle_public_key)
    }
}

#[async_trait]
impl EventHandler for ApprovalReceiver {
    fn name(&self) -> &'static str {
        self.kind.name()
    }

    fn query(&self) -> String {
        let unique_id = self.ctx.enclave_info.unique_id_hex();
        let address = self.ctx.account.address();
        match self.kind {
            ApprovalKind::Registration => approve_registration_query(&unique_id, address),
            ApprovalKind::Upgrade => approve_upgrade_query(&unique_id, address),
        }
    }

    async fn handle(&self, _event: ChainEvent) -> Result<(), OracleError> {
        let result = self.retrieve_oracle_key().await.map(|_| ());
        self.completion.complete(result);
        Ok(())
    }
}
