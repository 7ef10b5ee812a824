//! Signing and submitting transactions.

use std::sync::Arc;

use async_trait::async_trait;
use cosmos_sdk_proto::{
    cosmos::{
        base::v1beta1::Coin,
        crypto::secp256k1::PubKey,
        tx::{
            signing::v1beta1::SignMode,
            v1beta1::{mode_info, AuthInfo, Fee, ModeInfo, SignDoc, SignerInfo, TxBody, TxRaw},
        },
    },
    Any,
};
use oracle_crypto::OracleAccount;
use oracle_types::TypedMsg;
use prost::Message;
use tendermint_rpc::{Client, HttpClient};
use tracing::{info, instrument};

use crate::{querier::ChainQuerier, OracleError};

/// Type url of secp256k1 public keys in signer infos.
pub const SECP256K1_PUB_KEY_TYPE_URL: &str = "/cosmos.crypto.secp256k1.PubKey";

/// Outcome of a committed transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BroadcastResult {
    /// Height the transaction was included at
    pub height: i64,
    /// Hex hash of the transaction
    pub tx_hash: String,
}

/// Signs and submits transactions on behalf of the oracle account.
#[async_trait]
pub trait TxBroadcaster: Send + Sync {
    /// Submits `msgs` in one transaction and waits for it to be committed.
    ///
    /// # Errors
    /// [`OracleError::TxFailed`] if the chain rejects the transaction, or a
    /// transport or signing error.
    async fn broadcast(&self, msgs: Vec<Any>) -> Result<BroadcastResult, OracleError>;
}

/// Wraps a typed message into an `Any`.
#[must_use]
pub fn to_any<M: TypedMsg>(msg: &M) -> Any {
    let (type_url, value) = msg.to_any_parts();
    Any { type_url, value }
}

/// Fee attached to every transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeeConfig {
    /// Fee denomination
    pub denom: String,
    /// Fee amount
    pub amount: u64,
    /// Gas limit
    pub gas_limit: u64,
}

/// [`TxBroadcaster`] over Tendermint RPC with `SIGN_MODE_DIRECT`.
///
/// Account number and sequence are read from the verified auth store before
/// each transaction.
pub struct CosmosTxBroadcaster {
    rpc: HttpClient,
    querier: Arc<ChainQuerier>,
    account: Arc<OracleAccount>,
    chain_id: String,
    fee: FeeConfig,
}

impl CosmosTxBroadcaster {
    /// Creates a broadcaster signing with `account`.
    #[must_use]
    pub fn new(
        rpc: HttpClient,
        querier: Arc<ChainQuerier>,
        account: Arc<OracleAccount>,
        chain_id: impl Into<String>,
        fee: FeeConfig,
    ) -> Self {
        Self {
            rpc,
            querier,
            account,
            chain_id: chain_id.into(),
            fee,
        }
    }

    fn sign_tx(&self, msgs: Vec<Any>, account_number: u64, sequence: u64) -> TxRaw {
        let body_bytes = TxBody {
            messages: msgs,
            ..Default::default()
        }
        .encode_to_vec();

        let public_key = Any {
            type_url: SECP256K1_PUB_KEY_TYPE_URL.to_string(),
            value: PubKey {
                key: self.account.public_key().to_bytes(),
            }
            .encode_to_vec(),
        };
        let auth_info_bytes = AuthInfo {
            signer_infos: vec![SignerInfo {
                public_key: Some(public_key),
                mode_info: Some(ModeInfo {
                    sum: Some(mode_info::Sum::Single(mode_info::Single {
                        mode: SignMode::Direct.into(),
                    })),
                }),
                sequence,
            }],
            fee: Some(Fee {
                amount: vec![Coin {
                    denom: self.fee.denom.clone(),
                    amount: self.fee.amount.to_string(),
                }],
                gas_limit: self.fee.gas_limit,
                ..Default::default()
            }),
            ..Default::default()
        }
        .encode_to_vec();

        let sign_doc = SignDoc {
            body_bytes: body_bytes.clone(),
            auth_info_bytes: auth_info_bytes.clone(),
            chain_id: self.chain_id.clone(),
            account_number,
        };
        let signature = self.account.sign(&sign_doc.encode_to_vec());

        TxRaw {
            body_bytes,
            auth_info_bytes,
            signatures: vec![signature],
        }
    }
}

#[async_trait]
impl TxBroadcaster for CosmosTxBroadcaster {
    #[instrument(skip_all, fields(signer = self.account.address(), msgs = msgs.len()), err(Display))]
    async fn broadcast(&self, msgs: Vec<Any>) -> Result<BroadcastResult, OracleError> {
        let account = self.querier.account(self.account.address()).await?;
        let tx = self.sign_tx(msgs, account.account_number, account.sequence);

        let response = self
            .rpc
            .broadcast_tx_commit(tx.encode_to_vec())
            .await
            .map_err(|e| OracleError::Rpc(e.to_string()))?;

        for (code, log) in [
            (response.check_tx.code, &response.check_tx.log),
            (response.tx_result.code, &response.tx_result.log),
        ] {
            if code.is_err() {
                return Err(OracleError::TxFailed {
                    code: code.value(),
                    log: log.clone(),
                });
            }
        }

        let result = BroadcastResult {
            height: i64::try_from(response.height.value())
                .map_err(|e| OracleError::Rpc(e.to_string()))?,
            tx_hash: response.hash.to_string(),
        };
        info!(height = result.height, tx_hash = %result.tx_hash, "transaction committed");
        Ok(result)
    }
}
