//! Typed, proof-verified reads of chain state.

use std::sync::Arc;

use async_trait::async_trait;
use cosmos_sdk_proto::{cosmos::auth::v1beta1::BaseAccount, Any};
use oracle_crypto::account::address_bytes;
use oracle_query::{QueryError, VerifiedQueryClient};
use oracle_types::{
    decode, keys, Oracle, OracleRegistration, OracleUpgrade, OracleUpgradeInfo, Params,
    TypesError,
};
use prost::Message;

use crate::OracleError;

/// Type url of accounts in the auth store.
pub const BASE_ACCOUNT_TYPE_URL: &str = "/cosmos.auth.v1beta1.BaseAccount";

/// Source of proven store values.
#[async_trait]
pub trait StateQuerier: Send + Sync {
    /// Returns the value of `key` in store `store_key`, proven against a
    /// trusted app hash.
    async fn get_store_data(&self, store_key: &str, key: &[u8]) -> Result<Vec<u8>, QueryError>;
}

#[async_trait]
impl StateQuerier for VerifiedQueryClient {
    async fn get_store_data(&self, store_key: &str, key: &[u8]) -> Result<Vec<u8>, QueryError> {
        Self::get_store_data(self, store_key, key).await
    }
}

/// Reads oracle module and auth records.
pub struct ChainQuerier {
    state: Arc<dyn StateQuerier>,
    bech32_prefix: String,
}

impl ChainQuerier {
    /// Creates a querier decoding bech32 addresses with `bech32_prefix`.
    #[must_use]
    pub fn new(state: Arc<dyn StateQuerier>, bech32_prefix: impl Into<String>) -> Self {
        Self {
            state,
            bech32_prefix: bech32_prefix.into(),
        }
    }

    /// The auth account at `address`, for its number and sequence.
    ///
    /// # Errors
    /// Query errors, or a record that is not a base account.
    pub async fn account(&self, address: &str) -> Result<BaseAccount, OracleError> {
        let key = keys::account_key(&self.address_bytes(address)?);
        let any: Any = decode(&self.state.get_store_data(keys::AUTH_STORE_KEY, &key).await?)?;
        if any.type_url != BASE_ACCOUNT_TYPE_URL {
            return Err(TypesError::UnexpectedTypeUrl {
                expected: BASE_ACCOUNT_TYPE_URL,
                actual: any.type_url,
            }
            .into());
        }
        BaseAccount::decode(any.value.as_slice()).map_err(|e| {
            TypesError::Decode {
                type_name: "BaseAccount",
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// The approved oracle operated from `address`.
    ///
    /// # Errors
    /// Query errors, including an absent record.
    pub async fn oracle(&self, address: &str) -> Result<Oracle, OracleError> {
        let key = keys::oracle_key(&self.address_bytes(address)?);
        self.get(&key).await
    }

    /// The registration of `unique_id` by `address`.
    ///
    /// # Errors
    /// Query errors, including an absent record.
    pub async fn oracle_registration(
        &self,
        unique_id: &str,
        address: &str,
    ) -> Result<OracleRegistration, OracleError> {
        let key = keys::oracle_registration_key(unique_id, &self.address_bytes(address)?);
        self.get(&key).await
    }

    /// The binary upgrades may move to.
    ///
    /// # Errors
    /// Query errors, including the absence of a scheduled upgrade.
    pub async fn oracle_upgrade_info(&self) -> Result<OracleUpgradeInfo, OracleError> {
        self.get(&keys::oracle_upgrade_info_key()).await
    }

    /// The upgrade of `address` to `unique_id`.
    ///
    /// # Errors
    /// Query errors, including an absent record.
    pub async fn oracle_upgrade(
        &self,
        unique_id: &str,
        address: &str,
    ) -> Result<OracleUpgrade, OracleError> {
        let key = keys::oracle_upgrade_key(unique_id, &self.address_bytes(address)?);
        self.get(&key).await
    }

    /// The oracle module parameters.
    ///
    /// # Errors
    /// Query errors.
    pub async fn params(&self) -> Result<Params, OracleError> {
        self.get(&keys::params_key()).await
    }

    async fn get<T: Message + Default>(&self, key: &[u8]) -> Result<T, OracleError> {
        let bytes = self.state.get_store_data(keys::STORE_KEY, key).await?;
        Ok(decode(&bytes)?)
    }

    fn address_bytes(&self, address: &str) -> Result<Vec<u8>, OracleError> {
        Ok(address_bytes(address, &self.bech32_prefix)?)
    }
}
