//! Raw ABCI queries.

use async_trait::async_trait;
use tendermint::{block::Height, merkle::proof::ProofOps};
use tendermint_rpc::{Client, HttpClient};

use crate::QueryError;

/// An unverified ABCI query response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AbciResponse {
    /// Application response code, zero on success
    pub code: u32,
    /// Raw log
    pub log: String,
    /// Key echoed by the application
    pub key: Vec<u8>,
    /// Stored value
    pub value: Vec<u8>,
    /// Height the query was answered at
    pub height: i64,
    /// Merkle proof when `prove` was requested
    pub proof_ops: Option<ProofOps>,
}

/// Endpoint answering ABCI queries. Nothing it returns is trusted.
#[async_trait]
pub trait AbciClient: Send + Sync {
    /// Queries `path` with `data` at `height`.
    ///
    /// # Errors
    /// Transport and decoding errors only. Application errors come back in
    /// [`AbciResponse::code`].
    async fn query(
        &self,
        path: String,
        data: Vec<u8>,
        height: u64,
        prove: bool,
    ) -> Result<AbciResponse, QueryError>;
}

#[async_trait]
impl AbciClient for HttpClient {
    async fn query(
        &self,
        path: String,
        data: Vec<u8>,
        height: u64,
        prove: bool,
    ) -> Result<AbciResponse, QueryError> {
        let height = Height::try_from(height).map_err(|e| QueryError::Rpc(e.to_string()))?;
        let response = Client::abci_query(self, Some(path), data, Some(height), prove)
            .await
            .map_err(|e| QueryError::Rpc(e.to_string()))?;

        Ok(AbciResponse {
            code: response.code.value(),
            log: response.log,
            key: response.key,
            value: response.value,
            height: i64::try_from(response.height.value())
                .map_err(|e| QueryError::Rpc(e.to_string()))?,
            proof_ops: response.proof,
        })
    }
}
