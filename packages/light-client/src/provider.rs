//! Sources of untrusted light blocks.

use async_trait::async_trait;
use tendermint::{block::Height, validator};
use tendermint_light_client_verifier::types::{LightBlock, PeerId};
use tendermint_rpc::{Client, HttpClient, Paging};

use crate::LightClientError;

/// Fetches light blocks from a full node. Nothing it returns is trusted.
#[async_trait]
pub trait LightBlockProvider: Send + Sync {
    /// Name used in logs and errors.
    fn id(&self) -> &str;

    /// Light block at `height`, or the latest one if `None`.
    ///
    /// # Errors
    /// [`LightClientError::HeightTooHigh`] and
    /// [`LightClientError::LightBlockNotFound`] when the block is not
    /// available (yet), [`LightClientError::Rpc`] on transport failure.
    async fn light_block(&self, height: Option<u64>) -> Result<LightBlock, LightClientError>;
}

/// [`LightBlockProvider`] over the Tendermint RPC.
#[derive(Clone, Debug)]
pub struct RpcProvider {
    addr: String,
    client: HttpClient,
    peer_id: PeerId,
}

impl RpcProvider {
    /// Connects to `addr` and records the node id of the full node.
    ///
    /// # Errors
    /// Returns [`LightClientError::Rpc`] if the address is invalid or the node
    /// is unreachable.
    pub async fn connect(addr: &str) -> Result<Self, LightClientError> {
        let client = HttpClient::new(addr).map_err(|e| LightClientError::Rpc {
            provider: addr.to_string(),
            reason: e.to_string(),
        })?;
        let peer_id = client
            .status()
            .await
            .map_err(|e| LightClientError::Rpc {
                provider: addr.to_string(),
                reason: e.to_string(),
            })?
            .node_info
            .id;

        Ok(Self {
            addr: addr.to_string(),
            client,
            peer_id,
        })
    }

    async fn validators(
        &self,
        height: Height,
    ) -> Result<Vec<validator::Info>, LightClientError> {
        self.client
            .validators(height, Paging::All)
            .await
            .map(|r| r.validators)
            .map_err(|e| classify(&self.addr, height.value(), &e.to_string()))
    }
}

#[async_trait]
impl LightBlockProvider for RpcProvider {
    fn id(&self) -> &str {
        &self.addr
    }

    #[tracing::instrument(skip(self), fields(provider = %self.addr))]
    async fn light_block(&self, height: Option<u64>) -> Result<LightBlock, LightClientError> {
        let commit = match height {
            Some(h) => {
                let height = Height::try_from(h).map_err(|e| LightClientError::Rpc {
                    provider: self.addr.clone(),
                    reason: e.to_string(),
                })?;
                self.client.commit(height).await
            }
            None => self.client.latest_commit().await,
        }
        .map_err(|e| classify(&self.addr, height.unwrap_or_default(), &e.to_string()))?;

        let signed_header = commit.signed_header;
        let height = signed_header.header.height;
        let validators = validator::Set::with_proposer(
            self.validators(height).await?,
            signed_header.header.proposer_address,
        )
        .map_err(|e| LightClientError::Rpc {
            provider: self.addr.clone(),
            reason: format!("invalid validator set: {e}"),
        })?;
        let next_validators =
            validator::Set::without_proposer(self.validators(height.increment()).await?);

        Ok(LightBlock::new(
            signed_header,
            validators,
            next_validators,
            self.peer_id,
        ))
    }
}

/// Maps a provider error message onto the transient kinds callers retry on.
#[must_use]
pub fn classify(provider: &str, height: u64, message: &str) -> LightClientError {
    if message.contains("must be less than or equal to the current blockchain height") {
        LightClientError::HeightTooHigh { height }
    } else if message.contains("could not find") || message.contains("not found") {
        LightClientError::LightBlockNotFound { height }
    } else {
        LightClientError::Rpc {
            provider: provider.to_string(),
            reason: message.to_string(),
        }
    }
}
