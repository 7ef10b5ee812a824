//! The verified query client.

use std::{sync::Arc, time::Duration};

use oracle_light_client::{now, LightBlock, TrustedHeaders};
use tracing::{debug, instrument};

use crate::{proof::verify_store_proof, AbciClient, AbciResponse, QueryError};

/// Pause between attempts to verify the block after the queried height.
pub const NEXT_BLOCK_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Attempts to verify the block after the queried height before giving up.
pub const NEXT_BLOCK_ATTEMPTS: usize = 12;

/// Answers store queries with values proven against a trusted app hash.
///
/// Safe to share between tasks: the only shared state is the light client,
/// which serializes its own verification.
pub struct VerifiedQueryClient {
    abci: Arc<dyn AbciClient>,
    headers: Arc<dyn TrustedHeaders>,
    poll_interval: Duration,
    max_attempts: usize,
}

impl VerifiedQueryClient {
    /// Creates a client querying `abci` and trusting `headers`.
    #[must_use]
    pub fn new(abci: Arc<dyn AbciClient>, headers: Arc<dyn TrustedHeaders>) -> Self {
        Self {
            abci,
            headers,
            poll_interval: NEXT_BLOCK_POLL_INTERVAL,
            max_attempts: NEXT_BLOCK_ATTEMPTS,
        }
    }

    /// Overrides how the client waits for the block after the queried height.
    #[must_use]
    pub const fn with_next_block_polling(mut self, interval: Duration, attempts: usize) -> Self {
        self.poll_interval = interval;
        self.max_attempts = attempts;
        self
    }

    /// The light client backing this query client.
    #[must_use]
    pub fn headers(&self) -> &Arc<dyn TrustedHeaders> {
        &self.headers
    }

    /// Returns the value of `key` in store `store_key`, proven at the latest
    /// trusted height.
    ///
    /// # Errors
    /// Any light client failure, a malformed ABCI response, a proof that does
    /// not verify, or [`QueryError::CannotGetNextTrustedBlock`] when the block
    /// holding the app hash is not produced in time.
    #[instrument(skip(self, key), fields(key = %hex::encode(key)), err(Display))]
    pub async fn get_store_data(&self, store_key: &str, key: &[u8]) -> Result<Vec<u8>, QueryError> {
        let height = match self.headers.update(now()?).await? {
            Some(block) => block.height().value(),
            None => self.headers.latest_trusted().await.height().value(),
        };

        let response = self
            .abci
            .query(format!("/store/{store_key}/key"), key.to_vec(), height, true)
            .await?;
        let query_height = validate_response(&response, key)?;

        // the app hash committing to state at H lives in the header of H+1
        let next = self.next_trusted_block(query_height + 1).await?;
        let app_hash = next.signed_header.header.app_hash.as_bytes();

        let proof_ops = response.proof_ops.as_ref().ok_or(QueryError::ProofMissing)?;
        verify_store_proof(app_hash, store_key, key, &response.value, proof_ops)?;

        debug!(height = query_height, "store value verified");
        Ok(response.value)
    }

    async fn next_trusted_block(&self, height: u64) -> Result<LightBlock, QueryError> {
        for attempt in 1..=self.max_attempts {
            match self.headers.verify_at_height(height, now()?).await {
                Ok(block) => return Ok(block),
                Err(e) if e.is_transient() => {
                    debug!(height, attempt, error = %e, "next block not available yet");
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(QueryError::CannotGetNextTrustedBlock)
    }
}

/// Rejects responses that cannot carry a usable proof for `key`. Returns the
/// query height.
fn validate_response(response: &AbciResponse, key: &[u8]) -> Result<u64, QueryError> {
    if response.code != 0 {
        return Err(QueryError::AppError {
            code: response.code,
            log: response.log.clone(),
        });
    }
    if response.key.is_empty() {
        return Err(QueryError::EmptyKey);
    }
    if response.key != key {
        return Err(QueryError::KeyMismatch {
            requested: hex::encode(key),
            returned: hex::encode(&response.key),
        });
    }
    if response.value.is_empty() {
        return Err(QueryError::EmptyValue);
    }
    if response
        .proof_ops
        .as_ref()
        .is_none_or(|ops| ops.ops.is_empty())
    {
        return Err(QueryError::ProofMissing);
    }
    u64::try_from(response.height)
        .ok()
        .filter(|h| *h > 0)
        .ok_or(QueryError::NegativeOrZeroHeight)
}

#[cfg(test)]
mod tests {
    use tendermint::merkle::proof::{ProofOp, ProofOps};

    use super::*;

    fn response() -> AbciResponse {
        AbciResponse {
            code: 0,
            log: String::new(),
            key: b"key".to_vec(),
            value: b"value".to_vec(),
            height: 7,
            proof_ops: Some(ProofOps {
                ops: vec![ProofOp {
                    field_type: "ics23:iavl".to_string(),
                    key: b"key".to_vec(),
                    data: vec![1],
                }],
            }),
        }
    }

    #[test]
    fn accepts_complete_response() {
        assert_eq!(validate_response(&response(), b"key").unwrap(), 7);
    }

    #[test]
    fn rejects_app_error_first() {
        let resp = AbciResponse {
            code: 38,
            log: "not found".to_string(),
            key: vec![],
            ..response()
        };
        assert!(matches!(
            validate_response(&resp, b"key"),
            Err(QueryError::AppError { code: 38, .. })
        ));
    }

    #[test]
    fn rejects_each_missing_field() {
        let empty_key = AbciResponse { key: vec![], ..response() };
        assert!(matches!(validate_response(&empty_key, b"key"), Err(QueryError::EmptyKey)));

        let empty_value = AbciResponse { value: vec![], ..response() };
        assert!(matches!(validate_response(&empty_value, b"key"), Err(QueryError::EmptyValue)));

        let no_proof = AbciResponse { proof_ops: None, ..response() };
        assert!(matches!(validate_response(&no_proof, b"key"), Err(QueryError::ProofMissing)));

        let empty_proof = AbciResponse {
            proof_ops: Some(ProofOps { ops: vec![] }),
            ..response()
        };
        assert!(matches!(validate_response(&empty_proof, b"key"), Err(QueryError::ProofMissing)));

        assert!(matches!(
            validate_response(&response(), b"other"),
            Err(QueryError::KeyMismatch { .. })
        ));

        for height in [0, -3] {
            let resp = AbciResponse { height, ..response() };
            assert!(matches!(
                validate_response(&resp, b"key"),
                Err(QueryError::NegativeOrZeroHeight)
            ));
        }
    }
}
