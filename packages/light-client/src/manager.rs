//! The trust manager: one trusted light block, advanced under a lock.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use tendermint_light_client_verifier::{
    options::Options,
    types::{LightBlock, Time, TrustThreshold},
    ProdVerifier, Verdict, Verifier,
};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::{
    LightBlockProvider, LightClientError, TrustedBlockInfo, TrustedHeaders, TrustedStore,
};

/// Two years, the trusting period used for oracle trust roots.
pub const DEFAULT_TRUSTING_PERIOD: Duration = Duration::from_secs(2 * 365 * 24 * 60 * 60);

/// Verification parameters.
#[derive(Clone, Debug)]
pub struct LightClientConfig {
    /// Fraction of the trusted validator power that must sign a skipped header
    pub trust_threshold: TrustThreshold,
    /// How long a verified header remains usable as a trust root
    pub trusting_period: Duration,
    /// Tolerated clock skew between this node and the chain
    pub clock_drift: Duration,
    /// Number of verified light blocks kept for repeated queries
    pub max_cached_blocks: usize,
}

impl Default for LightClientConfig {
    fn default() -> Self {
        Self {
            trust_threshold: TrustThreshold::ONE_THIRD,
            trusting_period: DEFAULT_TRUSTING_PERIOD,
            clock_drift: Duration::from_secs(10),
            max_cached_blocks: 1024,
        }
    }
}

impl LightClientConfig {
    fn options(&self) -> Options {
        Options {
            trust_threshold: self.trust_threshold,
            trusting_period: self.trusting_period,
            clock_drift: self.clock_drift,
        }
    }
}

struct State {
    latest: LightBlock,
    verified: BTreeMap<u64, LightBlock>,
}

/// Serializes all light client verification behind one async mutex.
///
/// The primary provider supplies the headers that get verified; every newly
/// trusted tip is cross-checked against the witnesses before it is accepted.
pub struct TrustManager {
    state: Mutex<State>,
    primary: Arc<dyn LightBlockProvider>,
    witnesses: Vec<Arc<dyn LightBlockProvider>>,
    store: Arc<dyn TrustedStore>,
    config: LightClientConfig,
    verifier: ProdVerifier,
}

impl std::fmt::Debug for TrustManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustManager")
            .field("primary", &self.primary.id())
            .field("witnesses", &self.witnesses.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TrustManager {
    /// Establishes the trust root.
    ///
    /// With `trust` the block at the given height is fetched from the primary
    /// and accepted only if its header hashes to the given hash; the store is
    /// then overwritten. Without it, the latest block in `store` is reused.
    ///
    /// # Errors
    /// Fails on a hash mismatch, an inconsistent block, a commit without +2/3
    /// valid signatures from the block's own validators, witness divergence,
    /// an empty store without trust options, or provider errors.
    #[instrument(skip_all, fields(primary = primary.id()))]
    pub async fn bootstrap(
        config: LightClientConfig,
        primary: Arc<dyn LightBlockProvider>,
        witnesses: Vec<Arc<dyn LightBlockProvider>>,
        store: Arc<dyn TrustedStore>,
        trust: Option<TrustedBlockInfo>,
        now: Time,
    ) -> Result<Self, LightClientError> {
        let verifier = ProdVerifier::default();
        let root = if let Some(info) = trust {
            let block = primary.light_block(Some(info.height)).await?;
            check_hash(&block, &info)?;
            verify_root_commit(&verifier, &block)?;
            cross_check(&witnesses, &block).await?;
            store.save(&block)?;
            info!(height = info.height, hash = %info.hash_hex(), "trust root set from trust options");
            block
        } else {
            let block = store.latest()?.ok_or(LightClientError::NoTrustedState)?;
            info!(height = %block.height(), "trust root loaded from store");
            block
        };

        if is_expired(&root, config.trusting_period, now) {
            warn!(height = %root.height(), "trust root is outside the trusting period");
        }

        let mut verified = BTreeMap::new();
        verified.insert(root.height().value(), root.clone());

        Ok(Self {
            state: Mutex::new(State {
                latest: root,
                verified,
            }),
            primary,
            witnesses,
            store,
            config,
            verifier,
        })
    }

    /// Verification parameters in use.
    #[must_use]
    pub const fn config(&self) -> &LightClientConfig {
        &self.config
    }

    /// Skipping verification from `trusted` to `target`, bisecting on
    /// insufficient overlap. Returns every block verified on the way, ending
    /// with `target`.
    async fn verify_forward(
        &self,
        trusted: &LightBlock,
        target: LightBlock,
        now: Time,
    ) -> Result<Vec<LightBlock>, LightClientError> {
        let options = self.config.options();
        let mut trusted = trusted.clone();
        let mut pending = vec![target];
        let mut verified = Vec::new();

        while let Some(candidate) = pending.last() {
            let candidate_height = candidate.height().value();
            let verdict = self.verifier.verify_update_header(
                candidate.as_untrusted_state(),
                trusted.as_trusted_state(),
                &options,
                now,
            );

            match verdict {
                Verdict::Success => {
                    if let Some(block) = pending.pop() {
                        debug!(height = candidate_height, "verified light block");
                        verified.push(block.clone());
                        trusted = block;
                    }
                }
                Verdict::NotEnoughTrust(tally) => {
                    let trusted_height = trusted.height().value();
                    let pivot = bisect_pivot(trusted_height, candidate_height).ok_or_else(|| {
                        LightClientError::verification(
                            candidate_height,
                            format!("not enough trust from adjacent height {trusted_height}: {tally:?}"),
                        )
                    })?;
                    debug!(
                        trusted = trusted_height,
                        target = candidate_height,
                        pivot,
                        "not enough trust, bisecting"
                    );
                    let block = self.primary.light_block(Some(pivot)).await?;
                    if block.height().value() != pivot {
                        return Err(LightClientError::verification(
                            pivot,
                            format!("primary returned height {}", block.height()),
                        ));
                    }
                    pending.push(block);
                }
                Verdict::Invalid(detail) => {
                    return Err(LightClientError::verification(
                        candidate_height,
                        detail.to_string(),
                    ));
                }
            }
        }

        Ok(verified)
    }

    /// Walks the hash chain down from `anchor` to `target`.
    async fn verify_backward(
        &self,
        anchor: &LightBlock,
        target: u64,
    ) -> Result<Vec<LightBlock>, LightClientError> {
        let mut current = anchor.clone();
        let mut verified = Vec::new();

        while current.height().value() > target {
            let height = current.height().value() - 1;
            let expected = current
                .signed_header
                .header
                .last_block_id
                .as_ref()
                .map(|id| id.hash)
                .ok_or_else(|| {
                    LightClientError::verification(
                        current.height().value(),
                        "header has no last block id",
                    )
                })?;

            let block = self.primary.light_block(Some(height)).await?;
            let actual = block.signed_header.header.hash();
            if actual != expected {
                return Err(LightClientError::verification(
                    height,
                    format!("header hash {actual} does not match last block id {expected}"),
                ));
            }
            validate_block(&block)?;

            verified.push(block.clone());
            current = block;
        }

        Ok(verified)
    }

    /// Records newly verified blocks, persisting a new tip.
    fn commit(&self, state: &mut State, blocks: Vec<LightBlock>) -> Result<(), LightClientError> {
        for block in blocks {
            if block.height() > state.latest.height() {
                self.store.save(&block)?;
                state.latest = block.clone();
            }
            state.verified.insert(block.height().value(), block);
        }

        let latest = state.latest.height().value();
        while state.verified.len() > self.config.max_cached_blocks.max(1) {
            match state.verified.keys().next().copied() {
                Some(lowest) if lowest != latest => {
                    state.verified.remove(&lowest);
                }
                _ => break,
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TrustedHeaders for TrustManager {
    #[instrument(skip(self, now))]
    async fn update(&self, now: Time) -> Result<Option<LightBlock>, LightClientError> {
        let mut state = self.state.lock().await;

        let target = self.primary.light_block(None).await?;
        if target.height() <= state.latest.height() {
            debug!(height = %state.latest.height(), "light client is up to date");
            return Ok(None);
        }

        let blocks = self.verify_forward(&state.latest, target, now).await?;
        let Some(tip) = blocks.last().cloned() else {
            return Ok(None);
        };
        cross_check(&self.witnesses, &tip).await?;
        self.commit(&mut state, blocks)?;

        info!(height = %tip.height(), "light client updated");
        Ok(Some(tip))
    }

    #[instrument(skip(self, now))]
    async fn verify_at_height(&self, height: u64, now: Time) -> Result<LightBlock, LightClientError> {
        let mut state = self.state.lock().await;

        if let Some(block) = state.verified.get(&height) {
            return Ok(block.clone());
        }

        let blocks = if height > state.latest.height().value() {
            let target = self.primary.light_block(Some(height)).await?;
            let blocks = self.verify_forward(&state.latest, target, now).await?;
            if let Some(tip) = blocks.last() {
                cross_check(&self.witnesses, tip).await?;
            }
            blocks
        } else {
            let anchor = state
                .verified
                .range(height..)
                .next()
                .map_or_else(|| state.latest.clone(), |(_, b)| b.clone());
            self.verify_backward(&anchor, height).await?
        };

        let block = blocks
            .iter()
            .find(|b| b.height().value() == height)
            .cloned()
            .ok_or(LightClientError::LightBlockNotFound { height })?;
        self.commit(&mut state, blocks)?;

        debug!(height, "verified light block at height");
        Ok(block)
    }

    async fn latest_trusted(&self) -> LightBlock {
        self.state.lock().await.latest.clone()
    }
}

fn check_hash(block: &LightBlock, info: &TrustedBlockInfo) -> Result<(), LightClientError> {
    let actual = block.signed_header.header.hash();
    if block.height().value() != info.height || actual.as_bytes() != info.hash.as_slice() {
        return Err(LightClientError::TrustedHashMismatch {
            height: info.height,
            expected: info.hash_hex(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

/// Checks that the validator sets and commit of `block` belong to its header.
fn validate_block(block: &LightBlock) -> Result<(), LightClientError> {
    let header = &block.signed_header.header;
    let height = header.height.value();

    if block.validators.hash() != header.validators_hash {
        return Err(LightClientError::verification(
            height,
            "validator set does not match the header",
        ));
    }
    if block.next_validators.hash() != header.next_validators_hash {
        return Err(LightClientError::verification(
            height,
            "next validator set does not match the header",
        ));
    }
    if block.signed_header.commit.block_id.hash != header.hash() {
        return Err(LightClientError::verification(
            height,
            "commit is for another block",
        ));
    }
    Ok(())
}

/// Checks a trust root against itself: validator sets and commit belong to
/// the header, and more than 2/3 of its validators signed it.
fn verify_root_commit(verifier: &ProdVerifier, block: &LightBlock) -> Result<(), LightClientError> {
    let height = block.height().value();
    let untrusted = block.as_untrusted_state();

    for verdict in [
        verifier.verify_validator_sets(&untrusted),
        verifier.verify_commit(&untrusted),
    ] {
        match verdict {
            Verdict::Success => {}
            Verdict::NotEnoughTrust(tally) => {
                return Err(LightClientError::verification(
                    height,
                    format!("trust root commit lacks +2/3 signatures: {tally:?}"),
                ));
            }
            Verdict::Invalid(detail) => {
                return Err(LightClientError::verification(height, detail.to_string()));
            }
        }
    }
    Ok(())
}

/// Compares the header of `block` with every witness.
///
/// A witness that has not reached the height yet is skipped; any other
/// witness error, or a different header, fails the check.
async fn cross_check(
    witnesses: &[Arc<dyn LightBlockProvider>],
    block: &LightBlock,
) -> Result<(), LightClientError> {
    let height = block.height().value();
    let primary_hash = block.signed_header.header.hash();

    for witness in witnesses {
        match witness.light_block(Some(height)).await {
            Ok(other) => {
                let witness_hash = other.signed_header.header.hash();
                if witness_hash != primary_hash {
                    return Err(LightClientError::WitnessDivergence {
                        witness: witness.id().to_string(),
                        height,
                        primary_hash: primary_hash.to_string(),
                        witness_hash: witness_hash.to_string(),
                    });
                }
            }
            Err(e) if e.is_transient() => {
                warn!(witness = witness.id(), height, error = %e, "witness cannot serve height, skipping");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Whether `block` is older than the trusting period at `now`.
pub(crate) fn is_expired(block: &LightBlock, trusting_period: Duration, now: Time) -> bool {
    now.duration_since(block.time())
        .is_ok_and(|age| age > trusting_period)
}

/// Midpoint between a trusted and a target height, if one exists strictly
/// between them.
fn bisect_pivot(trusted: u64, target: u64) -> Option<u64> {
    let pivot = trusted + target.saturating_sub(trusted) / 2;
    (pivot > trusted && pivot < target).then_some(pivot)
}
