//! Common test utilities and fixtures

#![allow(dead_code)]

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use oracle_light_client::{
    LightBlock, LightBlockProvider, LightClientConfig, LightClientError, MemoryTrustedStore,
    Time, TrustManager, TrustedBlockInfo, TrustedStore,
};
use tendermint::AppHash;
use tendermint_testgen::{
    light_block::LightBlock as TestgenLightBlock, Generator, Header, Validator,
};

/// Generates `len` linked, signed light blocks starting at height 1.
pub fn generate_chain(len: u64) -> Vec<LightBlock> {
    let mut block = TestgenLightBlock::new_default(1);
    let mut chain = Vec::new();
    for _ in 0..len {
        chain.push(to_light_block(&block));
        block = block.next();
    }
    chain
}

/// Generates `len` linked, signed light blocks starting at height 1 where
/// validators `1` and `2` hand over to the disjoint set `3` and `4` after
/// height `handover`.
pub fn generate_rotating_chain(len: u64, handover: u64) -> Vec<LightBlock> {
    let old = [
        Validator::new("1").voting_power(50),
        Validator::new("2").voting_power(50),
    ];
    let new = [
        Validator::new("3").voting_power(50),
        Validator::new("4").voting_power(50),
    ];
    let set_at = |height: u64| if height <= handover { &old } else { &new };

    let mut chain: Vec<LightBlock> = Vec::new();
    for height in 1..=len {
        let mut header = Header::new(set_at(height))
            .next_validators(set_at(height + 1))
            .height(height)
            .chain_id("test-chain")
            .time(Time::from_unix_timestamp(i64::try_from(height).unwrap(), 0).unwrap());
        if let Some(prev) = chain.last() {
            header = header.last_block_id_hash(prev.signed_header.header.hash());
        }
        let block = TestgenLightBlock::new_default_with_header(header)
            .validators(set_at(height))
            .next_validators(set_at(height + 1));
        chain.push(to_light_block(&block));
    }
    chain
}

fn to_light_block(block: &TestgenLightBlock) -> LightBlock {
    let tm = block.generate().expect("testgen light block");
    LightBlock::new(tm.signed_header, tm.validators, tm.next_validators, tm.provider)
}

/// Returns a copy of `block` whose header no longer matches its commit.
pub fn forge(block: &LightBlock) -> LightBlock {
    let mut forged = block.clone();
    forged.signed_header.header.app_hash = AppHash::try_from(vec![0xee; 32]).unwrap();
    forged
}

/// A time shortly after `block` was produced.
pub fn time_after(block: &LightBlock) -> Time {
    Time::from_unix_timestamp(block.time().unix_timestamp() + 60, 0).unwrap()
}

/// Trust inputs pointing at `block`.
pub fn trust_info(block: &LightBlock) -> TrustedBlockInfo {
    TrustedBlockInfo::new(
        i64::try_from(block.height().value()).unwrap(),
        block.signed_header.header.hash().as_bytes().to_vec(),
    )
    .unwrap()
}

/// In-memory provider serving a fixed chain up to a movable tip.
pub struct MockProvider {
    id: String,
    blocks: BTreeMap<u64, LightBlock>,
    tip: AtomicU64,
    calls: AtomicUsize,
    requested: Mutex<Vec<Option<u64>>>,
}

impl MockProvider {
    pub fn new(id: &str, blocks: &[LightBlock]) -> Self {
        let blocks: BTreeMap<_, _> = blocks
            .iter()
            .map(|b| (b.height().value(), b.clone()))
            .collect();
        let tip = blocks.keys().next_back().copied().unwrap_or_default();
        Self {
            id: id.to_string(),
            blocks,
            tip: AtomicU64::new(tip),
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Pretends the chain has only reached `tip`.
    pub fn with_tip(self, tip: u64) -> Self {
        self.tip.store(tip, Ordering::SeqCst);
        self
    }

    pub fn set_tip(&self, tip: u64) {
        self.tip.store(tip, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Heights asked for so far, `None` for the latest block.
    pub fn requested(&self) -> Vec<Option<u64>> {
        self.requested.lock().unwrap().clone()
    }

    /// Serves `block` in place of the block at its height.
    pub fn replace(&mut self, block: LightBlock) {
        self.blocks.insert(block.height().value(), block);
    }
}

#[async_trait]
impl LightBlockProvider for MockProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn light_block(&self, height: Option<u64>) -> Result<LightBlock, LightClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(height);
        let tip = self.tip.load(Ordering::SeqCst);
        let height = height.unwrap_or(tip);
        if height > tip {
            return Err(LightClientError::HeightTooHigh { height });
        }
        self.blocks
            .get(&height)
            .cloned()
            .ok_or(LightClientError::LightBlockNotFound { height })
    }
}

/// Test context: a chain, its primary and a trust manager bootstrapped at
/// `trusted_height`.
pub struct TestContext {
    pub chain: Vec<LightBlock>,
    pub primary: Arc<MockProvider>,
    pub store: Arc<MemoryTrustedStore>,
    pub manager: TrustManager,
    pub now: Time,
}

pub async fn setup_test_context(
    len: u64,
    trusted_height: u64,
    witnesses: Vec<Arc<dyn LightBlockProvider>>,
) -> TestContext {
    let chain = generate_chain(len);
    let primary = Arc::new(MockProvider::new("primary", &chain));
    let store = Arc::new(MemoryTrustedStore::new());
    let now = time_after(chain.last().unwrap());
    let trusted = &chain[usize::try_from(trusted_height - 1).unwrap()];

    let manager = TrustManager::bootstrap(
        LightClientConfig::default(),
        primary.clone(),
        witnesses,
        store.clone() as Arc<dyn TrustedStore>,
        Some(trust_info(trusted)),
        now,
    )
    .await
    .expect("bootstrap");

    TestContext {
        chain,
        primary,
        store,
        manager,
        now,
    }
}
