//! Common test utilities and fixtures

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use cosmos_sdk_proto::Any;
use futures::{channel::mpsc, StreamExt};
use oracle_crypto::{account::address_bytes, OracleAccount};
use oracle_enclave::{Enclave, Measurement, PlatformKey, ReportPolicy, SimulatedEnclave};
use oracle_light_client::{LightBlock, LightClientError, Time, TrustedBlockInfo, TrustedHeaders};
use oracle_node::{
    broadcaster::{BroadcastResult, TxBroadcaster},
    events::{ChainEvent, EventSource, EventStream},
    protocol::{keys::load_or_generate_node_key, KeyPaths, OracleContext},
    querier::{ChainQuerier, StateQuerier},
    OracleError,
};
use oracle_query::QueryError;
use oracle_types::{keys, OracleRegistration, OracleUpgrade, OracleUpgradeInfo, Oracle, Params, TypedMsg};
use prost::Message;
use tempfile::TempDir;
use tendermint_testgen::{light_block::LightBlock as TestgenLightBlock, Generator};

pub const MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
pub const PREFIX: &str = "panacea";
pub const PRODUCT_ID: u16 = 1;
pub const BINARY_V1: &[u8] = b"oracled v1";
pub const BINARY_V2: &[u8] = b"oracled v2";

/// Enclave running `image` on the shared test platform.
pub fn enclave(image: &[u8]) -> SimulatedEnclave {
    enclave_on(b"test platform", image)
}

pub fn enclave_on(platform_seed: &[u8], image: &[u8]) -> SimulatedEnclave {
    SimulatedEnclave::new(
        PlatformKey::from_seed(platform_seed).unwrap(),
        Measurement::from_image(PRODUCT_ID, image, 1),
    )
}

pub fn unique_id(image: &[u8]) -> String {
    enclave(image)
        .generate_self_enclave_info()
        .unwrap()
        .unique_id_hex()
}

pub fn account(index: u32) -> OracleAccount {
    OracleAccount::from_mnemonic(MNEMONIC, 0, index, PREFIX).unwrap()
}

/// Generates `len` linked, signed light blocks starting at height 1.
pub fn generate_chain(len: u64) -> Vec<LightBlock> {
    let mut block = TestgenLightBlock::new_default(1);
    let mut chain = Vec::new();
    for _ in 0..len {
        let tm = block.generate().expect("testgen light block");
        chain.push(LightBlock::new(
            tm.signed_header,
            tm.validators,
            tm.next_validators,
            tm.provider,
        ));
        block = block.next();
    }
    chain
}

pub fn block_hash(block: &LightBlock) -> Vec<u8> {
    block.signed_header.header.hash().as_bytes().to_vec()
}

/// Headers served straight from a generated chain.
pub struct MockHeaders {
    chain: Vec<LightBlock>,
}

impl MockHeaders {
    pub fn new(len: u64) -> Self {
        Self {
            chain: generate_chain(len),
        }
    }

    pub fn block(&self, height: u64) -> &LightBlock {
        &self.chain[usize::try_from(height - 1).unwrap()]
    }

    pub fn trusted(&self, height: u64) -> TrustedBlockInfo {
        TrustedBlockInfo::new(i64::try_from(height).unwrap(), block_hash(self.block(height))).unwrap()
    }
}

#[async_trait]
impl TrustedHeaders for MockHeaders {
    async fn update(&self, _now: Time) -> Result<Option<LightBlock>, LightClientError> {
        Ok(None)
    }

    async fn verify_at_height(&self, height: u64, _now: Time) -> Result<LightBlock, LightClientError> {
        let index = usize::try_from(height).unwrap();
        match index.checked_sub(1).and_then(|i| self.chain.get(i)) {
            Some(block) => Ok(block.clone()),
            None => Err(LightClientError::HeightTooHigh { height }),
        }
    }

    async fn latest_trusted(&self) -> LightBlock {
        self.chain.last().unwrap().clone()
    }
}

/// Chain state shared by every node of a test.
#[derive(Default)]
pub struct MockState {
    values: Mutex<HashMap<(String, Vec<u8>), Vec<u8>>>,
}

impl MockState {
    pub fn put(&self, store_key: &str, key: Vec<u8>, value: &impl Message) {
        self.values
            .lock()
            .unwrap()
            .insert((store_key.to_string(), key), value.encode_to_vec());
    }

    pub fn put_params(&self, params: &Params) {
        self.put(keys::STORE_KEY, keys::params_key(), params);
    }

    pub fn put_oracle(&self, oracle: &Oracle) {
        let address = address_bytes(&oracle.oracle_address, PREFIX).unwrap();
        self.put(keys::STORE_KEY, keys::oracle_key(&address), oracle);
    }

    pub fn put_registration(&self, registration: &OracleRegistration) {
        let address = address_bytes(&registration.oracle_address, PREFIX).unwrap();
        self.put(
            keys::STORE_KEY,
            keys::oracle_registration_key(&registration.unique_id, &address),
            registration,
        );
    }

    pub fn put_upgrade_info(&self, info: &OracleUpgradeInfo) {
        self.put(keys::STORE_KEY, keys::oracle_upgrade_info_key(), info);
    }

    pub fn put_upgrade(&self, upgrade: &OracleUpgrade) {
        let address = address_bytes(&upgrade.oracle_address, PREFIX).unwrap();
        self.put(
            keys::STORE_KEY,
            keys::oracle_upgrade_key(&upgrade.unique_id, &address),
            upgrade,
        );
    }
}

#[async_trait]
impl StateQuerier for MockState {
    async fn get_store_data(&self, store_key: &str, key: &[u8]) -> Result<Vec<u8>, QueryError> {
        self.values
            .lock()
            .unwrap()
            .get(&(store_key.to_string(), key.to_vec()))
            .cloned()
            .ok_or(QueryError::EmptyValue)
    }
}

/// Records broadcast transactions instead of sending them.
#[derive(Default)]
pub struct MockBroadcaster {
    txs: Mutex<Vec<Vec<Any>>>,
}

impl MockBroadcaster {
    pub fn count(&self) -> usize {
        self.txs.lock().unwrap().len()
    }

    /// The only message broadcast so far, decoded as `M`.
    pub fn single<M: TypedMsg>(&self) -> M {
        let txs = self.txs.lock().unwrap();
        assert_eq!(txs.len(), 1, "expected one transaction");
        assert_eq!(txs[0].len(), 1, "expected one message");
        M::from_any_parts(&txs[0][0].type_url, &txs[0][0].value).unwrap()
    }
}

#[async_trait]
impl TxBroadcaster for MockBroadcaster {
    async fn broadcast(&self, msgs: Vec<Any>) -> Result<BroadcastResult, OracleError> {
        let mut txs = self.txs.lock().unwrap();
        txs.push(msgs);
        Ok(BroadcastResult {
            height: 42,
            tx_hash: format!("{:064X}", txs.len()),
        })
    }
}

/// Event source fed by the test.
#[derive(Default)]
pub struct MockEventSource {
    senders: Mutex<HashMap<String, mpsc::UnboundedSender<ChainEvent>>>,
    subscriptions: AtomicUsize,
}

impl MockEventSource {
    /// Delivers `event` to the subscription of `query`.
    pub fn emit(&self, query: &str, event: ChainEvent) {
        self.senders
            .lock()
            .unwrap()
            .get(query)
            .expect("no subscription for query")
            .unbounded_send(event)
            .unwrap();
    }

    /// Ends the subscription of `query`.
    pub fn end(&self, query: &str) {
        self.senders.lock().unwrap().remove(query);
    }

    pub fn subscriptions(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSource for MockEventSource {
    async fn subscribe(&self, query: &str) -> Result<EventStream, OracleError> {
        let (tx, rx) = mpsc::unbounded();
        self.senders.lock().unwrap().insert(query.to_string(), tx);
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        Ok(rx.map(Ok).boxed())
    }

    async fn close(&self) -> Result<(), OracleError> {
        self.senders.lock().unwrap().clear();
        Ok(())
    }
}

/// Builds an event carrying `attributes` of type `event_type`.
pub fn event(event_type: &str, attributes: &[(&str, &str)]) -> ChainEvent {
    ChainEvent {
        query: String::new(),
        attributes: attributes
            .iter()
            .map(|(key, value)| (format!("{event_type}.{key}"), vec![(*value).to_string()]))
            .collect(),
    }
}

/// One oracle node with its own enclave, account and data directory.
pub struct TestNode {
    pub ctx: Arc<OracleContext>,
    pub broadcaster: Arc<MockBroadcaster>,
    pub dir: TempDir,
}

impl TestNode {
    pub fn new(
        enclave: SimulatedEnclave,
        account_index: u32,
        state: &Arc<MockState>,
        headers: &Arc<MockHeaders>,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let broadcaster = Arc::new(MockBroadcaster::default());
        let enclave_info = enclave.generate_self_enclave_info().unwrap();

        let ctx = Arc::new(OracleContext {
            enclave: Arc::new(enclave),
            enclave_info,
            account: Arc::new(account(account_index)),
            querier: Arc::new(ChainQuerier::new(state.clone(), PREFIX)),
            headers: headers.clone(),
            broadcaster: broadcaster.clone(),
            report_policy: ReportPolicy {
                min_security_version: 1,
                product_id: Some(PRODUCT_ID.to_le_bytes().to_vec()),
                allow_debug: false,
            },
            key_paths: KeyPaths::new(dir.path()),
        });

        Self {
            ctx,
            broadcaster,
            dir,
        }
    }

    pub fn unique_id(&self) -> String {
        self.ctx.enclave_info.unique_id_hex()
    }

    pub fn address(&self) -> String {
        self.ctx.account.address().to_string()
    }

    /// Generates this node's key and records its registration on chain,
    /// trusting the block at `trusted_height`.
    pub fn register(
        &self,
        state: &MockState,
        headers: &MockHeaders,
        trusted_height: u64,
    ) -> OracleRegistration {
        let node_key =
            load_or_generate_node_key(self.ctx.enclave.as_ref(), &self.ctx.key_paths.node_priv_key)
                .unwrap();
        let trusted = headers.trusted(trusted_height);
        let registration = OracleRegistration {
            unique_id: self.unique_id(),
            oracle_address: self.address(),
            node_pub_key: node_key.public_key_bytes(),
            node_pub_key_remote_report: node_key.remote_report,
            trusted_block_height: i64::try_from(trusted.height).unwrap(),
            trusted_block_hash: trusted.hash,
            endpoint: "https://oracle.example".into(),
            oracle_commission_rate: "0.1".into(),
            oracle_commission_max_rate: "0.2".into(),
            oracle_commission_max_change_rate: "0.01".into(),
            encrypted_oracle_priv_key: Vec::new(),
        };
        state.put_registration(&registration);
        registration
    }

    /// Like [`TestNode::register`] for an upgrade.
    pub fn request_upgrade(
        &self,
        state: &MockState,
        headers: &MockHeaders,
        trusted_height: u64,
    ) -> OracleUpgrade {
        let node_key =
            load_or_generate_node_key(self.ctx.enclave.as_ref(), &self.ctx.key_paths.node_priv_key)
                .unwrap();
        let trusted = headers.trusted(trusted_height);
        let upgrade = OracleUpgrade {
            unique_id: self.unique_id(),
            oracle_address: self.address(),
            node_pub_key: node_key.public_key_bytes(),
            node_pub_key_remote_report: node_key.remote_report,
            trusted_block_height: i64::try_from(trusted.height).unwrap(),
            trusted_block_hash: trusted.hash,
            encrypted_oracle_priv_key: Vec::new(),
        };
        state.put_upgrade(&upgrade);
        upgrade
    }
}
