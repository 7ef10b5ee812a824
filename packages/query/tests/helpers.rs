//! Common test utilities and fixtures

#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use ibc_core_commitment_types::proto::ics23::{
    commitment_proof::Proof, CommitmentProof, ExistenceProof, HashOp, LeafOp, LengthOp,
};
use oracle_light_client::{LightBlock, LightClientError, Time, TrustedHeaders};
use oracle_query::{AbciClient, AbciResponse, ProofOp, ProofOps, QueryError};
use prost::Message;
use sha2::{Digest, Sha256};
use tendermint::AppHash;
use tendermint_testgen::{light_block::LightBlock as TestgenLightBlock, Generator};

pub const STORE_KEY: &str = "oracle";
pub const QUERY_HEIGHT: u64 = 10;

/// IAVL leaf prefix: height 0, size 1, version 1, zigzag varints.
const IAVL_LEAF_PREFIX: [u8; 3] = [0x00, 0x02, 0x02];
/// Simple merkle leaf prefix.
const SIMPLE_LEAF_PREFIX: [u8; 1] = [0x00];

/// A one-entry store inside a one-store multistore, with its proof.
pub struct StoreFixture {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub app_hash: Vec<u8>,
    pub proof_ops: ProofOps,
}

pub fn store_fixture(key: &[u8], value: &[u8]) -> StoreFixture {
    let iavl = existence_proof(key, value, &IAVL_LEAF_PREFIX);
    let store_root = leaf_hash(&IAVL_LEAF_PREFIX, key, value);
    let simple = existence_proof(STORE_KEY.as_bytes(), &store_root, &SIMPLE_LEAF_PREFIX);
    let app_hash = leaf_hash(&SIMPLE_LEAF_PREFIX, STORE_KEY.as_bytes(), &store_root);

    StoreFixture {
        key: key.to_vec(),
        value: value.to_vec(),
        app_hash,
        proof_ops: ProofOps {
            ops: vec![
                ProofOp {
                    field_type: "ics23:iavl".to_string(),
                    key: key.to_vec(),
                    data: iavl,
                },
                ProofOp {
                    field_type: "ics23:simple".to_string(),
                    key: STORE_KEY.as_bytes().to_vec(),
                    data: simple,
                },
            ],
        },
    }
}

fn existence_proof(key: &[u8], value: &[u8], prefix: &[u8]) -> Vec<u8> {
    CommitmentProof {
        proof: Some(Proof::Exist(ExistenceProof {
            key: key.to_vec(),
            value: value.to_vec(),
            leaf: Some(LeafOp {
                hash: HashOp::Sha256.into(),
                prehash_key: HashOp::NoHash.into(),
                prehash_value: HashOp::Sha256.into(),
                length: LengthOp::VarProto.into(),
                prefix: prefix.to_vec(),
            }),
            path: vec![],
        })),
    }
    .encode_to_vec()
}

fn leaf_hash(prefix: &[u8], key: &[u8], value: &[u8]) -> Vec<u8> {
    let mut preimage = prefix.to_vec();
    prost::encoding::encode_varint(key.len() as u64, &mut preimage);
    preimage.extend_from_slice(key);
    let value_hash = Sha256::digest(value);
    prost::encoding::encode_varint(value_hash.len() as u64, &mut preimage);
    preimage.extend_from_slice(&value_hash);
    Sha256::digest(preimage).to_vec()
}

/// A successful proven response for `fixture` at [`QUERY_HEIGHT`].
pub fn proven_response(fixture: &StoreFixture) -> AbciResponse {
    AbciResponse {
        code: 0,
        log: String::new(),
        key: fixture.key.clone(),
        value: fixture.value.clone(),
        height: i64::try_from(QUERY_HEIGHT).unwrap(),
        proof_ops: Some(fixture.proof_ops.clone()),
    }
}

/// ABCI endpoint returning a canned response.
pub struct MockAbci {
    response: AbciResponse,
    requests: Mutex<Vec<(String, u64)>>,
}

impl MockAbci {
    pub fn new(response: AbciResponse) -> Self {
        Self {
            response,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(String, u64)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AbciClient for MockAbci {
    async fn query(
        &self,
        path: String,
        _data: Vec<u8>,
        height: u64,
        prove: bool,
    ) -> Result<AbciResponse, QueryError> {
        assert!(prove);
        self.requests.lock().unwrap().push((path, height));
        Ok(self.response.clone())
    }
}

fn light_block(height: u64, app_hash: &[u8]) -> LightBlock {
    let tm = TestgenLightBlock::new_default(height)
        .generate()
        .expect("testgen light block");
    let mut block = LightBlock::new(tm.signed_header, tm.validators, tm.next_validators, tm.provider);
    block.signed_header.header.app_hash = AppHash::try_from(app_hash.to_vec()).unwrap();
    block
}

/// Trusted headers rooted at [`QUERY_HEIGHT`] whose next block commits to
/// `app_hash`, produced only after `pending` polls.
pub struct MockHeaders {
    latest: LightBlock,
    next: LightBlock,
    pending: AtomicUsize,
    verify_calls: AtomicUsize,
    fatal: bool,
}

impl MockHeaders {
    pub fn new(app_hash: &[u8]) -> Self {
        Self {
            latest: light_block(QUERY_HEIGHT, &[0; 32]),
            next: light_block(QUERY_HEIGHT + 1, app_hash),
            pending: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
            fatal: false,
        }
    }

    /// The next block only becomes available after `polls` attempts.
    pub fn pending_for(self, polls: usize) -> Self {
        self.pending.store(polls, Ordering::SeqCst);
        self
    }

    /// Verification of the next block fails outright.
    pub fn failing(mut self) -> Self {
        self.fatal = true;
        self
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrustedHeaders for MockHeaders {
    async fn update(&self, _now: Time) -> Result<Option<LightBlock>, LightClientError> {
        Ok(None)
    }

    async fn verify_at_height(&self, height: u64, _now: Time) -> Result<LightBlock, LightClientError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if self.fatal {
            return Err(LightClientError::Verification {
                height,
                reason: "bad commit".to_string(),
            });
        }
        let produced = self
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |p| p.checked_sub(1))
            .is_err();
        if !produced {
            return Err(LightClientError::HeightTooHigh { height });
        }
        assert_eq!(height, self.next.height().value());
        Ok(self.next.clone())
    }

    async fn latest_trusted(&self) -> LightBlock {
        self.latest.clone()
    }
}

pub fn client(abci: Arc<MockAbci>, headers: Arc<MockHeaders>) -> oracle_query::VerifiedQueryClient {
    oracle_query::VerifiedQueryClient::new(abci, headers)
        .with_next_block_polling(std::time::Duration::from_millis(1), 12)
}
