//! Integration tests for receiving the shared oracle key

mod helpers;

use std::sync::Arc;

use helpers::*;
use oracle_crypto::PrivateKey;
use oracle_enclave::Enclave;
use oracle_node::{
    dispatcher::EventHandler,
    events::ChainEvent,
    protocol::{
        completion, keys::unseal_key, ApprovalKind, ApprovalReceiver, ApproveRegistrationHandler,
        ApproveUpgradeHandler,
    },
    OracleError,
};
use oracle_types::{
    MsgApproveOracleRegistration, MsgApproveOracleUpgrade, Oracle, OracleUpgradeInfo, Params,
};

struct Network {
    state: Arc<MockState>,
    headers: Arc<MockHeaders>,
    approver: TestNode,
    oracle_key: PrivateKey,
}

fn network() -> Network {
    let state = Arc::new(MockState::default());
    let headers = Arc::new(MockHeaders::new(5));
    let approver = TestNode::new(enclave(BINARY_V1), 0, &state, &headers);
    let oracle_key = PrivateKey::generate();
    state.put_params(&Params {
        oracle_public_key: oracle_key.public_key().to_bytes(),
        oracle_pub_key_remote_report: Vec::new(),
        unique_id: approver.unique_id(),
    });

    Network {
        state,
        headers,
        approver,
        oracle_key,
    }
}

impl Network {
    /// Registers `node` and records an approval for it on chain.
    async fn approve_registration(&self, node: &TestNode) {
        let mut registration = node.register(&self.state, &self.headers, 3);
        ApproveRegistrationHandler::new(self.approver.ctx.clone(), self.oracle_key.clone())
            .approve_registration(&node.unique_id(), &node.address())
            .await
            .unwrap();

        let msg: MsgApproveOracleRegistration = self.approver.broadcaster.single();
        registration.encrypted_oracle_priv_key = msg
            .approval_sharing_oracle_key
            .unwrap()
            .encrypted_oracle_priv_key;
        self.state.put_registration(&registration);
    }
}

#[tokio::test]
async fn test_registered_node_receives_oracle_key() {
    let network = network();
    let node = TestNode::new(enclave(BINARY_V1), 1, &network.state, &network.headers);
    network.approve_registration(&node).await;

    let (signal, receiver) = completion();
    let handler = ApprovalReceiver::new(node.ctx.clone(), ApprovalKind::Registration, signal);
    handler.handle(ChainEvent::default()).await.unwrap();
    receiver.wait().await.unwrap();

    let sealed = unseal_key(node.ctx.enclave.as_ref(), &node.ctx.key_paths.oracle_priv_key).unwrap();
    assert_eq!(sealed.public_key(), network.oracle_key.public_key());
}

#[tokio::test]
async fn test_second_approval_event_is_ignored() {
    let network = network();
    let node = TestNode::new(enclave(BINARY_V1), 1, &network.state, &network.headers);
    network.approve_registration(&node).await;

    let (signal, receiver) = completion();
    let handler = ApprovalReceiver::new(node.ctx.clone(), ApprovalKind::Registration, signal);
    handler.handle(ChainEvent::default()).await.unwrap();
    // a duplicate event must neither fail the handler nor overwrite the result
    handler.handle(ChainEvent::default()).await.unwrap();
    receiver.wait().await.unwrap();

    assert!(matches!(
        handler.retrieve_oracle_key().await,
        Err(OracleError::OracleKeyExists)
    ));
}

#[tokio::test]
async fn test_upgraded_node_receives_oracle_key() {
    let network = network();
    let node = TestNode::new(enclave(BINARY_V2), 1, &network.state, &network.headers);
    network.state.put_upgrade_info(&OracleUpgradeInfo {
        unique_id: node.unique_id(),
        height: 10,
    });
    network.state.put_oracle(&Oracle {
        oracle_address: node.address(),
        unique_id: network.approver.unique_id(),
        ..Default::default()
    });
    let mut upgrade = node.request_upgrade(&network.state, &network.headers, 2);
    ApproveUpgradeHandler::new(network.approver.ctx.clone(), network.oracle_key.clone())
        .approve_upgrade(&node.unique_id(), &node.address())
        .await
        .unwrap();
    let msg: MsgApproveOracleUpgrade = network.approver.broadcaster.single();
    upgrade.encrypted_oracle_priv_key = msg
        .approval_sharing_oracle_key
        .unwrap()
        .encrypted_oracle_priv_key;
    network.state.put_upgrade(&upgrade);

    let (signal, receiver) = completion();
    let handler = ApprovalReceiver::new(node.ctx.clone(), ApprovalKind::Upgrade, signal);
    handler.handle(ChainEvent::default()).await.unwrap();
    receiver.wait().await.unwrap();

    let sealed = unseal_key(node.ctx.enclave.as_ref(), &node.ctx.key_paths.oracle_priv_key).unwrap();
    assert_eq!(sealed.public_key(), network.oracle_key.public_key());
}

#[tokio::test]
async fn test_missing_node_key_is_reported() {
    let network = network();
    let node = TestNode::new(enclave(BINARY_V1), 1, &network.state, &network.headers);

    let (signal, receiver) = completion();
    let handler = ApprovalReceiver::new(node.ctx.clone(), ApprovalKind::Registration, signal);
    handler.handle(ChainEvent::default()).await.unwrap();

    let err = receiver.wait().await.unwrap_err();
    assert!(matches!(err, OracleError::NodeKeyMissing));
    assert_eq!(err.to_string(), "the node private key is not exists");
}

#[tokio::test]
async fn test_existing_oracle_key_is_kept() {
    let network = network();
    let node = TestNode::new(enclave(BINARY_V1), 1, &network.state, &network.headers);
    network.approve_registration(&node).await;

    let existing = PrivateKey::generate();
    node.ctx
        .enclave
        .seal_to_file(&existing.to_bytes(), &node.ctx.key_paths.oracle_priv_key)
        .unwrap();

    let (signal, receiver) = completion();
    let handler = ApprovalReceiver::new(node.ctx.clone(), ApprovalKind::Registration, signal);
    handler.handle(ChainEvent::default()).await.unwrap();

    let err = receiver.wait().await.unwrap_err();
    assert_eq!(err.to_string(), "the oracle private key already exists");
    let sealed = unseal_key(node.ctx.enclave.as_ref(), &node.ctx.key_paths.oracle_priv_key).unwrap();
    assert_eq!(sealed.public_key(), existing.public_key());
}

#[tokio::test]
async fn test_key_from_other_oracle_is_rejected() {
    let network = network();
    let node = TestNode::new(enclave(BINARY_V1), 1, &network.state, &network.headers);
    network.approve_registration(&node).await;

    // the chain announces a different oracle key than the one shared
    let impostor = PrivateKey::generate();
    network.state.put_params(&Params {
        oracle_public_key: impostor.public_key().to_bytes(),
        oracle_pub_key_remote_report: Vec::new(),
        unique_id: network.approver.unique_id(),
    });

    let (signal, receiver) = completion();
    let handler = ApprovalReceiver::new(node.ctx.clone(), ApprovalKind::Registration, signal);
    handler.handle(ChainEvent::default()).await.unwrap();

    assert!(receiver.wait().await.is_err());
    assert!(!node.ctx.key_paths.oracle_priv_key.exists());
}
