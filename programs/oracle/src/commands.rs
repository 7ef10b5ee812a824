//! Runners of the `oracled` subcommands.

use std::sync::Arc;

use anyhow::{Context, Result};
use oracle_light_client::{spawn_refresh, TrustedBlockInfo};
use oracle_types::{MsgRegisterOracle, MsgUpgradeOracle};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    broadcaster::to_any,
    cli::{
        cmd::{RegisterArgs, StartArgs, TrustArgs},
        OracleConfig,
    },
    dispatcher::Dispatcher,
    events::WebSocketEventSource,
    node::{load_enclave, OracleNode},
    protocol::{
        completion,
        keys::{generate_oracle_key, load_or_generate_node_key, unseal_key, AttestedKey},
        ApprovalKind, ApprovalReceiver, ApproveRegistrationHandler, ApproveUpgradeHandler,
        OracleContext,
    },
    OracleError,
};

/// Output of `show-enclave-info`.
#[derive(Debug, Serialize)]
struct EnclaveInfoOutput {
    product_id: String,
    unique_id: String,
}

fn trusted_block(args: &TrustArgs) -> Result<TrustedBlockInfo> {
    TrustedBlockInfo::from_hex(args.trusted_block_height, &args.trusted_block_hash)
        .context("invalid trusted block")
}

/// Generates the oracle key of a new chain and prints its public artifact.
///
/// # Errors
/// Fails if the light client cannot start from `args`, or if an oracle key
/// already exists.
pub async fn gen_oracle_key(config: OracleConfig, args: &TrustArgs) -> Result<()> {
    let node = OracleNode::build(config, Some(trusted_block(args)?)).await?;
    let ctx = &node.ctx;

    let info = generate_oracle_key(ctx.enclave.as_ref(), &ctx.key_paths)?;
    info!(path = %ctx.key_paths.oracle_pub_key.display(), "oracle public key written");
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

/// Registers this node and waits until the oracle key has been shared with it.
///
/// # Errors
/// Fails if registration is rejected, the approval cannot be processed, or
/// the process is interrupted first.
pub async fn register_oracle(config: OracleConfig, args: &RegisterArgs) -> Result<()> {
    let trust = trusted_block(&args.trust)?;
    let node = OracleNode::build(config, Some(trust.clone())).await?;
    let ctx = node.ctx.clone();
    let node_key = prepare_node_key(&ctx)?;

    let msg = MsgRegisterOracle {
        unique_id: ctx.enclave_info.unique_id_hex(),
        oracle_address: ctx.account.address().to_string(),
        node_pub_key: node_key.public_key_bytes(),
        node_pub_key_remote_report: node_key.remote_report,
        trusted_block_height: args.trust.trusted_block_height,
        trusted_block_hash: trust.hash,
        endpoint: args.endpoint.clone(),
        oracle_commission_rate: args.oracle_commission_rate.clone(),
        oracle_commission_max_rate: args.oracle_commission_max_rate.clone(),
        oracle_commission_max_change_rate: args.oracle_commission_max_change_rate.clone(),
    };
    await_approval(&node, ApprovalKind::Registration, to_any(&msg)).await
}

/// Moves this oracle to the running binary and waits for the oracle key.
///
/// # Errors
/// Same as [`register_oracle`].
pub async fn upgrade_oracle(config: OracleConfig, args: &TrustArgs) -> Result<()> {
    let trust = trusted_block(args)?;
    let node = OracleNode::build(config, Some(trust.clone())).await?;
    let ctx = node.ctx.clone();
    let node_key = prepare_node_key(&ctx)?;

    let msg = MsgUpgradeOracle {
        unique_id: ctx.enclave_info.unique_id_hex(),
        oracle_address: ctx.account.address().to_string(),
        node_pub_key: node_key.public_key_bytes(),
        node_pub_key_remote_report: node_key.remote_report,
        trusted_block_height: args.trusted_block_height,
        trusted_block_hash: trust.hash,
    };
    await_approval(&node, ApprovalKind::Upgrade, to_any(&msg)).await
}

fn prepare_node_key(ctx: &OracleContext) -> Result<AttestedKey> {
    if ctx.key_paths.oracle_priv_key.exists() {
        return Err(OracleError::OracleKeyExists.into());
    }
    Ok(load_or_generate_node_key(
        ctx.enclave.as_ref(),
        &ctx.key_paths.node_priv_key,
    )?)
}

/// Subscribes to the approval of this node, broadcasts `msg` and waits for
/// the approval to be processed.
async fn await_approval(
    node: &OracleNode,
    kind: ApprovalKind,
    msg: cosmos_sdk_proto::Any,
) -> Result<()> {
    let source = WebSocketEventSource::connect(&node.config.chain.ws_addr).await?;
    let mut dispatcher = Dispatcher::new(Arc::new(source));
    let (signal, receiver) = completion();
    dispatcher
        .register(Arc::new(ApprovalReceiver::new(node.ctx.clone(), kind, signal)))
        .await?;

    let result = match node.ctx.broadcaster.broadcast(vec![msg]).await {
        Ok(tx) => {
            info!(?kind, tx_hash = %tx.tx_hash, height = tx.height, "waiting for approval");
            tokio::select! {
                result = receiver.wait() => result.map_err(anyhow::Error::from),
                () = shutdown_signal() => Err(anyhow::anyhow!("interrupted before the approval arrived")),
            }
        }
        Err(e) => Err(anyhow::Error::from(e).context("failed to broadcast")),
    };

    dispatcher.close().await;
    if result.is_ok() {
        info!(?kind, "oracle key received");
    }
    result
}

/// Serves approvals until a termination signal.
///
/// # Errors
/// Fails if the sealed oracle key cannot be read or the subscriptions cannot
/// be opened.
pub async fn start(config: OracleConfig, args: &StartArgs) -> Result<()> {
    let trust = match (args.trusted_block_height, &args.trusted_block_hash) {
        (Some(height), Some(hash)) => Some(
            TrustedBlockInfo::from_hex(height, hash).context("invalid trusted block")?,
        ),
        _ => None,
    };
    let node = OracleNode::build(config, trust).await?;
    let ctx = node.ctx.clone();

    let oracle_key = unseal_key(ctx.enclave.as_ref(), &ctx.key_paths.oracle_priv_key)
        .context("failed to unseal the oracle key")?;

    let cancel = CancellationToken::new();
    let refresh = spawn_refresh(
        node.trust_manager.clone(),
        node.config.light_client.trusting_period,
        node.config.light_client.refresh_interval,
        cancel.clone(),
    );

    let source = WebSocketEventSource::connect(&node.config.chain.ws_addr).await?;
    let mut dispatcher = Dispatcher::new(Arc::new(source));
    dispatcher
        .register(Arc::new(ApproveRegistrationHandler::new(
            ctx.clone(),
            oracle_key.clone(),
        )))
        .await?;
    dispatcher
        .register(Arc::new(ApproveUpgradeHandler::new(ctx.clone(), oracle_key)))
        .await?;
    info!(address = ctx.account.address(), "oracle started");

    shutdown_signal().await;
    info!("shutting down");

    for (handler, outcome) in dispatcher.close().await {
        info!(handler, ?outcome, "subscription closed");
    }
    cancel.cancel();
    if let Err(e) = refresh.await {
        warn!(error = %e, "refresh task failed");
    }
    Ok(())
}

/// Prints the identity of this enclave binary.
///
/// # Errors
/// Fails if the enclave cannot be built.
pub fn show_enclave_info(config: &OracleConfig) -> Result<()> {
    let (_, info) = load_enclave(config)?;
    let output = EnclaveInfoOutput {
        product_id: hex::encode(&info.product_id),
        unique_id: info.unique_id_hex(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
