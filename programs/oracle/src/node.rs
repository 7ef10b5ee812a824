//! Wiring of a running oracle node.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use oracle_crypto::OracleAccount;
use oracle_enclave::{Enclave, EnclaveInfo};
use oracle_light_client::{
    now, FileTrustedStore, LightBlockProvider, RpcProvider, TrustManager, TrustedBlockInfo,
    TrustedHeaders,
};
use oracle_query::VerifiedQueryClient;
use tendermint_rpc::HttpClient;
use tracing::info;

use crate::{
    broadcaster::{CosmosTxBroadcaster, FeeConfig},
    cli::OracleConfig,
    protocol::{KeyPaths, OracleContext},
    querier::ChainQuerier,
};

/// The enclave described by `config` and the identity of this binary in it.
///
/// # Errors
/// Fails if the enclave cannot be built or cannot report on itself.
pub fn load_enclave(config: &OracleConfig) -> Result<(Arc<dyn Enclave>, EnclaveInfo)> {
    let enclave = config.enclave.build().context("failed to build the enclave")?;
    let info = enclave
        .generate_self_enclave_info()
        .context("failed to read the enclave identity")?;
    Ok((Arc::new(enclave), info))
}

/// Everything a command needs, connected to the chain.
pub struct OracleNode {
    /// The loaded configuration
    pub config: OracleConfig,
    /// Shared handler context
    pub ctx: Arc<OracleContext>,
    /// The light client behind every proven query
    pub trust_manager: Arc<TrustManager>,
}

impl OracleNode {
    /// Connects to the chain and bootstraps the light client.
    ///
    /// With `trust` the light client starts over from that block; otherwise
    /// it resumes from its trust store.
    ///
    /// # Errors
    /// Fails on an unusable config, unreachable endpoints, or a failed
    /// bootstrap.
    pub async fn build(config: OracleConfig, trust: Option<TrustedBlockInfo>) -> Result<Self> {
        let (enclave, enclave_info) = load_enclave(&config)?;
        info!(unique_id = %enclave_info.unique_id_hex(), "enclave loaded");

        let account = Arc::new(
            OracleAccount::from_mnemonic(
                &config.base.oracle_mnemonic,
                config.base.oracle_account_number,
                config.base.oracle_address_index,
                &config.chain.bech32_prefix,
            )
            .context("failed to derive the oracle account")?,
        );
        info!(address = account.address(), "oracle account loaded");

        let primary: Arc<dyn LightBlockProvider> = Arc::new(
            RpcProvider::connect(config.chain.primary_addr())
                .await
                .context("failed to connect to the primary")?,
        );
        let mut witnesses: Vec<Arc<dyn LightBlockProvider>> = Vec::new();
        for addr in &config.chain.witness_addrs {
            let witness = RpcProvider::connect(addr)
                .await
                .with_context(|| format!("failed to connect to witness {addr}"))?;
            witnesses.push(Arc::new(witness));
        }

        let store = Arc::new(FileTrustedStore::new(config.trust_store_path()));
        let trust_manager = Arc::new(
            TrustManager::bootstrap(
                config.light_client_config()?,
                primary,
                witnesses,
                store,
                trust,
                now()?,
            )
            .await
            .context("failed to bootstrap the light client")?,
        );
        let headers: Arc<dyn TrustedHeaders> = trust_manager.clone();

        let rpc = HttpClient::new(config.chain.rpc_addr.as_str())
            .map_err(|e| anyhow!("invalid rpc address {}: {e}", config.chain.rpc_addr))?;
        let query_client = VerifiedQueryClient::new(Arc::new(rpc.clone()), headers.clone());
        let querier = Arc::new(ChainQuerier::new(
            Arc::new(query_client),
            config.chain.bech32_prefix.clone(),
        ));

        let broadcaster = Arc::new(CosmosTxBroadcaster::new(
            rpc,
            querier.clone(),
            account.clone(),
            config.chain.chain_id.clone(),
            FeeConfig {
                denom: config.chain.denom.clone(),
                amount: config.chain.fee_amount,
                gas_limit: config.chain.gas_limit,
            },
        ));

        let ctx = Arc::new(OracleContext {
            enclave,
            report_policy: config.enclave.report_policy(),
            enclave_info,
            account,
            querier,
            headers,
            broadcaster,
            key_paths: KeyPaths::new(&config.base.data_dir),
        });

        Ok(Self {
            config,
            ctx,
            trust_manager,
        })
    }
}
