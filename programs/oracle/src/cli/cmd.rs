//! Defines the command line interface of the oracle node.
use std::path::PathBuf;

use clap::{command, Args, Parser, Subcommand};

#[derive(Clone, Debug, Parser)]
#[command(
    name = "oracled",
    version,
    about = "Oracle node - attested key sharing between oracle enclaves",
    long_about = "Runs an oracle node inside an enclave.\nGenerates and registers oracle keys and approves other oracle instances."
)]
/// The command line interface for the oracle node.
pub struct OracleCli {
    /// Home directory holding `config.toml`.
    #[arg(long, global = true)]
    pub home: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// The subcommands for the oracle node.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Generate the oracle key of a new chain and print its attestation.
    GenOracleKey(TrustArgs),

    /// Register this node and wait for the oracle key to be shared.
    RegisterOracle(RegisterArgs),

    /// Move this oracle to a new binary and wait for the oracle key.
    UpgradeOracle(TrustArgs),

    /// Serve approvals for registering and upgrading nodes.
    Start(StartArgs),

    /// Print the identity of this enclave binary.
    ShowEnclaveInfo,
}

/// The block the node starts trusting.
#[derive(Clone, Debug, Args)]
pub struct TrustArgs {
    /// Height of the trusted block.
    #[arg(long)]
    pub trusted_block_height: i64,
    /// Hex hash of the trusted block.
    #[arg(long)]
    pub trusted_block_hash: String,
}

/// The arguments for the register-oracle subcommand.
#[derive(Clone, Debug, Args)]
pub struct RegisterArgs {
    /// Trust options
    #[command(flatten)]
    pub trust: TrustArgs,
    /// Public endpoint of this oracle.
    #[arg(long)]
    pub endpoint: String,
    /// Commission rate, as a decimal.
    #[arg(long)]
    pub oracle_commission_rate: String,
    /// Maximum commission rate.
    #[arg(long)]
    pub oracle_commission_max_rate: String,
    /// Maximum daily change of the commission rate.
    #[arg(long)]
    pub oracle_commission_max_change_rate: String,
}

/// The arguments for the start subcommand.
#[derive(Clone, Debug, Args)]
pub struct StartArgs {
    /// Re-bootstrap the light client at this height.
    #[arg(long, requires = "trusted_block_hash")]
    pub trusted_block_height: Option<i64>,
    /// Hex hash of the block at `trusted_block_height`.
    #[arg(long, requires = "trusted_block_height")]
    pub trusted_block_hash: Option<String>,
}

impl OracleCli {
    /// Path of the config file.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.home
            .clone()
            .unwrap_or_else(super::config::default_home)
            .join(super::config::CONFIG_FILE_NAME)
    }
}
