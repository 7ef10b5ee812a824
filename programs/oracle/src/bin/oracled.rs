use clap::Parser;
use oracle_node::cli::{Commands, OracleCli, OracleConfig};
use oracle_node::commands;
use oracle_node::observability::init_observability;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = OracleCli::parse();
    let config = OracleConfig::from_file(cli.config_path())?;

    let _guard = init_observability(&config.observability)?;
    info!(
        "Observability initialized with level: {}",
        config.observability.level()
    );

    match cli.command {
        Commands::GenOracleKey(args) => commands::gen_oracle_key(config, &args).await,
        Commands::RegisterOracle(args) => commands::register_oracle(config, &args).await,
        Commands::UpgradeOracle(args) => commands::upgrade_oracle(config, &args).await,
        Commands::Start(args) => commands::start(config, &args).await,
        Commands::ShowEnclaveInfo => commands::show_enclave_info(&config),
    }
}
