//! Defines the top level configuration for the oracle node.
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use oracle_enclave::{EnclaveError, Measurement, PlatformKey, ReportPolicy, SimulatedEnclave};
use oracle_light_client::{LightClientConfig, TrustThreshold, DEFAULT_TRUSTING_PERIOD};
use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use thiserror::Error;
use tracing::Level;

/// Directory under `$HOME` holding the config and the node data.
pub const ORACLE_HOME_DIR: &str = ".oracle";
/// Name of the config file inside the home directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// `$HOME/.oracle`, or `.oracle` when no home directory is known.
#[must_use]
pub fn default_home() -> PathBuf {
    dirs::home_dir().map_or_else(|| PathBuf::from(ORACLE_HOME_DIR), |home| home.join(ORACLE_HOME_DIR))
}

/// The top level configuration for the oracle node.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OracleConfig {
    /// Account and data directory.
    pub base: BaseConfig,
    /// The chain the oracle serves.
    pub chain: ChainConfig,
    /// Light client parameters.
    #[serde(default)]
    pub light_client: LightClientSection,
    /// Enclave backend.
    pub enclave: EnclaveConfig,
    /// Logging and tracing.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Account and data directory.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Directory holding sealed keys and the trust store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// BIP-39 mnemonic of the oracle account.
    pub oracle_mnemonic: String,
    /// BIP-44 account of the oracle account.
    #[serde(default)]
    pub oracle_account_number: u32,
    /// BIP-44 address index of the oracle account.
    #[serde(default)]
    pub oracle_address_index: u32,
}

/// The chain the oracle serves.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    /// Chain id signed into transactions.
    pub chain_id: String,
    /// Tendermint RPC used for queries and broadcasts.
    pub rpc_addr: String,
    /// Websocket endpoint for event subscriptions.
    pub ws_addr: String,
    /// Primary light block provider, `rpc_addr` if unset.
    #[serde(default)]
    pub primary_addr: Option<String>,
    /// Witnesses cross-checking the primary.
    #[serde(default)]
    pub witness_addrs: Vec<String>,
    /// Bech32 prefix of account addresses.
    #[serde(default = "default_bech32_prefix")]
    pub bech32_prefix: String,
    /// Fee denomination.
    #[serde(default = "default_denom")]
    pub denom: String,
    /// Gas limit of every transaction.
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    /// Fee paid per transaction, in `denom`.
    #[serde(default = "default_fee_amount")]
    pub fee_amount: u64,
}

impl ChainConfig {
    /// Address of the primary light block provider.
    #[must_use]
    pub fn primary_addr(&self) -> &str {
        self.primary_addr.as_deref().unwrap_or(&self.rpc_addr)
    }
}

/// Light client parameters.
#[serde_as]
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LightClientSection {
    /// Numerator of the trust level.
    pub trust_level_numerator: u64,
    /// Denominator of the trust level.
    pub trust_level_denominator: u64,
    /// Trusting period in seconds.
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "trusting_period_secs")]
    pub trusting_period: Duration,
    /// Interval of the trust root freshness check in seconds.
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "refresh_interval_secs")]
    pub refresh_interval: Duration,
    /// Trust store file, relative to `data_dir`.
    pub trust_store: PathBuf,
}

impl Default for LightClientSection {
    fn default() -> Self {
        Self {
            trust_level_numerator: 1,
            trust_level_denominator: 3,
            trusting_period: DEFAULT_TRUSTING_PERIOD,
            refresh_interval: Duration::from_secs(60),
            trust_store: PathBuf::from("light-client").join("trusted.json"),
        }
    }
}

/// Enclave backend.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnclaveConfig {
    /// Product id of this binary.
    #[serde(default = "default_product_id")]
    pub product_id: u16,
    /// Security version of this binary.
    #[serde(default = "default_security_version")]
    pub security_version: u32,
    /// Lowest security version accepted from peers.
    #[serde(default = "default_security_version")]
    pub min_security_version: u32,
    /// Hex seed standing in for the platform root key.
    pub platform_seed: String,
    /// Hex measurement overriding the hash of the running executable.
    #[serde(default)]
    pub measurement: Option<String>,
    /// Run as a debug enclave and accept debug peers.
    #[serde(default)]
    pub debug: bool,
}

impl EnclaveConfig {
    /// Builds the enclave this node runs in.
    ///
    /// # Errors
    /// Fails on a malformed seed or measurement, or if the executable cannot
    /// be read.
    pub fn build(&self) -> Result<SimulatedEnclave, EnclaveError> {
        let seed = hex::decode(&self.platform_seed)
            .map_err(|e| EnclaveError::PlatformKey(format!("platform seed: {e}")))?;
        let platform = PlatformKey::from_seed(&seed)?;

        let measurement = match &self.measurement {
            Some(measurement) => {
                let unique_id: [u8; 32] = hex::decode(measurement)
                    .ok()
                    .and_then(|bytes| bytes.try_into().ok())
                    .ok_or_else(|| {
                        EnclaveError::PlatformKey("measurement must be 32 hex-encoded bytes".into())
                    })?;
                Measurement::with_unique_id(self.product_id, unique_id, self.security_version)
            }
            None => Measurement::of_current_executable(self.product_id, self.security_version)?,
        };

        Ok(SimulatedEnclave::new(platform, measurement.debug(self.debug)))
    }

    /// What a peer's report must satisfy.
    #[must_use]
    pub fn report_policy(&self) -> ReportPolicy {
        ReportPolicy {
            min_security_version: self.min_security_version,
            product_id: Some(self.product_id.to_le_bytes().to_vec()),
            allow_debug: self.debug,
        }
    }
}

/// Logging and tracing.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObservabilityConfig {
    /// Log level filter.
    #[serde(default = "default_level")]
    pub level: String,
    /// Export traces and logs over OTLP.
    #[serde(default)]
    pub use_otel: bool,
    /// Service name reported to the collector.
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// OTLP collector endpoint, the exporter default if unset.
    #[serde(default)]
    pub otel_endpoint: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            use_otel: false,
            service_name: default_service_name(),
            otel_endpoint: None,
        }
    }
}

impl ObservabilityConfig {
    /// Returns the log level, `INFO` when unparseable.
    #[must_use]
    pub fn level(&self) -> Level {
        Level::from_str(&self.level).unwrap_or(Level::INFO)
    }
}

/// Errors that can occur loading the oracle config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("I/O error reading `{0}`: {1}")]
    Io(String, #[source] std::io::Error),

    /// The config file is not valid TOML for [`OracleConfig`]
    #[error("invalid TOML in config: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value is out of range or inconsistent
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl OracleConfig {
    /// Load an `OracleConfig` from a TOML file on disk and validate it.
    ///
    /// # Errors
    /// Fails if the file cannot be read, parsed, or validated.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .map_err(|e| ConfigError::Io(path_ref.display().to_string(), e))?;
        contents.parse()
    }

    /// Rejects inconsistent values.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain.chain_id.trim().is_empty() {
            return Err(ConfigError::Invalid("chain.chain_id is empty".into()));
        }
        if self.chain.primary_addr().trim().is_empty() {
            return Err(ConfigError::Invalid("no primary light block provider".into()));
        }
        if self.base.oracle_mnemonic.trim().is_empty() {
            return Err(ConfigError::Invalid("base.oracle_mnemonic is empty".into()));
        }
        self.light_client_config()?;
        if self.light_client.refresh_interval.is_zero() {
            return Err(ConfigError::Invalid("light_client.refresh_interval_secs is zero".into()));
        }
        Ok(())
    }

    /// Light client parameters with a trust level in `[1/3, 1]`.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] for an unusable trust level.
    pub fn light_client_config(&self) -> Result<LightClientConfig, ConfigError> {
        let (num, den) = (
            self.light_client.trust_level_numerator,
            self.light_client.trust_level_denominator,
        );
        if den == 0 || num.saturating_mul(3) < den || num > den {
            return Err(ConfigError::Invalid(format!(
                "trust level {num}/{den} must be within [1/3, 1]"
            )));
        }
        let trust_threshold =
            TrustThreshold::new(num, den).map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(LightClientConfig {
            trust_threshold,
            trusting_period: self.light_client.trusting_period,
            ..LightClientConfig::default()
        })
    }

    /// Absolute path of the trust store.
    #[must_use]
    pub fn trust_store_path(&self) -> PathBuf {
        self.base.data_dir.join(&self.light_client.trust_store)
    }
}

impl FromStr for OracleConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

fn default_data_dir() -> PathBuf {
    default_home().join("data")
}

fn default_bech32_prefix() -> String {
    oracle_crypto::account::DEFAULT_ACCOUNT_PREFIX.to_string()
}

fn default_denom() -> String {
    "umed".to_string()
}

const fn default_gas_limit() -> u64 {
    400_000
}

const fn default_fee_amount() -> u64 {
    1_000_000
}

const fn default_product_id() -> u16 {
    1
}

const fn default_security_version() -> u32 {
    1
}

fn default_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "oracled".to_string()
}
