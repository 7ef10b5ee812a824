//! Command line interface and configuration of `oracled`.

pub mod cmd;
pub mod config;

pub use cmd::{Commands, OracleCli};
pub use config::{ConfigError, OracleConfig};
