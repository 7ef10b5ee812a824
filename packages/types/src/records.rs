//! Records stored by the oracle module.

/// An approved oracle.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct Oracle {
    /// Bech32 address of the oracle operator
    #[prost(string, tag = "1")]
    pub oracle_address: String,
    /// Unique id of the binary the oracle runs
    #[prost(string, tag = "2")]
    pub unique_id: String,
    /// Public endpoint
    #[prost(string, tag = "3")]
    pub endpoint: String,
    /// Commission rate as a decimal string
    #[prost(string, tag = "4")]
    pub oracle_commission_rate: String,
    /// Maximum commission rate
    #[prost(string, tag = "5")]
    pub oracle_commission_max_rate: String,
    /// Maximum daily change of the commission rate
    #[prost(string, tag = "6")]
    pub oracle_commission_max_change_rate: String,
}

/// A pending registration of a new oracle instance.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct OracleRegistration {
    /// Unique id claimed by the registering binary
    #[prost(string, tag = "1")]
    pub unique_id: String,
    /// Bech32 address of the registering operator
    #[prost(string, tag = "2")]
    pub oracle_address: String,
    /// Compressed public key of the registering node
    #[prost(bytes = "vec", tag = "3")]
    pub node_pub_key: Vec<u8>,
    /// Remote report binding `sha256(node_pub_key)`
    #[prost(bytes = "vec", tag = "4")]
    pub node_pub_key_remote_report: Vec<u8>,
    /// Height of the block the node trusts
    #[prost(int64, tag = "5")]
    pub trusted_block_height: i64,
    /// Hash of the block the node trusts
    #[prost(bytes = "vec", tag = "6")]
    pub trusted_block_hash: Vec<u8>,
    /// Public endpoint
    #[prost(string, tag = "7")]
    pub endpoint: String,
    /// Commission rate
    #[prost(string, tag = "8")]
    pub oracle_commission_rate: String,
    /// Maximum commission rate
    #[prost(string, tag = "9")]
    pub oracle_commission_max_rate: String,
    /// Maximum daily change of the commission rate
    #[prost(string, tag = "10")]
    pub oracle_commission_max_change_rate: String,
    /// Oracle key wrapped for `node_pub_key`, set once approved
    #[prost(bytes = "vec", tag = "11")]
    pub encrypted_oracle_priv_key: Vec<u8>,
}

/// The binary an upgrade is allowed to move to.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct OracleUpgradeInfo {
    /// Unique id of the new binary
    #[prost(string, tag = "1")]
    pub unique_id: String,
    /// Height from which the upgrade applies
    #[prost(int64, tag = "2")]
    pub height: i64,
}

/// A pending upgrade of a registered oracle to a new binary.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct OracleUpgrade {
    /// Unique id of the new binary
    #[prost(string, tag = "1")]
    pub unique_id: String,
    /// Bech32 address of the upgrading operator
    #[prost(string, tag = "2")]
    pub oracle_address: String,
    /// Compressed public key of the upgrading node
    #[prost(bytes = "vec", tag = "3")]
    pub node_pub_key: Vec<u8>,
    /// Remote report binding `sha256(node_pub_key)`
    #[prost(bytes = "vec", tag = "4")]
    pub node_pub_key_remote_report: Vec<u8>,
    /// Height of the block the node trusts
    #[prost(int64, tag = "5")]
    pub trusted_block_height: i64,
    /// Hash of the block the node trusts
    #[prost(bytes = "vec", tag = "6")]
    pub trusted_block_hash: Vec<u8>,
    /// Oracle key wrapped for `node_pub_key`, set once approved
    #[prost(bytes = "vec", tag = "7")]
    pub encrypted_oracle_priv_key: Vec<u8>,
}

/// Module parameters.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct Params {
    /// Compressed public key of the shared oracle key
    #[prost(bytes = "vec", tag = "1")]
    pub oracle_public_key: Vec<u8>,
    /// Remote report binding `sha256(oracle_public_key)`
    #[prost(bytes = "vec", tag = "2")]
    pub oracle_pub_key_remote_report: Vec<u8>,
    /// Unique id of the currently accepted binary
    #[prost(string, tag = "3")]
    pub unique_id: String,
}
