//! Transaction messages of the oracle module.

use crate::TypesError;

/// A message with a fixed protobuf type url.
pub trait TypedMsg: prost::Message + Default + Sized {
    /// Fully qualified type url, e.g. `/panacea.oracle.v2.MsgRegisterOracle`
    const TYPE_URL: &'static str;

    /// Encodes the message into an `(type_url, value)` pair.
    fn to_any_parts(&self) -> (String, Vec<u8>) {
        (Self::TYPE_URL.to_string(), self.encode_to_vec())
    }

    /// Decodes the value of an `Any` after checking its type url.
    ///
    /// # Errors
    /// Returns an error on a type url mismatch or malformed value.
    fn from_any_parts(type_url: &str, value: &[u8]) -> Result<Self, TypesError> {
        if type_url != Self::TYPE_URL {
            return Err(TypesError::UnexpectedTypeUrl {
                expected: Self::TYPE_URL,
                actual: type_url.to_string(),
            });
        }
        crate::decode(value)
    }
}

/// The payload an approving oracle signs.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ApprovalSharingOracleKey {
    /// Unique id of the approving binary
    #[prost(string, tag = "1")]
    pub approver_unique_id: String,
    /// Bech32 address of the approving oracle
    #[prost(string, tag = "2")]
    pub approver_oracle_address: String,
    /// Unique id of the node receiving the key
    #[prost(string, tag = "3")]
    pub target_unique_id: String,
    /// Bech32 address of the node receiving the key
    #[prost(string, tag = "4")]
    pub target_oracle_address: String,
    /// Oracle private key encrypted under the ECDH shared key
    #[prost(bytes = "vec", tag = "5")]
    pub encrypted_oracle_priv_key: Vec<u8>,
}

/// Registers a new oracle instance.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct MsgRegisterOracle {
    /// Unique id of the registering binary
    #[prost(string, tag = "1")]
    pub unique_id: String,
    /// Bech32 address of the operator, also the tx signer
    #[prost(string, tag = "2")]
    pub oracle_address: String,
    /// Compressed node public key
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
}

impl TypedMsg for MsgRegisterOracle {
    const TYPE_URL: &'static str = "/panacea.oracle.v2.MsgRegisterOracle";
}

/// Moves a registered oracle to a new binary.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct MsgUpgradeOracle {
    /// Unique id of the new binary
    #[prost(string, tag = "1")]
    pub unique_id: String,
    /// Bech32 address of the operator, also the tx signer
    #[prost(string, tag = "2")]
    pub oracle_address: String,
    /// Compressed node public key
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
}

impl TypedMsg for MsgUpgradeOracle {
    const TYPE_URL: &'static str = "/panacea.oracle.v2.MsgUpgradeOracle";
}

/// Approves a registration by sharing the wrapped oracle key.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct MsgApproveOracleRegistration {
    /// Signed payload
    #[prost(message, optional, tag = "1")]
    pub approval_sharing_oracle_key: Option<ApprovalSharingOracleKey>,
    /// Oracle key signature over the protobuf encoding of the payload
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
}

impl TypedMsg for MsgApproveOracleRegistration {
    const TYPE_URL: &'static str = "/panacea.oracle.v2.MsgApproveOracleRegistration";
}

/// Approves an upgrade by sharing the wrapped oracle key.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct MsgApproveOracleUpgrade {
    /// Signed payload
    #[prost(message, optional, tag = "1")]
    pub approval_sharing_oracle_key: Option<ApprovalSharingOracleKey>,
    /// Oracle key signature over the protobuf encoding of the payload
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
}

impl TypedMsg for MsgApproveOracleUpgrade {
    const TYPE_URL: &'static str = "/panacea.oracle.v2.MsgApproveOracleUpgrade";
}

#[cfg(test)]
mod tests {
    use prost::Message;

    use super::*;

    #[test]
    fn any_parts_check_type_url() {
        let msg = MsgUpgradeOracle {
            unique_id: "ab".into(),
            trusted_block_height: 100,
            ..Default::default()
        };
        let (type_url, value) = msg.to_any_parts();

        assert_eq!(type_url, "/panacea.oracle.v2.MsgUpgradeOracle");
        assert_eq!(MsgUpgradeOracle::from_any_parts(&type_url, &value).unwrap(), msg);
        assert!(matches!(
            MsgRegisterOracle::from_any_parts(&type_url, &value),
            Err(TypesError::UnexpectedTypeUrl { .. })
        ));
    }

    #[test]
    fn approval_payload_is_protobuf_encoded() {
        let approval = ApprovalSharingOracleKey {
            approver_unique_id: "aa".into(),
            approver_oracle_address: "panacea1x".into(),
            target_unique_id: "aa".into(),
            target_oracle_address: "panacea1y".into(),
            encrypted_oracle_priv_key: vec![1, 2, 3],
        };
        // field 1, length 2, "aa"
        assert_eq!(&approval.encode_to_vec()[..4], &[0x0a, 0x02, b'a', b'a']);
    }
}
