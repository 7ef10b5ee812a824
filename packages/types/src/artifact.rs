//! Key generation output handed to operators.

use serde::{Deserialize, Serialize};

/// Public key and remote report, both base64, written as JSON by the key
/// generation commands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OraclePubKeyInfo {
    /// Compressed public key, base64
    pub public_key_base64: String,
    /// Remote report binding `sha256(public key)`, base64
    pub remote_report_base64: String,
}
