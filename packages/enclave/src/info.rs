//! Identity of the running enclave binary

/// Product and unique identity of this enclave.
///
/// `unique_id` is the hash of the measured code and configuration, so two
/// instances share it only if they run the same binary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnclaveInfo {
    /// Product identifier assigned by the enclave author
    pub product_id: Vec<u8>,
    /// Measurement of the enclave code and configuration
    pub unique_id: Vec<u8>,
}

impl EnclaveInfo {
    /// Creates a new `EnclaveInfo`.
    #[must_use]
    pub const fn new(product_id: Vec<u8>, unique_id: Vec<u8>) -> Self {
        Self {
            product_id,
            unique_id,
        }
    }

    /// Lower-case hex form of the unique id, as recorded on chain.
    #[must_use]
    pub fn unique_id_hex(&self) -> String {
        hex::encode(&self.unique_id)
    }

    /// Whether `unique_id` is exactly the lower-case hex id of this enclave.
    ///
    /// Other spellings of the same bytes are rejected: the id is also used
    /// verbatim as a store key and in approval messages.
    #[must_use]
    pub fn is_same_binary(&self, unique_id: &str) -> bool {
        self.unique_id_hex() == unique_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_id_comparison_is_exact_lower_hex() {
        let info = EnclaveInfo::new(vec![1, 0], vec![0xab, 0xcd]);

        assert_eq!(info.unique_id_hex(), "abcd");
        assert!(info.is_same_binary("abcd"));
        assert!(!info.is_same_binary("ABCD"));
        assert!(!info.is_same_binary("abce"));
    }
}
