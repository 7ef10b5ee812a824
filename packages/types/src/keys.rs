//! Store keys of the oracle module.
//!
//! Per-instance records are keyed by `prefix | len(unique_id) | unique_id | address`,
//! where `address` is the raw account address, not its bech32 form.

/// Name of the oracle module store.
pub const STORE_KEY: &str = "oracle";

/// Prefix of approved oracles.
pub const ORACLE_KEY_PREFIX: u8 = 0x01;
/// Prefix of pending registrations.
pub const ORACLE_REGISTRATION_KEY_PREFIX: u8 = 0x02;
/// Key of the current upgrade info.
pub const ORACLE_UPGRADE_INFO_KEY: u8 = 0x03;
/// Prefix of pending upgrades.
pub const ORACLE_UPGRADE_KEY_PREFIX: u8 = 0x04;
/// Key of the module parameters.
pub const PARAMS_KEY: u8 = 0x05;

/// Name of the auth module store.
pub const AUTH_STORE_KEY: &str = "acc";
/// Prefix of accounts in the auth store.
pub const ACCOUNT_KEY_PREFIX: u8 = 0x01;

/// Key of the oracle operated from `address`.
#[must_use]
pub fn oracle_key(address: &[u8]) -> Vec<u8> {
    prefixed(ORACLE_KEY_PREFIX, address)
}

/// Key of the registration of `unique_id` by `address`.
#[must_use]
pub fn oracle_registration_key(unique_id: &str, address: &[u8]) -> Vec<u8> {
    instance_key(ORACLE_REGISTRATION_KEY_PREFIX, unique_id, address)
}

/// Key of the upgrade of `address` to `unique_id`.
#[must_use]
pub fn oracle_upgrade_key(unique_id: &str, address: &[u8]) -> Vec<u8> {
    instance_key(ORACLE_UPGRADE_KEY_PREFIX, unique_id, address)
}

/// Key of the upgrade info.
#[must_use]
pub fn oracle_upgrade_info_key() -> Vec<u8> {
    vec![ORACLE_UPGRADE_INFO_KEY]
}

/// Key of the module parameters.
#[must_use]
pub fn params_key() -> Vec<u8> {
    vec![PARAMS_KEY]
}

/// Key of the account at `address` in the auth store.
#[must_use]
pub fn account_key(address: &[u8]) -> Vec<u8> {
    prefixed(ACCOUNT_KEY_PREFIX, address)
}

fn prefixed(prefix: u8, rest: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + rest.len());
    key.push(prefix);
    key.extend_from_slice(rest);
    key
}

fn instance_key(prefix: u8, unique_id: &str, address: &[u8]) -> Vec<u8> {
    let unique_id = unique_id.as_bytes();
    let mut key = Vec::with_capacity(2 + unique_id.len() + address.len());
    key.push(prefix);
    // unique ids are hex sha256, well below 256 bytes
    key.push(u8::try_from(unique_id.len()).unwrap_or(u8::MAX));
    key.extend_from_slice(unique_id);
    key.extend_from_slice(address);
    key
}
