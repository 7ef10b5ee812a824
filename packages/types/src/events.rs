//! Events emitted by the oracle module and subscription filters for them.

/// Emitted when a node registers.
pub const EVENT_TYPE_REGISTER: &str = "register_oracle";
/// Emitted when a registration is approved.
pub const EVENT_TYPE_APPROVE_REGISTRATION: &str = "approve_oracle_registration";
/// Emitted when a node requests an upgrade.
pub const EVENT_TYPE_UPGRADE: &str = "upgrade_oracle";
/// Emitted when an upgrade is approved.
pub const EVENT_TYPE_APPROVE_UPGRADE: &str = "approve_oracle_upgrade";

/// Attribute carrying the unique id.
pub const ATTRIBUTE_KEY_UNIQUE_ID: &str = "unique_id";
/// Attribute carrying the oracle address.
pub const ATTRIBUTE_KEY_ORACLE_ADDRESS: &str = "oracle_address";

/// `message.action` of [`crate::MsgRegisterOracle`].
pub const ACTION_REGISTER: &str = "RegisterOracle";
/// `message.action` of [`crate::MsgApproveOracleRegistration`].
pub const ACTION_APPROVE_REGISTRATION: &str = "ApproveOracleRegistration";
/// `message.action` of [`crate::MsgUpgradeOracle`].
pub const ACTION_UPGRADE: &str = "UpgradeOracle";
/// `message.action` of [`crate::MsgApproveOracleUpgrade`].
pub const ACTION_APPROVE_UPGRADE: &str = "ApproveOracleUpgrade";

fn action(action: &str) -> String {
    format!("message.action = '{action}'")
}

fn scoped(action_name: &str, event_type: &str, unique_id: &str, address: &str) -> String {
    format!(
        "{} AND {event_type}.{ATTRIBUTE_KEY_UNIQUE_ID} = '{unique_id}' AND \
         {event_type}.{ATTRIBUTE_KEY_ORACLE_ADDRESS} = '{address}'",
        action(action_name)
    )
}

/// Every oracle registration.
#[must_use]
pub fn register_oracle_query() -> String {
    action(ACTION_REGISTER)
}

/// Every oracle upgrade.
#[must_use]
pub fn upgrade_oracle_query() -> String {
    action(ACTION_UPGRADE)
}

/// Approval of the registration of `unique_id` by `address`.
#[must_use]
pub fn approve_registration_query(unique_id: &str, address: &str) -> String {
    scoped(
        ACTION_APPROVE_REGISTRATION,
        EVENT_TYPE_APPROVE_REGISTRATION,
        unique_id,
        address,
    )
}

/// Approval of the upgrade of `address` to `unique_id`.
#[must_use]
pub fn approve_upgrade_query(unique_id: &str, address: &str) -> String {
    scoped(
        ACTION_APPROVE_UPGRADE,
        EVENT_TYPE_APPROVE_UPGRADE,
        unique_id,
        address,
    )
}
