//! Error types for the oracle module types

use thiserror::Error;

/// Errors returned when decoding oracle module data
#[derive(Debug, Error)]
pub enum TypesError {
    /// Protobuf decoding failed
    #[error("failed to decode {type_name}: {reason}")]
    Decode {
        /// Rust type being decoded
        type_name: &'static str,
        /// Decoder message
        reason: String,
    },

    /// A required field is absent
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// An `Any` carries another message type
    #[error("unexpected type url: expected {expected}, got {actual}")]
    UnexpectedTypeUrl {
        /// Required type url
        expected: &'static str,
        /// Type url found
        actual: String,
    },
}
