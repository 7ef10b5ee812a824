//! Remote attestation reports.

use crate::{Enclave, EnclaveError};

/// Size of the user data field of a report. Shorter data is zero padded.
pub const REPORT_DATA_LEN: usize = 64;

/// The signed part of a remote report.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ReportBody {
    /// Data bound to the report by the enclave
    #[prost(bytes = "vec", tag = "1")]
    pub report_data: Vec<u8>,
    /// Measurement of the enclave code and configuration
    #[prost(bytes = "vec", tag = "2")]
    pub unique_id: Vec<u8>,
    /// Identity of the enclave author
    #[prost(bytes = "vec", tag = "3")]
    pub signer_id: Vec<u8>,
    /// Product identifier
    #[prost(bytes = "vec", tag = "4")]
    pub product_id: Vec<u8>,
    /// Security version of the enclave
    #[prost(uint32, tag = "5")]
    pub security_version: u32,
    /// Whether the enclave runs in debug mode
    #[prost(bool, tag = "6")]
    pub debug: bool,
}

/// Wire form of a remote report.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct SignedReport {
    /// Report body
    #[prost(message, optional, tag = "1")]
    pub body: Option<ReportBody>,
    /// Platform signature over the protobuf encoding of `body`
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
}

/// A report whose platform signature has been checked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    /// Data bound to the report, always [`REPORT_DATA_LEN`] bytes
    pub data: Vec<u8>,
    /// Measurement of the reporting enclave
    pub unique_id: Vec<u8>,
    /// Identity of the enclave author
    pub signer_id: Vec<u8>,
    /// Product identifier
    pub product_id: Vec<u8>,
    /// Security version
    pub security_version: u32,
    /// Debug mode flag
    pub debug: bool,
}

impl From<ReportBody> for Report {
    fn from(body: ReportBody) -> Self {
        Self {
            data: body.report_data,
            unique_id: body.unique_id,
            signer_id: body.signer_id,
            product_id: body.product_id,
            security_version: body.security_version,
            debug: body.debug,
        }
    }
}

/// Requirements a peer's report must meet beyond a valid signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportPolicy {
    /// Lowest accepted security version
    pub min_security_version: u32,
    /// Required product id, if any
    pub product_id: Option<Vec<u8>>,
    /// Accept reports from debug enclaves
    pub allow_debug: bool,
}

impl Default for ReportPolicy {
    fn default() -> Self {
        Self {
            min_security_version: 1,
            product_id: None,
            allow_debug: false,
        }
    }
}

/// Pads or truncates `data` to [`REPORT_DATA_LEN`] bytes.
#[must_use]
pub fn to_report_data(data: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; REPORT_DATA_LEN];
    let n = data.len().min(REPORT_DATA_LEN);
    out[..n].copy_from_slice(&data[..n]);
    out
}

/// Verifies a remote report produced by another enclave.
///
/// The report must be authentic, come from an enclave with unique id
/// `expected_unique_id` (lower-case hex), meet `policy`, and carry
/// `expected_data` as the prefix of its report data. Every failure is final;
/// callers must not retry.
///
/// # Errors
/// Returns [`EnclaveError::InvalidReport`] for forged or malformed reports and
/// [`EnclaveError::ReportVerification`] when a check fails.
pub fn verify_remote_report<E: Enclave + ?Sized>(
    enclave: &E,
    report: &[u8],
    expected_data: &[u8],
    expected_unique_id: &str,
    policy: &ReportPolicy,
) -> Result<Report, EnclaveError> {
    let report = enclave.verify_report_signature(report)?;

    if report.security_version < policy.min_security_version {
        return Err(EnclaveError::verification(format!(
            "security version {} is lower than the minimum {}",
            report.security_version, policy.min_security_version
        )));
    }

    if report.debug && !policy.allow_debug {
        return Err(EnclaveError::verification("report is from a debug enclave"));
    }

    if let Some(product_id) = &policy.product_id {
        if &report.product_id != product_id {
            return Err(EnclaveError::verification(format!(
                "product id mismatch: expected {}, got {}",
                hex::encode(product_id),
                hex::encode(&report.product_id)
            )));
        }
    }

    let unique_id = hex::encode(&report.unique_id);
    if unique_id != expected_unique_id.to_ascii_lowercase() {
        return Err(EnclaveError::verification(format!(
            "unique id mismatch: expected {expected_unique_id}, got {unique_id}"
        )));
    }

    if expected_data.len() > report.data.len() || !report.data.starts_with(expected_data) {
        return Err(EnclaveError::verification(
            "report data does not match the expected data",
        ));
    }

    Ok(report)
}
