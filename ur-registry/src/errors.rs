//! Error types for UR registry operations.
//!
//! The taxonomy follows the lifecycle of a record:
//! - [`Error::Validation`] is raised while constructing a record, before any
//!   encoding happens.
//! - [`Error::Decode`] is raised only while parsing wire bytes or UR strings.
//! - [`Error::Corruption`] is raised only by the fragment decoder and means the
//!   reconstruction must be discarded and captured again.
//! - [`Error::CorrelationMismatch`] is not an integrity failure; it tells the
//!   caller that a well-formed response answers some other request.

use crate::correlation::RequestId;

/// Error codes for FFI and mobile integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    /// A record violates a data model constraint
    Validation = 1000,
    /// Wire bytes or UR text did not parse
    Decode = 2000,
    /// Fragment reconstruction is inconsistent
    Corruption = 3000,
    /// Response does not answer the outstanding request
    CorrelationMismatch = 4000,
}

/// Comprehensive error type for UR registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A constructed record violates a data model constraint.
    #[error("Validation error: {field}: {reason}")]
    Validation {
        /// Field or parameter name
        field: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Wire bytes do not parse into a valid record.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Fragment checksum mismatch or conflicting fragment content.
    #[error("Corruption error: {0}")]
    Corruption(String),

    /// A decoded response carries a different request id.
    #[error("Correlation mismatch: response {actual} does not answer {}", describe_expected(.expected))]
    CorrelationMismatch {
        /// Id of the outstanding request, when there is exactly one
        expected: Option<RequestId>,
        /// Id carried by the response
        actual: RequestId,
    },
}

impl Error {
    /// Get the error code for FFI/mobile integration.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { .. } => ErrorCode::Validation,
            Self::Decode(_) => ErrorCode::Decode,
            Self::Corruption(_) => ErrorCode::Corruption,
            Self::CorrelationMismatch { .. } => ErrorCode::CorrelationMismatch,
        }
    }

    /// Whether the host should drop the current scan and start over.
    pub fn requires_rescan(&self) -> bool {
        matches!(self, Self::Corruption(_))
    }

    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        Self::Decode(reason.into())
    }

    pub(crate) fn corruption(reason: impl Into<String>) -> Self {
        Self::Corruption(reason.into())
    }
}

fn describe_expected(expected: &Option<RequestId>) -> String {
    match expected {
        Some(id) => id.to_string(),
        None => "any pending request".to_string(),
    }
}

impl From<serde_cbor::Error> for Error {
    fn from(e: serde_cbor::Error) -> Self {
        Self::Decode(format!("CBOR: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            Error::validation("sign_data", "empty").code(),
            ErrorCode::Validation
        );
        assert_eq!(Error::decode("truncated").code(), ErrorCode::Decode);
        assert_eq!(Error::corruption("crc").code() as i32, 3000);
    }

    #[test]
    fn test_only_corruption_requires_rescan() {
        assert!(Error::corruption("crc").requires_rescan());
        assert!(!Error::decode("bad word").requires_rescan());
        assert!(!Error::validation("path", "empty").requires_rescan());
    }

    #[test]
    fn test_display() {
        let err = Error::validation("data_type", "unknown value 4");
        assert_eq!(
            err.to_string(),
            "Validation error: data_type: unknown value 4"
        );
    }
}
