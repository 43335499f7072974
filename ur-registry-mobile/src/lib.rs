//! UR Registry Mobile FFI Bindings
//!
//! This crate provides UniFFI bindings for the TRON UR registry, enabling
//! iOS (Swift) and Android (Kotlin) wallets to build sign requests, animate
//! them as QR codes and match the signatures scanned back from the device.
//!
//! # Ownership
//!
//! Every record and stateful helper is handed to the host as an `Arc`
//! object. The host owns its reference and releases it when its proxy is
//! destroyed; the core never keeps a handle the host gave it.
//!
//! # Thread Safety
//!
//! All exposed types are `Send + Sync`. Encoders, decoders and the pending
//! request table guard their state with a `Mutex`.

pub mod correlation;
pub mod encoder;
pub mod records;
pub mod scanner;

pub use correlation::{check_correlation, PendingRequestsHandle};
pub use encoder::{TransportSettings, UrEncoderHandle};
pub use records::{TronSignRequestHandle, TronSignatureHandle};
pub use scanner::{ScanProgress, SignRequestDecodeResult, SignatureDecodeResult, UrDecoderHandle};

// UniFFI scaffolding
uniffi::setup_scaffolding!();

// ============================================================================
// Error Types
// ============================================================================

/// Mobile-friendly error type.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum UrMobileError {
    /// A record could not be built from the given values.
    #[error("Validation error: {msg}")]
    Validation { msg: String },

    /// Scanned text or bytes did not parse.
    #[error("Decode error: {msg}")]
    Decode { msg: String },

    /// The scan is inconsistent and must be restarted.
    #[error("Corruption error: {msg}")]
    Corruption { msg: String },

    /// A valid signature answers a different request.
    #[error("Correlation mismatch: {msg}")]
    CorrelationMismatch {
        msg: String,
        /// Display form of the outstanding request id, when unambiguous.
        expected: Option<String>,
        /// Display form of the id carried by the signature.
        actual: String,
    },

    /// Internal error (unexpected state).
    #[error("Internal error: {msg}")]
    Internal { msg: String },
}

impl From<ur_registry::Error> for UrMobileError {
    fn from(e: ur_registry::Error) -> Self {
        let msg = e.to_string();
        match e {
            ur_registry::Error::Validation { .. } => Self::Validation { msg },
            ur_registry::Error::Decode(_) => Self::Decode { msg },
            ur_registry::Error::Corruption(_) => Self::Corruption { msg },
            ur_registry::Error::CorrelationMismatch { expected, actual } => {
                Self::CorrelationMismatch {
                    msg,
                    expected: expected.map(|id| id.to_string()),
                    actual: actual.to_string(),
                }
            }
        }
    }
}

impl UrMobileError {
    /// Numeric code shared with the core library.
    pub fn code(&self) -> i32 {
        use ur_registry::ErrorCode;

        match self {
            Self::Validation { .. } => ErrorCode::Validation as i32,
            Self::Decode { .. } => ErrorCode::Decode as i32,
            Self::Corruption { .. } => ErrorCode::Corruption as i32,
            Self::CorrelationMismatch { .. } => ErrorCode::CorrelationMismatch as i32,
            Self::Internal { .. } => 5000,
        }
    }

    pub(crate) fn lock_poisoned() -> Self {
        Self::Internal {
            msg: "Lock poisoned".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, UrMobileError>;

// ============================================================================
// Request Id Helpers
// ============================================================================

/// Generate a fresh request id as 32 hex digits.
#[uniffi::export]
pub fn generate_request_id() -> String {
    ur_registry::correlation::RequestId::generate().to_hex()
}

/// Convert a hex request id to the hyphenated form shown to users.
#[uniffi::export]
pub fn request_id_to_uuid(request_id_hex: String) -> Result<String> {
    Ok(ur_registry::correlation::hex_to_uuid_string(&request_id_hex)?)
}

/// Convert a hyphenated request id back to 32 hex digits.
#[uniffi::export]
pub fn uuid_to_request_id(uuid: String) -> Result<String> {
    Ok(ur_registry::correlation::uuid_string_to_hex(&uuid)?)
}

pub(crate) fn parse_request_id(value: &str) -> Result<ur_registry::correlation::RequestId> {
    Ok(value.parse()?)
}

pub(crate) fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>> {
    let trimmed = value.trim();
    let trimmed = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex::decode(trimmed).map_err(|e| UrMobileError::Validation {
        msg: format!("{} is not valid hex: {}", field, e),
    })
}
