//! Request/response correlation.
//!
//! Every sign request carries a 16-byte [`RequestId`] that the signing device
//! copies verbatim into its [`TronSignature`]. The wallet matches the two when
//! the response is scanned back, possibly minutes later and with no shared
//! call stack in between.
//!
//! # Example
//!
//! ```
//! use ur_registry::correlation::RequestId;
//!
//! let id = RequestId::generate();
//! let shown = id.to_string(); // 9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d
//! assert_eq!(shown.parse::<RequestId>().unwrap(), id);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::registry::tron::{TronSignRequest, TronSignature};
use crate::{Error, Result};

/// Length of a request id in bytes.
pub const REQUEST_ID_LEN: usize = 16;

/// 16-byte correlation identifier linking a request to its response.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId([u8; REQUEST_ID_LEN]);

impl RequestId {
    /// Generate a fresh random id (UUID v4).
    pub fn generate() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Wrap raw bytes.
    pub const fn from_bytes(bytes: [u8; REQUEST_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; REQUEST_ID_LEN] {
        &self.0
    }

    /// Lowercase hex without separators (32 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Canonical hyphenated display form (36 characters).
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).hyphenated().to_string()
    }
}

impl TryFrom<&[u8]> for RequestId {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; REQUEST_ID_LEN] = bytes.try_into().map_err(|_| {
            Error::validation(
                "request_id",
                format!("must be {} bytes, got {}", REQUEST_ID_LEN, bytes.len()),
            )
        })?;
        Ok(Self(arr))
    }
}

impl FromStr for RequestId {
    type Err = Error;

    /// Accepts 32 hex digits or the 36-character hyphenated form.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.len() {
            32 => {
                let bytes = hex::decode(s)
                    .map_err(|e| Error::validation("request_id", format!("invalid hex: {}", e)))?;
                Self::try_from(bytes.as_slice())
            }
            36 => uuid::Uuid::parse_str(s)
                .map(|u| Self(*u.as_bytes()))
                .map_err(|e| Error::validation("request_id", format!("invalid uuid: {}", e))),
            n => Err(Error::validation(
                "request_id",
                format!("expected 32 hex digits or 36-character uuid, got {} characters", n),
            )),
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uuid_string())
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({})", self)
    }
}

/// Convert a hex request id to its hyphenated display form.
pub fn hex_to_uuid_string(hex_id: &str) -> Result<String> {
    hex_id.parse::<RequestId>().map(|id| id.to_uuid_string())
}

/// Convert a hyphenated (or plain hex) id to 32 lowercase hex digits.
pub fn uuid_string_to_hex(display: &str) -> Result<String> {
    display.parse::<RequestId>().map(|id| id.to_hex())
}

/// Outcome of comparing a response against a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Correlation {
    /// The response answers the request.
    Matched,
    /// The response belongs to some other request.
    Mismatch {
        /// Id of the request
        expected: RequestId,
        /// Id carried by the response
        actual: RequestId,
    },
}

impl Correlation {
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched)
    }
}

/// Compare a response with the request it is supposed to answer.
pub fn correlate(request: &TronSignRequest, response: &TronSignature) -> Correlation {
    if request.request_id() == response.request_id() {
        Correlation::Matched
    } else {
        Correlation::Mismatch {
            expected: *request.request_id(),
            actual: *response.request_id(),
        }
    }
}

/// Like [`correlate`] but surfaces a mismatch as [`Error::CorrelationMismatch`].
pub fn ensure_correlated(request: &TronSignRequest, response: &TronSignature) -> Result<()> {
    match correlate(request, response) {
        Correlation::Matched => Ok(()),
        Correlation::Mismatch { expected, actual } => {
            Err(Error::CorrelationMismatch {
                expected: Some(expected),
                actual,
            })
        }
    }
}

/// Requests waiting for a signature, keyed by request id.
///
/// Owned by the application; there is no process-wide table. Cancelling a
/// request is just removing it, after which a late response is reported as a
/// mismatch.
#[derive(Debug, Default, Clone)]
pub struct PendingRequests {
    requests: HashMap<RequestId, TronSignRequest>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start waiting for a response to `request`.
    ///
    /// Returns the previously tracked request with the same id, if any.
    pub fn track(&mut self, request: TronSignRequest) -> Option<TronSignRequest> {
        self.requests.insert(*request.request_id(), request)
    }

    /// Match a response and stop tracking its request.
    ///
    /// An unmatched response leaves the table untouched.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, response), fields(request_id = %response.request_id())))]
    pub fn resolve(&mut self, response: &TronSignature) -> Result<TronSignRequest> {
        match self.requests.remove(response.request_id()) {
            Some(request) => Ok(request),
            None => {
                #[cfg(feature = "tracing")]
                tracing::warn!(pending = self.requests.len(), "response does not match any pending request");
                Err(Error::CorrelationMismatch {
                    expected: self.only_pending(),
                    actual: *response.request_id(),
                })
            }
        }
    }

    /// Forget a request; a late response for it will no longer match.
    pub fn cancel(&mut self, id: &RequestId) -> Option<TronSignRequest> {
        self.requests.remove(id)
    }

    pub fn get(&self, id: &RequestId) -> Option<&TronSignRequest> {
        self.requests.get(id)
    }

    pub fn contains(&self, id: &RequestId) -> bool {
        self.requests.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Ids currently awaiting a response, in no particular order.
    pub fn ids(&self) -> Vec<RequestId> {
        self.requests.keys().copied().collect()
    }

    fn only_pending(&self) -> Option<RequestId> {
        if self.requests.len() == 1 {
            self.requests.keys().next().copied()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tron::DataType;
    use std::collections::HashSet;

    fn request(id: RequestId) -> TronSignRequest {
        TronSignRequest::new(
            id,
            vec![0xde, 0xad],
            DataType::Transaction,
            "m/44'/195'/0'/0/0",
            0x1234_5678u32.into(),
            None,
            None,
        )
        .unwrap()
    }

    fn response(id: RequestId) -> TronSignature {
        TronSignature::new(id, vec![7u8; 65]).unwrap()
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: HashSet<RequestId> = (0..10_000).map(|_| RequestId::generate()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_display_forms() {
        let id = RequestId::from_bytes([
            0x9b, 0x1d, 0xeb, 0x4d, 0x3b, 0x7d, 0x4b, 0xad, 0x9b, 0xdd, 0x2b, 0x0d, 0x7b, 0x3d,
            0xcb, 0x6d,
        ]);
        assert_eq!(id.to_hex(), "9b1deb4d3b7d4bad9bdd2b0d7b3dcb6d");
        assert_eq!(id.to_string(), "9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d");
        assert_eq!(
            hex_to_uuid_string("9B1DEB4D3B7D4BAD9BDD2B0D7B3DCB6D").unwrap(),
            "9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d"
        );
        assert_eq!(
            uuid_string_to_hex("9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d").unwrap(),
            "9b1deb4d3b7d4bad9bdd2b0d7b3dcb6d"
        );
    }

    #[test]
    fn test_parse_rejects_bad_lengths() {
        assert!("abcd".parse::<RequestId>().is_err());
        assert!("zz1deb4d3b7d4bad9bdd2b0d7b3dcb6d".parse::<RequestId>().is_err());
        assert!(RequestId::try_from(&[0u8; 15][..]).is_err());
        assert!(RequestId::try_from(&[0u8; 16][..]).is_ok());
    }

    #[test]
    fn test_correlate() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        assert!(correlate(&request(a), &response(a)).is_matched());
        assert_eq!(
            correlate(&request(b), &response(a)),
            Correlation::Mismatch {
                expected: b,
                actual: a
            }
        );
        assert!(matches!(
            ensure_correlated(&request(b), &response(a)),
            Err(Error::CorrelationMismatch { .. })
        ));
    }

    #[test]
    fn test_pending_requests() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        let mut pending = PendingRequests::new();
        pending.track(request(a));
        pending.track(request(b));
        assert_eq!(pending.len(), 2);

        let stray = response(RequestId::generate());
        assert!(matches!(
            pending.resolve(&stray),
            Err(Error::CorrelationMismatch { .. })
        ));
        assert_eq!(pending.len(), 2);

        let matched = pending.resolve(&response(a)).unwrap();
        assert_eq!(matched.request_id(), &a);
        assert!(!pending.contains(&a));

        pending.cancel(&b);
        assert!(pending.resolve(&response(b)).is_err());
        assert!(pending.is_empty());
    }
}
