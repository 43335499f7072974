//! QR Code Scanner Integration
//!
//! Mobile apps scan animated QR codes and pass each raw string to a
//! [`UrDecoderHandle`], or hand a whole batch of captured strings to
//! [`decode_tron_signature`] / [`decode_tron_sign_request`].
//!
//! # Example
//!
//! ```ignore
//! // From Swift/Kotlin, once per captured frame
//! let progress = try decoder.receive(part: scannedText)
//! if progress.complete {
//!     let signature = try decoder.tronSignature()
//! }
//! ```

use std::sync::{Arc, Mutex};

use ur_registry::fountain::DecodeStatus;
use ur_registry::registry::tron::{TronSignRequest, TronSignature};
use ur_registry::ur::{Ur, UrDecoder};

use crate::records::{TronSignRequestHandle, TronSignatureHandle};
use crate::{Result, UrMobileError};

/// Scan progress after a frame.
#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct ScanProgress {
    pub complete: bool,
    /// Fragments recovered so far
    pub received: u32,
    /// Fragments in the message; 0 before the first part
    pub expected: u32,
    /// 0.0 to 1.0
    pub fraction: f64,
    pub ur_type: Option<String>,
}

/// Outcome of decoding a batch of signature parts.
#[derive(uniffi::Enum)]
pub enum SignatureDecodeResult {
    Incomplete { received: u32, expected: u32 },
    Complete { signature: Arc<TronSignatureHandle> },
}

/// Outcome of decoding a batch of sign request parts.
#[derive(uniffi::Enum)]
pub enum SignRequestDecodeResult {
    Incomplete { received: u32, expected: u32 },
    Complete { request: Arc<TronSignRequestHandle> },
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Feed every part to a fresh decoder.
///
/// Unreadable strings (a stray QR code, a misread frame) are skipped; only
/// corruption fails the batch.
fn decode_batch(parts: &[String]) -> Result<DecodeStatus<Ur>> {
    let mut decoder = UrDecoder::new();
    for part in parts {
        match decoder.receive(part) {
            Ok(DecodeStatus::Complete(ur)) => return Ok(DecodeStatus::Complete(ur)),
            Ok(DecodeStatus::Incomplete { .. }) => {}
            Err(e) if e.requires_rescan() => return Err(e.into()),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_e, "skipping unreadable part");
            }
        }
    }
    Ok(DecodeStatus::Incomplete {
        received: decoder.received_count(),
        expected: decoder.expected_count(),
    })
}

/// Decode a signature from the parts scanned so far.
#[uniffi::export]
pub fn decode_tron_signature(parts: Vec<String>) -> Result<SignatureDecodeResult> {
    Ok(match decode_batch(&parts)? {
        DecodeStatus::Incomplete { received, expected } => SignatureDecodeResult::Incomplete {
            received: to_u32(received),
            expected: to_u32(expected),
        },
        DecodeStatus::Complete(ur) => SignatureDecodeResult::Complete {
            signature: TronSignatureHandle::wrap(TronSignature::from_ur(&ur)?),
        },
    })
}

/// Decode a sign request from the parts scanned so far (device side).
#[uniffi::export]
pub fn decode_tron_sign_request(parts: Vec<String>) -> Result<SignRequestDecodeResult> {
    Ok(match decode_batch(&parts)? {
        DecodeStatus::Incomplete { received, expected } => SignRequestDecodeResult::Incomplete {
            received: to_u32(received),
            expected: to_u32(expected),
        },
        DecodeStatus::Complete(ur) => SignRequestDecodeResult::Complete {
            request: TronSignRequestHandle::wrap(TronSignRequest::from_ur(&ur)?),
        },
    })
}

/// Incremental decoder for a live camera feed.
///
/// A [`UrMobileError::Corruption`] is sticky: call [`reset`](Self::reset)
/// and ask the user to rescan.
#[derive(uniffi::Object)]
pub struct UrDecoderHandle {
    inner: Mutex<UrDecoder>,
}

impl UrDecoderHandle {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, UrDecoder>> {
        self.inner.lock().map_err(|_| UrMobileError::lock_poisoned())
    }

    fn progress_of(decoder: &UrDecoder) -> ScanProgress {
        ScanProgress {
            complete: decoder.is_complete(),
            received: to_u32(decoder.received_count()),
            expected: to_u32(decoder.expected_count()),
            fraction: decoder.progress(),
            ur_type: decoder.ur_type().map(str::to_string),
        }
    }
}

#[uniffi::export]
impl UrDecoderHandle {
    #[uniffi::constructor]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(UrDecoder::new()),
        })
    }

    /// Feed one scanned string.
    pub fn receive(&self, part: String) -> Result<ScanProgress> {
        let mut decoder = self.lock()?;
        decoder.receive(&part)?;
        Ok(Self::progress_of(&decoder))
    }

    pub fn progress(&self) -> Result<ScanProgress> {
        Ok(Self::progress_of(&*self.lock()?))
    }

    pub fn is_complete(&self) -> Result<bool> {
        Ok(self.lock()?.is_complete())
    }

    /// The scanned signature, once complete.
    pub fn tron_signature(&self) -> Result<Option<Arc<TronSignatureHandle>>> {
        let decoder = self.lock()?;
        decoder
            .result()
            .map(|ur| Ok(TronSignatureHandle::wrap(TronSignature::from_ur(ur)?)))
            .transpose()
    }

    /// The scanned sign request, once complete.
    pub fn tron_sign_request(&self) -> Result<Option<Arc<TronSignRequestHandle>>> {
        let decoder = self.lock()?;
        decoder
            .result()
            .map(|ur| Ok(TronSignRequestHandle::wrap(TronSignRequest::from_ur(ur)?)))
            .transpose()
    }

    /// Forget everything scanned, including a corruption failure.
    pub fn reset(&self) -> Result<()> {
        self.lock()?.reset();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{new_tron_sign_request, new_tron_signature};

    fn request_parts(count: usize) -> Vec<String> {
        let request = new_tron_sign_request(
            None,
            "ab".repeat(500),
            "m/44'/195'/0'/0/0".into(),
            7,
            None,
            None,
            1,
        )
        .unwrap();
        let encoder = request.ur_encoder(Some(150)).unwrap();
        (0..count).map(|_| encoder.next_part().unwrap()).collect()
    }

    #[test]
    fn test_incremental_scan() {
        let decoder = UrDecoderHandle::new();
        let parts = request_parts(4);
        for part in &parts[..3] {
            let progress = decoder.receive(part.clone()).unwrap();
            assert!(!progress.complete);
        }
        assert!(decoder.tron_sign_request().unwrap().is_none());
        let progress = decoder.receive(parts[3].clone()).unwrap();
        assert!(progress.complete);
        assert_eq!(progress.fraction, 1.0);
        assert_eq!(progress.ur_type.as_deref(), Some("tron-sign-request"));

        let request = decoder.tron_sign_request().unwrap().unwrap();
        assert_eq!(request.sign_data_hex(), "ab".repeat(500));
        assert!(matches!(
            decoder.tron_signature(),
            Err(UrMobileError::Decode { .. })
        ));
    }

    #[test]
    fn test_batch_decode() {
        let parts = request_parts(4);
        assert!(matches!(
            decode_tron_sign_request(parts[..2].to_vec()).unwrap(),
            SignRequestDecodeResult::Incomplete { received: 2, expected: 4 }
        ));
        assert!(matches!(
            decode_tron_sign_request(parts).unwrap(),
            SignRequestDecodeResult::Complete { .. }
        ));
    }

    #[test]
    fn test_single_part_signature() {
        let id = crate::generate_request_id();
        let signature = new_tron_signature(id.clone(), "07".repeat(65)).unwrap();
        let text = signature.ur_string().unwrap();
        match decode_tron_signature(vec![text]).unwrap() {
            SignatureDecodeResult::Complete { signature } => {
                assert_eq!(signature.request_id_hex(), id)
            }
            SignatureDecodeResult::Incomplete { .. } => panic!("expected a complete signature"),
        }
    }

    #[test]
    fn test_batch_skips_unreadable_strings() {
        let parts = request_parts(4);
        let mut batch = vec!["https://example.com/not-a-ur".to_string()];
        batch.extend(parts[..2].iter().cloned());
        batch.push("ur:tron-sign-request/3-4/zzzz".into());
        assert!(matches!(
            decode_tron_sign_request(batch.clone()).unwrap(),
            SignRequestDecodeResult::Incomplete { received: 2, expected: 4 }
        ));

        batch.extend(parts[2..].iter().cloned());
        assert!(matches!(
            decode_tron_sign_request(batch).unwrap(),
            SignRequestDecodeResult::Complete { .. }
        ));

        let other = request_parts(2);
        let mixed = vec![parts[0].clone(), "garbage".into(), other[1].clone()];
        assert!(matches!(
            decode_tron_sign_request(mixed),
            Err(UrMobileError::Corruption { .. })
        ));
    }

    #[test]
    fn test_corruption_and_reset() {
        let decoder = UrDecoderHandle::new();
        let a = request_parts(2);
        let b = request_parts(2);
        decoder.receive(a[0].clone()).unwrap();
        assert!(matches!(
            decoder.receive(b[1].clone()),
            Err(UrMobileError::Corruption { .. })
        ));
        assert!(decoder.receive(a[1].clone()).is_err());
        decoder.reset().unwrap();
        assert!(decoder.receive(a[1].clone()).is_ok());
        assert_eq!(decoder.progress().unwrap().received, 1);
    }
}
