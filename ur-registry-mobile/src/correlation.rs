//! Matching scanned signatures to outstanding requests.

use std::sync::{Arc, Mutex, MutexGuard};

use ur_registry::correlation::{ensure_correlated, PendingRequests};

use crate::records::{TronSignRequestHandle, TronSignatureHandle};
use crate::{parse_request_id, Result, UrMobileError};

/// Check that `signature` answers `request`.
#[uniffi::export]
pub fn check_correlation(
    request: Arc<TronSignRequestHandle>,
    signature: Arc<TronSignatureHandle>,
) -> Result<()> {
    ensure_correlated(request.as_record(), signature.as_record())?;
    Ok(())
}

/// Thread-safe table of requests awaiting a signature.
///
/// One instance per wallet session; create it once and share the `Arc`.
#[derive(uniffi::Object, Default)]
pub struct PendingRequestsHandle {
    inner: Mutex<PendingRequests>,
}

impl PendingRequestsHandle {
    fn lock(&self) -> Result<MutexGuard<'_, PendingRequests>> {
        self.inner.lock().map_err(|_| UrMobileError::lock_poisoned())
    }
}

#[uniffi::export]
impl PendingRequestsHandle {
    #[uniffi::constructor]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Start waiting for `request`. Tracking the same id twice replaces it.
    pub fn track(&self, request: Arc<TronSignRequestHandle>) -> Result<()> {
        self.lock()?.track(request.as_record().clone());
        Ok(())
    }

    /// Match a scanned signature and stop tracking its request.
    pub fn resolve(
        &self,
        signature: Arc<TronSignatureHandle>,
    ) -> Result<Arc<TronSignRequestHandle>> {
        let request = self.lock()?.resolve(signature.as_record())?;
        Ok(TronSignRequestHandle::wrap(request))
    }

    /// Returns whether a request with this id was pending.
    pub fn cancel(&self, request_id: String) -> Result<bool> {
        let id = parse_request_id(&request_id)?;
        Ok(self.lock()?.cancel(&id).is_some())
    }

    pub fn contains(&self, request_id: String) -> Result<bool> {
        let id = parse_request_id(&request_id)?;
        Ok(self.lock()?.contains(&id))
    }

    pub fn pending_count(&self) -> Result<u32> {
        Ok(u32::try_from(self.lock()?.len()).unwrap_or(u32::MAX))
    }

    /// Pending ids as 32 hex digits, sorted.
    pub fn pending_ids(&self) -> Result<Vec<String>> {
        let mut ids = self.lock()?.ids();
        ids.sort();
        Ok(ids.iter().map(|id| id.to_hex()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{new_tron_sign_request, new_tron_signature};

    fn request() -> Arc<TronSignRequestHandle> {
        new_tron_sign_request(None, "0a02".into(), "m/44'/195'/0'/0/0".into(), 1, None, None, 1)
            .unwrap()
    }

    fn answer(request: &TronSignRequestHandle) -> Arc<TronSignatureHandle> {
        new_tron_signature(request.request_id_hex(), "11".repeat(65)).unwrap()
    }

    #[test]
    fn test_check_correlation() {
        let a = request();
        let b = request();
        assert!(check_correlation(a.clone(), answer(&a)).is_ok());
        match check_correlation(a.clone(), answer(&b)) {
            Err(UrMobileError::CorrelationMismatch {
                expected, actual, ..
            }) => {
                assert_eq!(expected, Some(a.request_id_uuid()));
                assert_eq!(actual, b.request_id_uuid());
            }
            other => panic!("expected mismatch, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_pending_lifecycle() {
        let pending = PendingRequestsHandle::new();
        let a = request();
        let b = request();
        pending.track(a.clone()).unwrap();
        pending.track(b.clone()).unwrap();
        assert_eq!(pending.pending_count().unwrap(), 2);
        assert!(pending.contains(a.request_id_uuid()).unwrap());

        let resolved = pending.resolve(answer(&a)).unwrap();
        assert_eq!(resolved.request_id_hex(), a.request_id_hex());
        assert!(pending.resolve(answer(&a)).is_err());

        assert!(pending.cancel(b.request_id_hex()).unwrap());
        assert!(!pending.cancel(b.request_id_hex()).unwrap());
        assert!(pending.pending_ids().unwrap().is_empty());
        assert!(matches!(
            pending.resolve(answer(&b)),
            Err(UrMobileError::CorrelationMismatch { .. })
        ));
    }
}
