//! Sign request and signature records.
//!
//! Byte fields cross the boundary as lowercase hex; request ids are accepted
//! as 32 hex digits or in the hyphenated display form.

use std::sync::Arc;

use ur_registry::keypath::Fingerprint;
use ur_registry::registry::tron::{TronSignRequest, TronSignature};

use crate::encoder::UrEncoderHandle;
use crate::{decode_hex, parse_request_id, Result};

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Create a TRON sign request.
///
/// A missing or empty `request_id` is generated. Empty `address` and
/// `origin` are treated as unspecified. `data_type` is 1 (transaction),
/// 2 (message) or 3 (typed data).
#[uniffi::export]
pub fn new_tron_sign_request(
    request_id: Option<String>,
    sign_data_hex: String,
    path: String,
    xfp: u32,
    address: Option<String>,
    origin: Option<String>,
    data_type: u32,
) -> Result<Arc<TronSignRequestHandle>> {
    let mut builder = TronSignRequest::builder()
        .sign_data(decode_hex("sign_data", &sign_data_hex)?)
        .data_type(data_type)
        .derivation_path(path)
        .source_fingerprint(Fingerprint::from(xfp));
    if let Some(id) = non_empty(request_id) {
        builder = builder.request_id(parse_request_id(&id)?);
    }
    if let Some(address) = non_empty(address) {
        builder = builder.address(address);
    }
    if let Some(origin) = non_empty(origin) {
        builder = builder.origin(origin);
    }
    let request = builder.build()?;

    #[cfg(feature = "tracing")]
    tracing::debug!(request_id = %request.request_id(), "created sign request");

    Ok(TronSignRequestHandle::wrap(request))
}

/// Create the device's answer to a sign request.
#[uniffi::export]
pub fn new_tron_signature(request_id: String, signature_hex: String) -> Result<Arc<TronSignatureHandle>> {
    let signature = TronSignature::new(
        parse_request_id(&request_id)?,
        decode_hex("signature", &signature_hex)?,
    )?;
    Ok(TronSignatureHandle::wrap(signature))
}

/// Immutable TRON sign request.
#[derive(Debug, uniffi::Object)]
pub struct TronSignRequestHandle {
    inner: TronSignRequest,
}

impl TronSignRequestHandle {
    pub(crate) fn wrap(inner: TronSignRequest) -> Arc<Self> {
        Arc::new(Self { inner })
    }

    pub fn as_record(&self) -> &TronSignRequest {
        &self.inner
    }
}

#[uniffi::export]
impl TronSignRequestHandle {
    pub fn request_id_hex(&self) -> String {
        self.inner.request_id().to_hex()
    }

    /// Hyphenated form for display.
    pub fn request_id_uuid(&self) -> String {
        self.inner.request_id().to_uuid_string()
    }

    pub fn sign_data_hex(&self) -> String {
        self.inner.sign_data_hex()
    }

    pub fn data_type(&self) -> u32 {
        self.inner.data_type().to_u32()
    }

    /// e.g. `m/44'/195'/0'/0/0`
    pub fn derivation_path(&self) -> String {
        self.inner.derivation_path().to_string()
    }

    pub fn source_fingerprint(&self) -> u32 {
        self.inner.source_fingerprint().to_u32()
    }

    pub fn source_fingerprint_hex(&self) -> String {
        self.inner.source_fingerprint().to_hex()
    }

    /// Empty when unspecified.
    pub fn address(&self) -> String {
        self.inner.address().to_string()
    }

    /// Empty when unspecified.
    pub fn origin(&self) -> String {
        self.inner.origin().to_string()
    }

    pub fn cbor_hex(&self) -> Result<String> {
        Ok(hex::encode(self.inner.to_cbor_bytes()?))
    }

    pub fn ur_string(&self) -> Result<String> {
        Ok(self.inner.to_ur_string()?)
    }

    /// Encoder for animated display; `None` uses the default fragment length.
    pub fn ur_encoder(&self, max_fragment_len: Option<u32>) -> Result<Arc<UrEncoderHandle>> {
        UrEncoderHandle::for_ur(&self.inner.to_ur()?, max_fragment_len)
    }
}

/// Immutable TRON signature.
#[derive(Debug, uniffi::Object)]
pub struct TronSignatureHandle {
    inner: TronSignature,
}

impl TronSignatureHandle {
    pub(crate) fn wrap(inner: TronSignature) -> Arc<Self> {
        Arc::new(Self { inner })
    }

    pub fn as_record(&self) -> &TronSignature {
        &self.inner
    }
}

#[uniffi::export]
impl TronSignatureHandle {
    pub fn request_id_hex(&self) -> String {
        self.inner.request_id().to_hex()
    }

    pub fn request_id_uuid(&self) -> String {
        self.inner.request_id().to_uuid_string()
    }

    /// r || s || v, 65 bytes.
    pub fn signature_hex(&self) -> String {
        self.inner.signature_hex()
    }

    pub fn r_hex(&self) -> String {
        hex::encode(self.inner.r())
    }

    pub fn s_hex(&self) -> String {
        hex::encode(self.inner.s())
    }

    pub fn v(&self) -> u8 {
        self.inner.v()
    }

    pub fn ur_string(&self) -> Result<String> {
        Ok(self.inner.to_ur_string()?)
    }

    pub fn ur_encoder(&self, max_fragment_len: Option<u32>) -> Result<Arc<UrEncoderHandle>> {
        UrEncoderHandle::for_ur(&self.inner.to_ur()?, max_fragment_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UrMobileError;

    #[test]
    fn test_new_request_generates_id_and_ignores_empty_strings() {
        let request = new_tron_sign_request(
            None,
            "0a027a69".into(),
            "m/44'/195'/0'/0/0".into(),
            0x1234_5678,
            Some(String::new()),
            Some("tronlink".into()),
            1,
        )
        .unwrap();
        assert_eq!(request.request_id_hex().len(), 32);
        assert_eq!(request.address(), "");
        assert_eq!(request.origin(), "tronlink");
        assert_eq!(request.source_fingerprint_hex(), "12345678");
        assert_eq!(request.derivation_path(), "m/44'/195'/0'/0/0");
    }

    #[test]
    fn test_optional_text_matches_core_builder() {
        let request = new_tron_sign_request(
            None,
            "0a02".into(),
            "m/44'/195'/0'/0/0".into(),
            1,
            Some(" ".into()),
            Some("\t".into()),
            1,
        )
        .unwrap();
        let core = TronSignRequest::builder()
            .request_id(*request.as_record().request_id())
            .sign_data(vec![0x0a, 0x02])
            .data_type(1)
            .derivation_path("m/44'/195'/0'/0/0")
            .source_fingerprint(Fingerprint::from(1u32))
            .address(" ")
            .origin("\t")
            .build()
            .unwrap();
        assert_eq!(request.as_record(), &core);
        assert_eq!(request.address(), " ");

        let err = new_tron_sign_request(Some("  ".into()), "01".into(), "m/44'".into(), 1, None, None, 1)
            .unwrap_err();
        assert!(matches!(err, UrMobileError::Validation { .. }));
    }

    #[test]
    fn test_new_request_accepts_either_id_form() {
        let id = "9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d";
        let make = |id: &str| {
            new_tron_sign_request(Some(id.into()), "01".into(), "m/44'/195'/0'".into(), 1, None, None, 2)
                .unwrap()
        };
        assert_eq!(make(id).request_id_uuid(), id);
        assert_eq!(
            make("9b1deb4d3b7d4bad9bdd2b0d7b3dcb6d").request_id_uuid(),
            id
        );
    }

    #[test]
    fn test_validation_errors() {
        let err = new_tron_sign_request(None, "".into(), "m/44'".into(), 1, None, None, 1).unwrap_err();
        assert!(matches!(err, UrMobileError::Validation { .. }));
        let err = new_tron_sign_request(None, "01".into(), "m/44'".into(), 1, None, None, 9).unwrap_err();
        assert!(matches!(err, UrMobileError::Validation { .. }));
        let err = new_tron_signature(generate_id(), "00".repeat(64)).unwrap_err();
        assert!(matches!(err, UrMobileError::Validation { .. }));
    }

    #[test]
    fn test_signature_accessors() {
        let raw = format!("{}{}{}", "aa".repeat(32), "bb".repeat(32), "1b");
        let signature = new_tron_signature(generate_id(), raw.clone()).unwrap();
        assert_eq!(signature.signature_hex(), raw);
        assert_eq!(signature.r_hex(), "aa".repeat(32));
        assert_eq!(signature.s_hex(), "bb".repeat(32));
        assert_eq!(signature.v(), 0x1b);
        assert!(signature.ur_string().unwrap().starts_with("ur:tron-signature/"));
    }

    fn generate_id() -> String {
        crate::generate_request_id()
    }
}
