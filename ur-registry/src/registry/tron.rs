//! TRON sign request and signature records.
//!
//! ```text
//! tron-sign-request = {
//!   1: bytes(16)   ; request id
//!   2: bytes       ; sign data
//!   3: uint        ; data type (1 transaction, 2 message, 3 typed data)
//!   4: keypath     ; derivation path + source fingerprint
//!   ? 5: text      ; address
//!   ? 6: text      ; origin
//! }
//!
//! tron-signature = {
//!   1: bytes(16)   ; request id
//!   2: bytes(65)   ; r || s || v
//! }
//! ```

use std::fmt;

use serde_cbor::Value;

use crate::cbor::{self, MapReader, RecordCodec};
use crate::correlation::RequestId;
use crate::keypath::{DerivationPath, Fingerprint, KeyPath};
use crate::ur::{Ur, UrEncoder};
use crate::{Error, Result};

/// UR type of a TRON sign request.
pub const TRON_SIGN_REQUEST_TYPE: &str = "tron-sign-request";

/// UR type of a TRON signature.
pub const TRON_SIGNATURE_TYPE: &str = "tron-signature";

/// Length of a recoverable secp256k1 signature: r (32) || s (32) || v (1).
pub const SIGNATURE_LEN: usize = 65;

mod request_keys {
    pub const REQUEST_ID: u64 = 1;
    pub const SIGN_DATA: u64 = 2;
    pub const DATA_TYPE: u64 = 3;
    pub const DERIVATION_PATH: u64 = 4;
    pub const ADDRESS: u64 = 5;
    pub const ORIGIN: u64 = 6;
}

mod signature_keys {
    pub const REQUEST_ID: u64 = 1;
    pub const SIGNATURE: u64 = 2;
}

/// How the signer should interpret the sign data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DataType {
    Transaction = 1,
    Message = 2,
    TypedData = 3,
}

impl DataType {
    pub fn to_u32(self) -> u32 {
        self as u32
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transaction => "transaction",
            Self::Message => "message",
            Self::TypedData => "typed-data",
        }
    }
}

impl TryFrom<u32> for DataType {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            1 => Ok(Self::Transaction),
            2 => Ok(Self::Message),
            3 => Ok(Self::TypedData),
            _ => Err(Error::validation(
                "data_type",
                format!("unknown value {}", value),
            )),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request for the offline device to sign TRON data.
///
/// Immutable once built; the request id is fixed at construction and is the
/// join key for the eventual [`TronSignature`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TronSignRequest {
    request_id: RequestId,
    sign_data: Vec<u8>,
    data_type: DataType,
    key_path: KeyPath,
    address: String,
    origin: String,
}

impl TronSignRequest {
    /// Build a request from already-validated identifiers.
    ///
    /// Fails if `sign_data` is empty or `derivation_path` does not parse.
    /// Empty `address`/`origin` are treated as unspecified.
    pub fn new(
        request_id: RequestId,
        sign_data: Vec<u8>,
        data_type: DataType,
        derivation_path: &str,
        source_fingerprint: Fingerprint,
        address: Option<String>,
        origin: Option<String>,
    ) -> Result<Self> {
        if sign_data.is_empty() {
            return Err(Error::validation("sign_data", "must not be empty"));
        }
        let path: DerivationPath = derivation_path.parse()?;
        Ok(Self {
            request_id,
            sign_data,
            data_type,
            key_path: KeyPath::new(path, source_fingerprint),
            address: address.unwrap_or_default(),
            origin: origin.unwrap_or_default(),
        })
    }

    /// Start building a request; the id is generated unless one is supplied.
    pub fn builder() -> TronSignRequestBuilder {
        TronSignRequestBuilder::default()
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn sign_data(&self) -> &[u8] {
        &self.sign_data
    }

    pub fn sign_data_hex(&self) -> String {
        hex::encode(&self.sign_data)
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn derivation_path(&self) -> &DerivationPath {
        self.key_path.path()
    }

    pub fn source_fingerprint(&self) -> Fingerprint {
        self.key_path.source_fingerprint()
    }

    /// Address the request refers to; empty when unspecified.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Name of the requesting application; empty when unspecified.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn to_cbor_bytes(&self) -> Result<Vec<u8>> {
        cbor::encode(self)
    }

    pub fn from_cbor_bytes(bytes: &[u8]) -> Result<Self> {
        cbor::decode(bytes)
    }

    pub fn to_ur(&self) -> Result<Ur> {
        Ur::from_record(self)
    }

    /// Fragment encoder for animated display.
    pub fn to_ur_encoder(&self, max_fragment_len: usize) -> Result<UrEncoder> {
        UrEncoder::new(&self.to_ur()?, max_fragment_len)
    }

    /// Single-part `ur:tron-sign-request/...` string.
    pub fn to_ur_string(&self) -> Result<String> {
        Ok(self.to_ur()?.to_string())
    }

    pub fn from_ur(ur: &Ur) -> Result<Self> {
        ur.decode_record()
    }
}

impl RecordCodec for TronSignRequest {
    const UR_TYPE: &'static str = TRON_SIGN_REQUEST_TYPE;

    fn to_cbor(&self) -> Value {
        use request_keys::*;

        let mut entries = vec![
            (REQUEST_ID, Value::Bytes(self.request_id.as_bytes().to_vec())),
            (SIGN_DATA, Value::Bytes(self.sign_data.clone())),
            (DATA_TYPE, cbor::uint(self.data_type.to_u32())),
            (DERIVATION_PATH, self.key_path.to_cbor()),
        ];
        if !self.address.is_empty() {
            entries.push((ADDRESS, Value::Text(self.address.clone())));
        }
        if !self.origin.is_empty() {
            entries.push((ORIGIN, Value::Text(self.origin.clone())));
        }
        cbor::map(entries)
    }

    fn from_cbor(value: Value) -> Result<Self> {
        use request_keys::*;

        let mut reader = MapReader::new(TRON_SIGN_REQUEST_TYPE, value)?;
        let request_id = decode_request_id(reader.bytes(REQUEST_ID, "request id")?)?;
        let sign_data = reader.bytes(SIGN_DATA, "sign data")?;
        let data_type = u32::try_from(reader.uint(DATA_TYPE, "data type")?)
            .ok()
            .and_then(|v| DataType::try_from(v).ok())
            .ok_or_else(|| Error::decode("tron-sign-request: unknown data type"))?;
        let key_path = KeyPath::from_cbor(reader.required(DERIVATION_PATH, "derivation path")?)?;
        let address = reader.optional_text(ADDRESS, "address")?.unwrap_or_default();
        let origin = reader.optional_text(ORIGIN, "origin")?.unwrap_or_default();
        reader.finish()?;

        if sign_data.is_empty() {
            return Err(Error::decode("tron-sign-request: sign data is empty"));
        }

        Ok(Self {
            request_id,
            sign_data,
            data_type,
            key_path,
            address,
            origin,
        })
    }
}

/// Builder for [`TronSignRequest`], mirroring the host-facing constructor
/// where the id and the optional strings may be absent.
#[derive(Clone, Debug, Default)]
pub struct TronSignRequestBuilder {
    request_id: Option<RequestId>,
    sign_data: Vec<u8>,
    data_type: Option<u32>,
    derivation_path: String,
    source_fingerprint: Option<Fingerprint>,
    address: Option<String>,
    origin: Option<String>,
}

impl TronSignRequestBuilder {
    pub fn request_id(mut self, id: RequestId) -> Self {
        self.request_id = Some(id);
        self
    }

    pub fn sign_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.sign_data = data.into();
        self
    }

    /// Raw data type; validated in [`build`](Self::build).
    pub fn data_type(mut self, data_type: u32) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn derivation_path(mut self, path: impl Into<String>) -> Self {
        self.derivation_path = path.into();
        self
    }

    pub fn source_fingerprint(mut self, fingerprint: Fingerprint) -> Self {
        self.source_fingerprint = Some(fingerprint);
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into()).filter(|s| !s.is_empty());
        self
    }

    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into()).filter(|s| !s.is_empty());
        self
    }

    pub fn build(self) -> Result<TronSignRequest> {
        let data_type = self
            .data_type
            .ok_or_else(|| Error::validation("data_type", "is required"))
            .and_then(DataType::try_from)?;
        let fingerprint = self
            .source_fingerprint
            .ok_or_else(|| Error::validation("source_fingerprint", "is required"))?;
        TronSignRequest::new(
            self.request_id.unwrap_or_else(RequestId::generate),
            self.sign_data,
            data_type,
            &self.derivation_path,
            fingerprint,
            self.address,
            self.origin,
        )
    }
}

/// Signature produced by the offline device for a [`TronSignRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TronSignature {
    request_id: RequestId,
    signature: [u8; SIGNATURE_LEN],
}

impl TronSignature {
    /// Fails unless `signature` is exactly 65 bytes.
    pub fn new(request_id: RequestId, signature: Vec<u8>) -> Result<Self> {
        let signature: [u8; SIGNATURE_LEN] = signature.try_into().map_err(|v: Vec<u8>| {
            Error::validation(
                "signature",
                format!("must be {} bytes, got {}", SIGNATURE_LEN, v.len()),
            )
        })?;
        Ok(Self {
            request_id,
            signature,
        })
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn signature(&self) -> &[u8; SIGNATURE_LEN] {
        &self.signature
    }

    pub fn signature_hex(&self) -> String {
        hex::encode(self.signature)
    }

    pub fn r(&self) -> &[u8] {
        &self.signature[..32]
    }

    pub fn s(&self) -> &[u8] {
        &self.signature[32..64]
    }

    /// Recovery indicator.
    pub fn v(&self) -> u8 {
        self.signature[64]
    }

    pub fn to_cbor_bytes(&self) -> Result<Vec<u8>> {
        cbor::encode(self)
    }

    pub fn from_cbor_bytes(bytes: &[u8]) -> Result<Self> {
        cbor::decode(bytes)
    }

    pub fn to_ur(&self) -> Result<Ur> {
        Ur::from_record(self)
    }

    pub fn to_ur_encoder(&self, max_fragment_len: usize) -> Result<UrEncoder> {
        UrEncoder::new(&self.to_ur()?, max_fragment_len)
    }

    pub fn to_ur_string(&self) -> Result<String> {
        Ok(self.to_ur()?.to_string())
    }

    pub fn from_ur(ur: &Ur) -> Result<Self> {
        ur.decode_record()
    }
}

impl RecordCodec for TronSignature {
    const UR_TYPE: &'static str = TRON_SIGNATURE_TYPE;

    fn to_cbor(&self) -> Value {
        use signature_keys::*;

        cbor::map([
            (REQUEST_ID, Value::Bytes(self.request_id.as_bytes().to_vec())),
            (SIGNATURE, Value::Bytes(self.signature.to_vec())),
        ])
    }

    fn from_cbor(value: Value) -> Result<Self> {
        use signature_keys::*;

        let mut reader = MapReader::new(TRON_SIGNATURE_TYPE, value)?;
        let request_id = decode_request_id(reader.bytes(REQUEST_ID, "request id")?)?;
        let signature = reader.bytes(SIGNATURE, "signature")?;
        reader.finish()?;

        let len = signature.len();
        let signature: [u8; SIGNATURE_LEN] = signature.try_into().map_err(|_| {
            Error::decode(format!(
                "tron-signature: signature must be {} bytes, got {}",
                SIGNATURE_LEN, len
            ))
        })?;
        Ok(Self {
            request_id,
            signature,
        })
    }
}

fn decode_request_id(bytes: Vec<u8>) -> Result<RequestId> {
    RequestId::try_from(bytes.as_slice()).map_err(|_| {
        Error::decode(format!(
            "request id must be 16 bytes, got {}",
            bytes.len()
        ))
    })
}
