//! Deterministic CBOR codec for registry records.
//!
//! Records are CBOR maps from small unsigned integer keys to typed values.
//! Encoding goes through [`serde_cbor::Value`], whose map type is a
//! `BTreeMap` ordered by canonical CBOR rules, so the byte output depends only
//! on the record contents and never on insertion order. Integers and lengths
//! are always written in their shortest form.
//!
//! Decoding is strict: the top level must be a map, every key must be known
//! to the schema, required keys must be present with the right shape, and
//! nothing may follow the record.

use std::collections::BTreeMap;

use serde_cbor::Value;

use crate::{Error, Result};

/// A record with a fixed CBOR map schema.
pub trait RecordCodec: Sized {
    /// UR type name the record travels under.
    const UR_TYPE: &'static str;

    /// Build the CBOR value for this record.
    fn to_cbor(&self) -> Value;

    /// Parse and validate a CBOR value.
    fn from_cbor(value: Value) -> Result<Self>;
}

/// Serialize a record to canonical CBOR bytes.
pub fn encode<R: RecordCodec>(record: &R) -> Result<Vec<u8>> {
    to_bytes(&record.to_cbor())
}

/// Parse CBOR bytes into a record, rejecting trailing data.
#[cfg_attr(feature = "tracing", tracing::instrument(skip(bytes), fields(ur_type = R::UR_TYPE, len = bytes.len())))]
pub fn decode<R: RecordCodec>(bytes: &[u8]) -> Result<R> {
    R::from_cbor(from_bytes(bytes)?)
}

/// Serialize a value built by this crate.
///
/// Writing into a `Vec` cannot fail on I/O, so any error here means the
/// record itself produced an unencodable value.
pub(crate) fn to_bytes(value: &Value) -> Result<Vec<u8>> {
    serde_cbor::to_vec(value).map_err(encode_failure)
}

fn encode_failure(e: serde_cbor::Error) -> Error {
    Error::validation("record", format!("CBOR encode: {}", e))
}

pub(crate) fn from_bytes(bytes: &[u8]) -> Result<Value> {
    if bytes.is_empty() {
        return Err(Error::decode("empty input"));
    }
    Ok(serde_cbor::from_slice(bytes)?)
}

/// Build a map value from integer-keyed entries.
pub(crate) fn map<I>(entries: I) -> Value
where
    I: IntoIterator<Item = (u64, Value)>,
{
    Value::Map(
        entries
            .into_iter()
            .map(|(k, v)| (Value::Integer(k.into()), v))
            .collect(),
    )
}

pub(crate) fn uint(v: impl Into<u64>) -> Value {
    Value::Integer(i128::from(v.into()))
}

/// Reads a schema'd CBOR map, consuming known keys as it goes.
pub(crate) struct MapReader {
    record: &'static str,
    entries: BTreeMap<Value, Value>,
}

impl MapReader {
    pub(crate) fn new(record: &'static str, value: Value) -> Result<Self> {
        match value {
            Value::Map(entries) => Ok(Self { record, entries }),
            other => Err(Error::decode(format!(
                "{}: expected map, found {}",
                record,
                kind(&other)
            ))),
        }
    }

    pub(crate) fn take(&mut self, key: u64) -> Option<Value> {
        self.entries.remove(&Value::Integer(key.into()))
    }

    pub(crate) fn required(&mut self, key: u64, field: &str) -> Result<Value> {
        self.take(key)
            .ok_or_else(|| Error::decode(format!("{}: missing {} (key {})", self.record, field, key)))
    }

    pub(crate) fn bytes(&mut self, key: u64, field: &str) -> Result<Vec<u8>> {
        let value = self.required(key, field)?;
        as_bytes(value, field)
    }

    pub(crate) fn uint(&mut self, key: u64, field: &str) -> Result<u64> {
        let value = self.required(key, field)?;
        as_uint(&value, field)
    }

    pub(crate) fn optional_text(&mut self, key: u64, field: &str) -> Result<Option<String>> {
        self.take(key).map(|v| as_text(v, field)).transpose()
    }

    /// Fails if any key was not consumed.
    pub(crate) fn finish(self) -> Result<()> {
        match self.entries.keys().next() {
            None => Ok(()),
            Some(Value::Integer(k)) => Err(Error::decode(format!(
                "{}: unknown key {}",
                self.record, k
            ))),
            Some(other) => Err(Error::decode(format!(
                "{}: unexpected {} key",
                self.record,
                kind(other)
            ))),
        }
    }
}

pub(crate) fn as_bytes(value: Value, field: &str) -> Result<Vec<u8>> {
    match value {
        Value::Bytes(b) => Ok(b),
        other => Err(shape(field, "byte string", &other)),
    }
}

pub(crate) fn as_text(value: Value, field: &str) -> Result<String> {
    match value {
        Value::Text(s) => Ok(s),
        other => Err(shape(field, "text", &other)),
    }
}

pub(crate) fn as_uint(value: &Value, field: &str) -> Result<u64> {
    match value {
        Value::Integer(i) => u64::try_from(*i)
            .map_err(|_| Error::decode(format!("{}: integer {} out of range", field, i))),
        other => Err(shape(field, "unsigned integer", other)),
    }
}

pub(crate) fn as_u32(value: &Value, field: &str) -> Result<u32> {
    let v = as_uint(value, field)?;
    u32::try_from(v).map_err(|_| Error::decode(format!("{}: {} does not fit in 32 bits", field, v)))
}

pub(crate) fn as_bool(value: &Value, field: &str) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(shape(field, "bool", other)),
    }
}

pub(crate) fn as_array(value: Value, field: &str) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(shape(field, "array", &other)),
    }
}

fn shape(field: &str, expected: &str, found: &Value) -> Error {
    Error::decode(format!("{}: expected {}, found {}", field, expected, kind(found)))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Integer(_) => "integer",
        Value::Float(_) => "float",
        Value::Bytes(_) => "byte string",
        Value::Text(_) => "text",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
        Value::Tag(..) => "tag",
        _ => "unsupported value",
    }
}
