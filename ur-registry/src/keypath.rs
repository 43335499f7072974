//! BIP-32 derivation paths and key-origin fingerprints.
//!
//! Paths are written as `m/44'/195'/0'/0/0`; a trailing `'`, `h` or `H` marks a
//! hardened component. On the wire a path travels together with the
//! fingerprint of the wallet it was derived from:
//!
//! ```text
//! { 1: [[44, true], [195, true], [0, true], [0, false], [0, false]],
//!   2: 0x12345678 }
//! ```

use std::fmt;
use std::str::FromStr;

use serde_cbor::Value;

use crate::cbor::{self, MapReader};
use crate::{Error, Result};

const COMPONENTS: u64 = 1;
const SOURCE_FINGERPRINT: u64 = 2;

/// First index that would collide with the hardened bit.
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// One step of a derivation path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PathComponent {
    index: u32,
    hardened: bool,
}

impl PathComponent {
    pub fn new(index: u32, hardened: bool) -> Result<Self> {
        if index >= HARDENED_OFFSET {
            return Err(Error::validation(
                "derivation_path",
                format!("index {} must be below 2^31", index),
            ));
        }
        Ok(Self { index, hardened })
    }

    pub fn normal(index: u32) -> Result<Self> {
        Self::new(index, false)
    }

    pub fn hardened(index: u32) -> Result<Self> {
        Self::new(index, true)
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn is_hardened(&self) -> bool {
        self.hardened
    }

    /// Index with the hardened bit folded in, as used by BIP-32 child derivation.
    pub fn child_number(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED_OFFSET
        } else {
            self.index
        }
    }
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

impl FromStr for PathComponent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (digits, hardened) = match s.strip_suffix(['\'', 'h', 'H']) {
            Some(rest) => (rest, true),
            None => (s, false),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::validation(
                "derivation_path",
                format!("invalid path component '{}'", s),
            ));
        }
        let index = digits.parse::<u32>().map_err(|_| {
            Error::validation(
                "derivation_path",
                format!("path component '{}' out of range", s),
            )
        })?;
        Self::new(index, hardened)
    }
}

/// A non-empty sequence of derivation steps.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DerivationPath(Vec<PathComponent>);

impl DerivationPath {
    pub fn new(components: Vec<PathComponent>) -> Result<Self> {
        if components.is_empty() {
            return Err(Error::validation(
                "derivation_path",
                "must contain at least one component",
            ));
        }
        Ok(Self(components))
    }

    pub fn components(&self) -> &[PathComponent] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for DerivationPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let body = s
            .strip_prefix("m/")
            .or_else(|| s.strip_prefix("M/"))
            .unwrap_or(s);
        if body.is_empty() || body == "m" || body == "M" {
            return Err(Error::validation(
                "derivation_path",
                "must contain at least one component",
            ));
        }
        let components = body
            .split('/')
            .map(PathComponent::from_str)
            .collect::<Result<Vec<_>>>()?;
        Self::new(components)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for component in &self.0 {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

/// 4-byte identifier of the wallet a key was derived from.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 4]);

impl Fingerprint {
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    pub fn to_u32(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<u32> for Fingerprint {
    fn from(value: u32) -> Self {
        Self(value.to_be_bytes())
    }
}

impl TryFrom<&[u8]> for Fingerprint {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; 4] = bytes.try_into().map_err(|_| {
            Error::validation(
                "source_fingerprint",
                format!("must be 4 bytes, got {}", bytes.len()),
            )
        })?;
        Ok(Self(arr))
    }
}

impl FromStr for Fingerprint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)
            .map_err(|e| Error::validation("source_fingerprint", format!("invalid hex: {}", e)))?;
        Self::try_from(bytes.as_slice())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

/// A derivation path anchored at a source wallet.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyPath {
    path: DerivationPath,
    source_fingerprint: Fingerprint,
}

impl KeyPath {
    pub fn new(path: DerivationPath, source_fingerprint: Fingerprint) -> Self {
        Self {
            path,
            source_fingerprint,
        }
    }

    pub fn path(&self) -> &DerivationPath {
        &self.path
    }

    pub fn source_fingerprint(&self) -> Fingerprint {
        self.source_fingerprint
    }

    pub(crate) fn to_cbor(&self) -> Value {
        let components = self
            .path
            .components()
            .iter()
            .map(|c| Value::Array(vec![cbor::uint(c.index), Value::Bool(c.hardened)]))
            .collect();
        cbor::map([
            (COMPONENTS, Value::Array(components)),
            (SOURCE_FINGERPRINT, cbor::uint(self.source_fingerprint.to_u32())),
        ])
    }

    pub(crate) fn from_cbor(value: Value) -> Result<Self> {
        let mut reader = MapReader::new("keypath", value)?;
        let items = cbor::as_array(reader.required(COMPONENTS, "components")?, "components")?;
        let components = items
            .into_iter()
            .map(decode_component)
            .collect::<Result<Vec<_>>>()?;
        let fingerprint = cbor::as_u32(
            &reader.required(SOURCE_FINGERPRINT, "source fingerprint")?,
            "source fingerprint",
        )?;
        reader.finish()?;

        let path = DerivationPath::new(components)
            .map_err(|_| Error::decode("keypath: derivation path is empty"))?;
        Ok(Self::new(path, fingerprint.into()))
    }
}

fn decode_component(value: Value) -> Result<PathComponent> {
    let pair = cbor::as_array(value, "path component")?;
    let [index, hardened]: [Value; 2] = pair.try_into().map_err(|v: Vec<Value>| {
        Error::decode(format!(
            "path component: expected [index, hardened], found {} items",
            v.len()
        ))
    })?;
    let index = cbor::as_u32(&index, "path index")?;
    let hardened = cbor::as_bool(&hardened, "path hardened flag")?;
    PathComponent::new(index, hardened).map_err(|e| Error::decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tron_path() {
        let path: DerivationPath = "m/44'/195'/0'/0/0".parse().unwrap();
        assert_eq!(path.len(), 5);
        assert!(path.components()[1].is_hardened());
        assert_eq!(path.components()[1].index(), 195);
        assert!(!path.components()[4].is_hardened());
        assert_eq!(path.components()[0].child_number(), 0x8000_002c);
        assert_eq!(path.to_string(), "m/44'/195'/0'/0/0");
    }

    #[test]
    fn test_parse_alternate_notation() {
        let a: DerivationPath = "44h/195H/0'/1/7".parse().unwrap();
        assert_eq!(a.to_string(), "m/44'/195'/0'/1/7");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "m", "m/", "m/44'//0", "m/abc", "m/-1", "m/2147483648", "m/1''"] {
            assert!(
                bad.parse::<DerivationPath>().is_err(),
                "{:?} should not parse",
                bad
            );
        }
    }

    #[test]
    fn test_fingerprint_lengths() {
        assert!(Fingerprint::try_from(&[0u8; 15][..]).is_err());
        assert!(Fingerprint::try_from(&[0u8; 3][..]).is_err());
        let fp = Fingerprint::try_from(&[0x12, 0x34, 0x56, 0x78][..]).unwrap();
        assert_eq!(fp.to_u32(), 0x1234_5678);
        assert_eq!("0x12345678".parse::<Fingerprint>().unwrap(), fp);
        assert_eq!(fp.to_string(), "12345678");
    }

    #[test]
    fn test_keypath_cbor_round_trip() {
        let keypath = KeyPath::new("m/44'/195'/0'/0/0".parse().unwrap(), 0x1234_5678u32.into());
        let back = KeyPath::from_cbor(keypath.to_cbor()).unwrap();
        assert_eq!(back, keypath);
    }

    #[test]
    fn test_keypath_cbor_rejects_bad_components() {
        let empty = cbor::map([
            (COMPONENTS, Value::Array(vec![])),
            (SOURCE_FINGERPRINT, cbor::uint(1u32)),
        ]);
        assert!(matches!(KeyPath::from_cbor(empty), Err(Error::Decode(_))));

        let flat = cbor::map([
            (COMPONENTS, Value::Array(vec![cbor::uint(44u32), Value::Bool(true)])),
            (SOURCE_FINGERPRINT, cbor::uint(1u32)),
        ]);
        assert!(KeyPath::from_cbor(flat).is_err());

        let missing_fingerprint = cbor::map([(
            COMPONENTS,
            Value::Array(vec![Value::Array(vec![cbor::uint(44u32), Value::Bool(true)])]),
        )]);
        assert!(KeyPath::from_cbor(missing_fingerprint).is_err());
    }
}
