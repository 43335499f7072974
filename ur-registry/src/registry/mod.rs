//! UR type registry.
//!
//! Maps UR type names to resolvers that decode the CBOR payload into a typed
//! record. The registry uses `RwLock` for thread-safe access; a poisoned lock
//! is recovered rather than propagated since the table holds plain function
//! pointers.
//!
//! # Example
//!
//! ```
//! use ur_registry::registry::{RegistryItem, UrTypeRegistry};
//! use ur_registry::registry::tron::TronSignature;
//! use ur_registry::correlation::RequestId;
//!
//! let signature = TronSignature::new(RequestId::generate(), vec![0u8; 65]).unwrap();
//! let ur = signature.to_ur().unwrap();
//!
//! let registry = UrTypeRegistry::with_defaults();
//! match registry.resolve(&ur).unwrap() {
//!     RegistryItem::TronSignature(decoded) => assert_eq!(decoded, signature),
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

pub mod tron;

use std::collections::HashMap;
use std::sync::RwLock;

use crate::cbor::RecordCodec;
use crate::ur::Ur;
use crate::{Error, Result};

use tron::{TronSignRequest, TronSignature};

/// A decoded registry record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryItem {
    TronSignRequest(TronSignRequest),
    TronSignature(TronSignature),
}

impl RegistryItem {
    /// UR type the record is encoded under.
    pub fn ur_type(&self) -> &'static str {
        match self {
            Self::TronSignRequest(_) => TronSignRequest::UR_TYPE,
            Self::TronSignature(_) => TronSignature::UR_TYPE,
        }
    }
}

impl From<TronSignRequest> for RegistryItem {
    fn from(request: TronSignRequest) -> Self {
        Self::TronSignRequest(request)
    }
}

impl From<TronSignature> for RegistryItem {
    fn from(signature: TronSignature) -> Self {
        Self::TronSignature(signature)
    }
}

/// Decodes the payload of a [`Ur`] whose type has already been matched.
pub type Resolver = fn(&[u8]) -> Result<RegistryItem>;

/// Registry of UR types this library can decode.
pub struct UrTypeRegistry {
    resolvers: RwLock<HashMap<String, Resolver>>,
}

impl UrTypeRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            resolvers: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a registry with the TRON record types.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(TronSignRequest::UR_TYPE, |cbor| {
            TronSignRequest::from_cbor_bytes(cbor).map(RegistryItem::from)
        });
        registry.register(TronSignature::UR_TYPE, |cbor| {
            TronSignature::from_cbor_bytes(cbor).map(RegistryItem::from)
        });
        registry
    }

    /// Registers a resolver, replacing any existing one for the same type.
    pub fn register(&self, ur_type: impl Into<String>, resolver: Resolver) {
        let mut resolvers = self.resolvers.write().unwrap_or_else(|e| e.into_inner());
        resolvers.insert(ur_type.into(), resolver);
    }

    pub fn unregister(&self, ur_type: &str) -> Option<Resolver> {
        let mut resolvers = self.resolvers.write().unwrap_or_else(|e| e.into_inner());
        resolvers.remove(ur_type)
    }

    pub fn get(&self, ur_type: &str) -> Option<Resolver> {
        let resolvers = self.resolvers.read().unwrap_or_else(|e| e.into_inner());
        resolvers.get(ur_type).copied()
    }

    pub fn contains(&self, ur_type: &str) -> bool {
        self.get(ur_type).is_some()
    }

    /// Registered type names, sorted.
    pub fn types(&self) -> Vec<String> {
        let resolvers = self.resolvers.read().unwrap_or_else(|e| e.into_inner());
        let mut types: Vec<String> = resolvers.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        let resolvers = self.resolvers.read().unwrap_or_else(|e| e.into_inner());
        resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode a UR into a typed record.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, ur), fields(ur_type = ur.ur_type())))]
    pub fn resolve(&self, ur: &Ur) -> Result<RegistryItem> {
        let resolver = self
            .get(ur.ur_type())
            .ok_or_else(|| Error::decode(format!("unsupported UR type '{}'", ur.ur_type())))?;
        resolver(ur.cbor())
    }
}

impl Default for UrTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for UrTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrTypeRegistry")
            .field("types", &self.types())
            .finish()
    }
}

/// Process-wide registry, created with the default types on first use.
///
/// Prefer an owned [`UrTypeRegistry`] where the set of types differs between
/// callers.
pub mod global {
    use super::*;
    use std::sync::OnceLock;

    static GLOBAL_REGISTRY: OnceLock<UrTypeRegistry> = OnceLock::new();

    pub fn registry() -> &'static UrTypeRegistry {
        GLOBAL_REGISTRY.get_or_init(UrTypeRegistry::with_defaults)
    }

    pub fn register(ur_type: impl Into<String>, resolver: Resolver) {
        registry().register(ur_type, resolver);
    }

    pub fn resolve(ur: &Ur) -> Result<RegistryItem> {
        registry().resolve(ur)
    }
}
