//! Prelude module for convenient imports.
//!
//! ```
//! use ur_registry::prelude::*;
//!
//! let request = TronSignRequest::builder()
//!     .sign_data(vec![0x0a, 0x02])
//!     .data_type(1)
//!     .derivation_path("m/44'/195'/0'/0/0")
//!     .source_fingerprint(Fingerprint::from(0x1234_5678u32))
//!     .build()
//!     .unwrap();
//! assert!(request.to_ur_string().unwrap().starts_with("ur:tron-sign-request/"));
//! ```

// Records
pub use crate::registry::tron::{DataType, TronSignRequest, TronSignature};
pub use crate::keypath::{DerivationPath, Fingerprint};

// Correlation
pub use crate::correlation::{correlate, Correlation, PendingRequests, RequestId};

// Transport
pub use crate::config::TransportConfig;
pub use crate::fountain::DecodeStatus;
pub use crate::ur::{Ur, UrDecoder, UrEncoder};

// Registry
pub use crate::registry::{RegistryItem, UrTypeRegistry};

// Error handling
pub use crate::errors::{Error, ErrorCode};
pub use crate::Result;
