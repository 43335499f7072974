//! Uniform Resource registry for air-gapped TRON signing.
//!
//! A connected wallet and an offline signer exchange two records,
//! [`TronSignRequest`](registry::tron::TronSignRequest) and
//! [`TronSignature`](registry::tron::TronSignature), as CBOR payloads wrapped
//! in `ur:` strings. Payloads too large for one QR code are fountain coded
//! into an endless stream of parts that the receiver can scan in any order.
//!
//! The core is synchronous and holds no global mutable state apart from the
//! lazily built [`registry::global`] type table.
//!
//! # Example
//!
//! ```
//! use ur_registry::prelude::*;
//!
//! # fn main() -> ur_registry::Result<()> {
//! let request = TronSignRequest::builder()
//!     .sign_data(vec![0xab; 500])
//!     .data_type(1)
//!     .derivation_path("m/44'/195'/0'/0/0")
//!     .source_fingerprint(Fingerprint::from(0x1234_5678u32))
//!     .build()?;
//!
//! // wallet side: show parts until the device has scanned enough
//! let mut encoder = request.to_ur_encoder(150)?;
//! let mut decoder = UrDecoder::new();
//! let ur = loop {
//!     if let DecodeStatus::Complete(ur) = decoder.receive(&encoder.next_part()?)? {
//!         break ur;
//!     }
//! };
//! let received = TronSignRequest::from_ur(&ur)?;
//! assert_eq!(received, request);
//! # Ok(())
//! # }
//! ```

pub mod bytewords;
pub mod cbor;
pub mod config;
pub mod correlation;
pub mod errors;
pub mod fountain;
pub mod keypath;
pub mod prelude;
pub mod registry;
pub mod ur;

pub use errors::{Error, ErrorCode};

/// Common result alias for registry operations.
pub type Result<T> = std::result::Result<T, Error>;
