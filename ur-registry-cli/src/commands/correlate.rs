//! Check that a scanned signature answers a request

use anyhow::{bail, Result};
use ur_registry::correlation::{correlate, Correlation};
use ur_registry::registry::tron::{TronSignRequest, TronSignature};
use ur_registry::registry::RegistryItem;

use crate::ui;

fn expect_request(item: RegistryItem) -> Result<TronSignRequest> {
    match item {
        RegistryItem::TronSignRequest(request) => Ok(request),
        other => bail!("expected a tron-sign-request, found {}", other.ur_type()),
    }
}

fn expect_signature(item: RegistryItem) -> Result<TronSignature> {
    match item {
        RegistryItem::TronSignature(signature) => Ok(signature),
        other => bail!("expected a tron-signature, found {}", other.ur_type()),
    }
}

/// Decode both sides and correlate them.
pub fn check(request_parts: &[String], signature_parts: &[String]) -> Result<Correlation> {
    let request = expect_request(super::decode::decode_item(request_parts, false)?)?;
    let signature = expect_signature(super::decode::decode_item(signature_parts, false)?)?;
    Ok(correlate(&request, &signature))
}

/// `ur-tool match`; fails when the signature answers some other request.
pub fn run(request_parts: &[String], signature_parts: &[String]) -> Result<()> {
    match check(request_parts, signature_parts)? {
        Correlation::Matched => {
            ui::success("Signature answers the request");
            Ok(())
        }
        Correlation::Mismatch { expected, actual } => {
            ui::error("Signature does not answer this request");
            ui::key_value("Request id", &expected.to_string());
            ui::key_value("Signature id", &actual.to_string());
            bail!("correlation mismatch")
        }
    }
}
