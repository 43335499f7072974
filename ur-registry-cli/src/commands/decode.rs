//! Reassemble scanned UR parts and show the record they carry

use anyhow::{bail, Result};
use serde_json::json;
use ur_registry::fountain::DecodeStatus;
use ur_registry::registry::{global, RegistryItem};
use ur_registry::ur::{Ur, UrDecoder};

use crate::ui;

/// Feed `parts` to a fresh decoder.
///
/// Malformed parts are skipped with a warning, as a camera feed would drop
/// an unreadable frame. Corruption aborts the scan.
pub fn reassemble(parts: &[String], show_progress: bool) -> Result<Ur> {
    let mut decoder = UrDecoder::new();
    let progress = show_progress.then(|| ui::fragment_progress(0));

    for (index, part) in parts.iter().enumerate() {
        match decoder.receive(part) {
            Ok(DecodeStatus::Complete(ur)) => {
                if let Some(pb) = &progress {
                    pb.set_length(decoder.expected_count() as u64);
                    pb.finish_with_message("complete");
                }
                tracing::debug!(frames = index + 1, ur_type = ur.ur_type(), "scan complete");
                return Ok(ur);
            }
            Ok(DecodeStatus::Incomplete { received, expected }) => {
                if let Some(pb) = &progress {
                    pb.set_length(expected as u64);
                    pb.set_position(received as u64);
                }
            }
            Err(e) if e.requires_rescan() => {
                if let Some(pb) = &progress {
                    pb.abandon_with_message("corrupted");
                }
                return Err(e.into());
            }
            Err(e) => {
                tracing::warn!(line = index + 1, error = %e, "skipping unreadable part");
            }
        }
    }

    if let Some(pb) = &progress {
        pb.abandon_with_message("incomplete");
    }
    bail!(
        "scan incomplete: {} of {} fragments recovered from {} parts",
        decoder.received_count(),
        decoder.expected_count(),
        parts.len()
    )
}

/// Reassemble and resolve through the type registry.
pub fn decode_item(parts: &[String], show_progress: bool) -> Result<RegistryItem> {
    let ur = reassemble(parts, show_progress)?;
    Ok(global::resolve(&ur)?)
}

pub fn to_json(item: &RegistryItem) -> serde_json::Value {
    match item {
        RegistryItem::TronSignRequest(request) => json!({
            "type": item.ur_type(),
            "request_id": request.request_id().to_string(),
            "sign_data": request.sign_data_hex(),
            "data_type": request.data_type().as_str(),
            "derivation_path": request.derivation_path().to_string(),
            "source_fingerprint": request.source_fingerprint().to_hex(),
            "address": request.address(),
            "origin": request.origin(),
        }),
        RegistryItem::TronSignature(signature) => json!({
            "type": item.ur_type(),
            "request_id": signature.request_id().to_string(),
            "signature": signature.signature_hex(),
            "r": hex::encode(signature.r()),
            "s": hex::encode(signature.s()),
            "v": signature.v(),
        }),
    }
}

/// `ur-tool decode`
pub fn run(parts: &[String], as_json: bool) -> Result<RegistryItem> {
    let item = decode_item(parts, !as_json)?;
    if as_json {
        ui::json(&to_json(&item));
        return Ok(item);
    }

    match &item {
        RegistryItem::TronSignRequest(request) => {
            ui::header("TRON Sign Request");
            super::request::describe(request);
            ui::key_value("Sign data hex", &request.sign_data_hex());
        }
        RegistryItem::TronSignature(signature) => {
            ui::header("TRON Signature");
            ui::key_value("Request id", &signature.request_id().to_string());
            ui::key_value("r", &hex::encode(signature.r()));
            ui::key_value("s", &hex::encode(signature.s()));
            ui::key_value("v", &signature.v().to_string());
        }
    }
    ui::success("Decoded");
    Ok(item)
}
