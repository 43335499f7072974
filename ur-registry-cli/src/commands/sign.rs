//! Play the offline device: scan a request and answer it
//!
//! Key handling is out of scope for this tool. Without `--signature` the
//! answer carries random `r`/`s` values, which is enough to exercise the
//! transport and correlation paths end to end.

use anyhow::{bail, Context, Result};
use rand::RngCore;
use ur_registry::config::TransportConfig;
use ur_registry::registry::tron::{TronSignRequest, TronSignature, SIGNATURE_LEN};
use ur_registry::registry::RegistryItem;

use super::DisplayOptions;
use crate::ui;

/// Recovery id of the placeholder signature.
const PLACEHOLDER_V: u8 = 0x1b;

/// Answer `request` with the given signature hex, or a placeholder.
pub fn answer(request: &TronSignRequest, signature_hex: Option<&str>) -> Result<TronSignature> {
    let signature = match signature_hex {
        Some(text) => {
            let trimmed = text.trim();
            hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
                .context("--signature is not valid hex")?
        }
        None => {
            let mut bytes = vec![0u8; SIGNATURE_LEN];
            rand::thread_rng().fill_bytes(&mut bytes[..SIGNATURE_LEN - 1]);
            bytes[SIGNATURE_LEN - 1] = PLACEHOLDER_V;
            bytes
        }
    };
    Ok(TronSignature::new(*request.request_id(), signature)?)
}

/// `ur-tool sign`
pub fn run(
    parts: &[String],
    signature_hex: Option<&str>,
    assume_yes: bool,
    config: &TransportConfig,
    display: &DisplayOptions,
) -> Result<Vec<String>> {
    let request = match super::decode::decode_item(parts, true)? {
        RegistryItem::TronSignRequest(request) => request,
        other => bail!("expected a tron-sign-request, scanned {}", other.ur_type()),
    };

    ui::header("Scanned Sign Request");
    super::request::describe(&request);
    ui::separator();

    if !assume_yes && !ui::confirm("Sign this request?", false)? {
        ui::warning("Declined; nothing to show");
        return Ok(Vec::new());
    }
    if signature_hex.is_none() {
        ui::warning("No --signature given; answering with a placeholder signature");
    }

    let signature = answer(&request, signature_hex)?;
    tracing::info!(request_id = %signature.request_id(), "answering sign request");

    let mut encoder = config.encoder(&signature.to_ur()?)?;
    ui::header("TRON Signature");
    let shown = super::emit_parts(&mut encoder, config, display)?;
    ui::success("Show these parts to the wallet");
    Ok(shown)
}
