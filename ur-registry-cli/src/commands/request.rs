//! Build a sign request and show it as UR parts

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use rand::RngCore;
use ur_registry::config::TransportConfig;
use ur_registry::correlation::RequestId;
use ur_registry::keypath::Fingerprint;
use ur_registry::registry::tron::{DataType, TronSignRequest};

use super::DisplayOptions;
use crate::ui;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataTypeArg {
    Transaction,
    Message,
    TypedData,
}

impl From<DataTypeArg> for DataType {
    fn from(arg: DataTypeArg) -> Self {
        match arg {
            DataTypeArg::Transaction => DataType::Transaction,
            DataTypeArg::Message => DataType::Message,
            DataTypeArg::TypedData => DataType::TypedData,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Data to sign, as hex
    #[arg(long, conflicts_with = "random")]
    pub sign_data: Option<String>,

    /// Sign this many random bytes instead (for transport testing)
    #[arg(long)]
    pub random: Option<usize>,

    /// Derivation path of the signing key
    #[arg(long, default_value = "m/44'/195'/0'/0/0")]
    pub path: String,

    /// Source fingerprint, 8 hex digits
    #[arg(long, default_value = "00000000")]
    pub xfp: String,

    #[arg(long, value_enum, default_value = "transaction")]
    pub data_type: DataTypeArg,

    /// TRON address the key is expected to control
    #[arg(long)]
    pub address: Option<String>,

    /// Name of the requesting application
    #[arg(long)]
    pub origin: Option<String>,

    /// Reuse a request id (hex or uuid form); generated when omitted
    #[arg(long)]
    pub request_id: Option<String>,
}

/// Build the request described by `args`.
pub fn build(args: &RequestArgs) -> Result<TronSignRequest> {
    let sign_data = match (&args.sign_data, args.random) {
        (Some(hex_data), _) => {
            let trimmed = hex_data.trim();
            hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
                .context("--sign-data is not valid hex")?
        }
        (None, Some(len)) => {
            let mut data = vec![0u8; len];
            rand::thread_rng().fill_bytes(&mut data);
            data
        }
        (None, None) => bail!("one of --sign-data or --random is required"),
    };

    let xfp: Fingerprint = args.xfp.parse()?;
    let mut builder = TronSignRequest::builder()
        .sign_data(sign_data)
        .data_type(DataType::from(args.data_type).to_u32())
        .derivation_path(args.path.clone())
        .source_fingerprint(xfp);
    if let Some(id) = &args.request_id {
        builder = builder.request_id(id.parse::<RequestId>()?);
    }
    if let Some(address) = &args.address {
        builder = builder.address(address.clone());
    }
    if let Some(origin) = &args.origin {
        builder = builder.origin(origin.clone());
    }
    Ok(builder.build()?)
}

/// `ur-tool request`
pub fn run(
    args: &RequestArgs,
    config: &TransportConfig,
    display: &DisplayOptions,
    verbose: bool,
) -> Result<Vec<String>> {
    let request = build(args)?;
    let ur = request.to_ur()?;
    let mut encoder = config.encoder(&ur)?;

    tracing::info!(
        request_id = %request.request_id(),
        cbor_len = ur.cbor().len(),
        fragments = encoder.fragment_count(),
        "built sign request"
    );

    if verbose || !display.animate {
        ui::header("TRON Sign Request");
        describe(&request);
        ui::key_value("CBOR bytes", &ur.cbor().len().to_string());
        ui::key_value("Fragments", &encoder.fragment_count().to_string());
        ui::separator();
    }

    let parts = super::emit_parts(&mut encoder, config, display)?;
    if !display.animate {
        ui::separator();
        ui::info(&format!(
            "Keep request id {} to match the device's answer",
            request.request_id()
        ));
    }
    Ok(parts)
}

pub fn describe(request: &TronSignRequest) {
    ui::key_value("Request id", &request.request_id().to_string());
    ui::key_value("Data type", request.data_type().as_str());
    ui::key_value("Sign data", &format!("{} bytes", request.sign_data().len()));
    ui::key_value("Path", &request.derivation_path().to_string());
    ui::key_value("Fingerprint", &request.source_fingerprint().to_hex());
    if !request.address().is_empty() {
        ui::key_value("Address", request.address());
    }
    if !request.origin().is_empty() {
        ui::key_value("Origin", request.origin());
    }
}
