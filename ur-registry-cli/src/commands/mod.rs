//! CLI command implementations

pub mod config;
pub mod correlate;
pub mod decode;
pub mod request;
pub mod sign;

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use ur_registry::config::TransportConfig;
use ur_registry::ur::UrEncoder;

use crate::ui;

/// Read UR parts, one per line.
///
/// `source` is a file path or `-` for stdin. Blank lines and lines starting
/// with `#` are skipped.
pub fn read_parts(source: &str) -> Result<Vec<String>> {
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading parts from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading parts from {}", source))?
    };
    Ok(parse_parts(&text))
}

pub fn parse_parts(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// How generated parts are shown.
#[derive(Debug, Clone, Default)]
pub struct DisplayOptions {
    /// Number of parts to emit; defaults to one full pass over the fragments
    pub parts: Option<usize>,
    /// Render each part as a QR code
    pub qr: bool,
    /// Redraw frames in place, looping until interrupted or `parts` is reached
    pub animate: bool,
    /// Also write the parts to this file, one per line
    pub out: Option<String>,
}

/// Emit the parts of `encoder` according to `options`; returns what was shown.
pub fn emit_parts(
    encoder: &mut UrEncoder,
    config: &TransportConfig,
    options: &DisplayOptions,
) -> Result<Vec<String>> {
    let count = options.parts.unwrap_or_else(|| encoder.fragment_count());
    let mut shown = Vec::with_capacity(count);

    if options.animate {
        let interval = Duration::from_millis(config.frame_interval_ms);
        let mut frame = 0usize;
        loop {
            if options.parts.is_some_and(|limit| frame >= limit) {
                break;
            }
            let part = config.format_part(encoder.next_part()?);
            ui::clear();
            ui::qr_code(&part)?;
            println!("{}", part);
            shown.push(part);
            frame += 1;
            std::thread::sleep(interval);
        }
    } else {
        for _ in 0..count {
            let part = config.format_part(encoder.next_part()?);
            if options.qr {
                ui::qr_code(&part)?;
            }
            println!("{}", part);
            shown.push(part);
        }
    }

    if let Some(path) = &options.out {
        write_parts(Path::new(path), &shown)?;
        tracing::info!(path = %path, parts = shown.len(), "wrote parts");
    }
    Ok(shown)
}

pub fn write_parts(path: &Path, parts: &[String]) -> Result<()> {
    let mut text = parts.join("\n");
    text.push('\n');
    std::fs::write(path, text).with_context(|| format!("writing parts to {}", path.display()))
}
