//! Terminal UI utilities

use colored::Colorize;
use console::Term;
use indicatif::{ProgressBar, ProgressStyle};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print a section header
pub fn header(text: &str) {
    println!("\n{}", text.bold().underline());
}

/// Print a key-value pair
pub fn key_value(key: &str, value: &str) {
    println!("  {}: {}", key.cyan(), value);
}

/// Print a separator line
pub fn separator() {
    println!("{}", "─".repeat(60).dimmed());
}

/// Print JSON prettily
pub fn json(value: &serde_json::Value) {
    if let Ok(pretty) = serde_json::to_string_pretty(value) {
        println!("{}", pretty);
    }
}

/// Fragment progress bar for a scan of `expected` fragments.
pub fn fragment_progress(expected: u64) -> ProgressBar {
    let pb = ProgressBar::new(expected);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.green/dim} {pos}/{len} fragments {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb
}

/// Prompt for user confirmation
pub fn confirm(prompt: &str, default: bool) -> anyhow::Result<bool> {
    use dialoguer::Confirm;
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()?)
}

/// Render a UR part as a terminal QR code.
pub fn qr_code(data: &str) -> anyhow::Result<()> {
    use qrcode::{EcLevel, QrCode};

    // UR parts are upper-cased for alphanumeric mode; low EC keeps codes small
    let code = QrCode::with_error_correction_level(data.to_ascii_uppercase(), EcLevel::L)?;
    let string = code
        .render::<char>()
        .quiet_zone(true)
        .module_dimensions(2, 1)
        .build();

    println!("\n{}\n", string);
    Ok(())
}

/// Clear the terminal between animation frames
pub fn clear() {
    let term = Term::stdout();
    let _ = term.clear_screen();
}
