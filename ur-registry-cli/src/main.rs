//! ur-tool
//!
//! Command-line companion for air-gapped TRON signing: builds sign requests,
//! shows them as animated UR parts, plays the offline device, and decodes
//! and correlates what comes back.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ur_registry_cli::commands::{self, request::RequestArgs, DisplayOptions};

#[derive(Parser)]
#[command(name = "ur-tool")]
#[command(about = "Build, animate and decode TRON UR payloads", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Transport config file (JSON); defaults to <config dir>/ur-tool/config.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Maximum bytes per fragment, overriding the config file
    #[arg(long, global = true, env = "UR_TOOL_MAX_FRAGMENT_LEN")]
    max_fragment_len: Option<usize>,
}

#[derive(Args, Debug)]
struct DisplayArgs {
    /// Number of parts to print (default: one pass over all fragments)
    #[arg(long)]
    parts: Option<usize>,

    /// Render each part as a terminal QR code
    #[arg(long)]
    qr: bool,

    /// Loop QR frames in place until interrupted (or --parts is reached)
    #[arg(long)]
    animate: bool,

    /// Also write the parts to a file
    #[arg(short, long)]
    out: Option<String>,
}

impl From<DisplayArgs> for DisplayOptions {
    fn from(args: DisplayArgs) -> Self {
        Self {
            parts: args.parts,
            qr: args.qr,
            animate: args.animate,
            out: args.out,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build a sign request and print its UR parts
    Request {
        #[command(flatten)]
        request: RequestArgs,

        #[command(flatten)]
        display: DisplayArgs,
    },

    /// Scan a sign request and answer it as the device would
    Sign {
        /// File with the scanned request parts, one per line ("-" for stdin)
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Signature to return (65 bytes hex); a placeholder when omitted
        #[arg(long)]
        signature: Option<String>,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,

        #[command(flatten)]
        display: DisplayArgs,
    },

    /// Reassemble scanned parts and show the record
    Decode {
        /// Parts given inline; read from --input when empty
        parts: Vec<String>,

        /// File with parts, one per line ("-" for stdin)
        #[arg(short, long, default_value = "-")]
        input: String,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that a signature answers a request
    Match {
        /// File with the request parts
        #[arg(long)]
        request: String,

        /// File with the signature parts
        #[arg(long)]
        signature: String,
    },

    /// Show the effective transport configuration
    Config,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "ur_registry_cli=debug,ur_tool=debug,ur_registry=debug"
    } else {
        "ur_registry_cli=info,ur_tool=info,ur_registry=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        ur_registry_cli::ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = commands::config::load(cli.config.as_deref(), cli.max_fragment_len)?;

    match cli.command {
        Commands::Request { request, display } => {
            commands::request::run(&request, &config, &display.into(), cli.verbose)?;
        }
        Commands::Sign {
            input,
            signature,
            yes,
            display,
        } => {
            let parts = commands::read_parts(&input)?;
            commands::sign::run(
                &parts,
                signature.as_deref(),
                yes,
                &config,
                &display.into(),
            )?;
        }
        Commands::Decode { parts, input, json } => {
            let parts = if parts.is_empty() {
                commands::read_parts(&input)?
            } else {
                parts
            };
            commands::decode::run(&parts, json)?;
        }
        Commands::Match { request, signature } => {
            let request_parts = commands::read_parts(&request)?;
            let signature_parts = commands::read_parts(&signature)?;
            commands::correlate::run(&request_parts, &signature_parts)?;
        }
        Commands::Config => {
            commands::config::show(&config)?;
        }
    }

    Ok(())
}
