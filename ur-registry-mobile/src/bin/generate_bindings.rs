//! Generates Swift, Kotlin or Python bindings from a compiled
//! `ur_registry_mobile` library.

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, ValueEnum};
use uniffi_bindgen::bindings::{
    KotlinBindingGenerator, PythonBindingGenerator, SwiftBindingGenerator,
};
use uniffi_bindgen::BindingGenerator;

#[derive(Parser)]
#[command(name = "generate-bindings")]
#[command(about = "Generate UniFFI bindings for ur-registry-mobile")]
struct Cli {
    /// Path to the compiled library; defaults to the host's release build
    #[arg(long)]
    library: Option<Utf8PathBuf>,

    /// Output language
    #[arg(short = 'l', long = "language", default_value = "swift")]
    language: Language,

    /// Output directory; defaults to bindings/<language>
    #[arg(short = 'o', long = "out-dir")]
    out_dir: Option<Utf8PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Language {
    Swift,
    Kotlin,
    Python,
}

impl Language {
    fn dir_name(self) -> &'static str {
        match self {
            Language::Swift => "swift",
            Language::Kotlin => "kotlin",
            Language::Python => "python",
        }
    }
}

fn default_library() -> Utf8PathBuf {
    let file = if cfg!(target_os = "macos") {
        "libur_registry_mobile.dylib"
    } else if cfg!(target_os = "windows") {
        "ur_registry_mobile.dll"
    } else {
        "libur_registry_mobile.so"
    };
    Utf8PathBuf::from("../target/release").join(file)
}

fn generate<G: BindingGenerator>(
    library: &Utf8Path,
    generator: &G,
    out_dir: &Utf8Path,
) -> anyhow::Result<()> {
    uniffi_bindgen::library_mode::generate_bindings(
        library,
        None,
        generator,
        &uniffi_bindgen::EmptyCrateConfigSupplier,
        None,
        out_dir,
        false,
    )?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let library = cli.library.unwrap_or_else(default_library);
    let out_dir = cli
        .out_dir
        .unwrap_or_else(|| Utf8PathBuf::from("bindings").join(cli.language.dir_name()));

    if !library.exists() {
        anyhow::bail!(
            "Library not found: {} (build with `cargo build --release -p ur-registry-mobile`)",
            library
        );
    }
    std::fs::create_dir_all(&out_dir)?;

    println!("Generating {} bindings", cli.language.dir_name());
    println!("  library: {}", library);
    println!("  output:  {}", out_dir);

    match cli.language {
        Language::Swift => generate(&library, &SwiftBindingGenerator, &out_dir)?,
        Language::Kotlin => generate(&library, &KotlinBindingGenerator, &out_dir)?,
        Language::Python => generate(&library, &PythonBindingGenerator, &out_dir)?,
    }

    println!("Done.");
    Ok(())
}
