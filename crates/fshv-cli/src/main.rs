//! FSHV CLI
//!
//! Command-line front end for validating FSH projects with the HL7 FHIR
//! validator.

mod commands;
mod output;

use clap::Parser;
use fshv_core::{Result, init_tracing};
use std::path::PathBuf;
use tracing::error;

#[derive(Parser)]
#[command(name = "fshv")]
#[command(about = "Validate FSH profiles and instances with the HL7 FHIR validator")]
#[command(version = fshv_core::VERSION)]
#[command(
    long_about = "Validates the instances declared in FSH files against their profiles.\n\
Runs the FSH compiler, resolves the generated artifacts and drives the\n\
HL7 validator once per profile group.\n\
\n\
Examples:\n  \
fshv input/fsh/patient.fsh          # Validate a single FSH file\n  \
fshv --all                          # Validate the whole project\n  \
fshv --all --subdir profiles        # Validate input/fsh/profiles/ only\n  \
fshv --all --no-sushi --log-path logs   # Reuse compiled output, store logs"
)]
struct Cli {
    /// FSH files to validate
    #[arg(help = "FSH files to validate (alternative to --all)")]
    filenames: Vec<PathBuf>,

    /// Validate every FSH file of the project in the current directory
    #[arg(short, long)]
    all: bool,

    /// Restrict --all to a subdirectory of input/fsh/
    #[arg(short, long, default_value = "", requires = "all")]
    subdir: String,

    /// Directory holding validator_cli.jar (downloaded there when missing)
    #[arg(long, help = "Directory with validator_cli.jar (default: project base)")]
    validator_path: Option<PathBuf>,

    /// Skip the FSH compiler and reuse the existing generated resources
    #[arg(long)]
    no_sushi: bool,

    /// Directory to store the validation log, summary table and CSV in
    #[arg(long)]
    log_path: Option<PathBuf>,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.no_color && std::env::var("NO_COLOR").is_err() {
        colored::control::set_override(true);
    } else {
        colored::control::set_override(false);
    }

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "fshv_core=warn,fshv_cli=warn",
        1 => "fshv_core=info,fshv_cli=info",
        2 => "fshv_core=debug,fshv_cli=debug",
        _ => "trace",
    };
    unsafe {
        std::env::set_var("RUST_LOG", log_level);
    }
    init_tracing();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("FSH validation failed: {e}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    commands::validate(commands::ValidateArgs {
        filenames: cli.filenames,
        all: cli.all,
        subdir: cli.subdir,
        validator_path: cli.validator_path,
        no_sushi: cli.no_sushi,
        log_path: cli.log_path,
    })
    .await
}
