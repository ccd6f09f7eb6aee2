//! tfgen CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Configuration error
//! - 5: IaC error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands, UsageError};
use tfgen_core::CoreError;
use tfgen_iac::IacError;

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const CONFIGURATION_ERROR: u8 = 3;
    pub const IAC_ERROR: u8 = 5;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_directives = if cli.verbose {
        "tfgen=debug,warn"
    } else if cli.quiet {
        "error"
    } else {
        "tfgen=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    // Logging may already be initialized; keep going either way.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(args).await,
        Commands::Name(args) => commands::name::execute(args),
        Commands::Providers(args) => commands::providers::execute(args),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(categorize_error(&e))
        }
    }
}

/// Map an error to its exit code.
fn categorize_error(e: &anyhow::Error) -> u8 {
    if e.downcast_ref::<UsageError>().is_some() {
        return ExitCodes::INVALID_ARGS;
    }
    if e.downcast_ref::<CoreError>().is_some() {
        return ExitCodes::CONFIGURATION_ERROR;
    }
    match e.downcast_ref::<IacError>() {
        Some(IacError::Configuration(_)) | Some(IacError::Core(_)) => ExitCodes::CONFIGURATION_ERROR,
        Some(_) => ExitCodes::IAC_ERROR,
        None => ExitCodes::GENERAL_ERROR,
    }
}
