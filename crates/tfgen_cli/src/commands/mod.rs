//! CLI command definitions.
//!
//! Each subcommand maps to one step of turning Terraform modules into tools.

use clap::{Parser, Subcommand};
use thiserror::Error;

pub mod init;
pub mod name;
pub mod providers;

/// tfgen - Terraform modules as invocable tools
#[derive(Parser)]
#[command(name = "tfgen")]
#[command(version, about = "tfgen - Terraform modules as invocable tools")]
#[command(long_about = r#"
tfgen turns Terraform modules into typed plan / apply / vars tool descriptors
and adds import / scan tools for supported cloud providers.

COMMANDS:
  init        → Build and register tools from a run configuration
  name        → Show the tool-family name derived for module URLs
  providers   → List the supported reverse-engineering providers

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Configuration error
  5 - IaC error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build and register tools from a run configuration
    Init(init::InitArgs),

    /// Derive tool-family names for module URLs
    Name(name::NameArgs),

    /// List supported reverse-engineering providers
    Providers(providers::ProvidersArgs),
}

/// Arguments that parsed but make no sense.
#[derive(Debug, Error)]
#[error("Invalid argument: {0}")]
pub struct UsageError(pub String);
