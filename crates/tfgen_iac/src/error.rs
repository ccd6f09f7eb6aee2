//! Error types for the IaC pipeline.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for IaC operations.
pub type IacResult<T> = Result<T, IacError>;

/// Errors that can occur while turning modules into tools.
#[derive(Error, Debug)]
pub enum IacError {
    #[error("Variable discovery failed: {0}")]
    Discovery(String),

    #[error("Variable discovery for {source_url} timed out after {limit:?}")]
    DiscoveryTimeout { source_url: String, limit: Duration },

    #[error("Assembly failed for module {module}: {message}")]
    Assembly { module: String, message: String },

    #[error("Failed to initialize any module tools: {}", join_failures(.failures))]
    Batch { failures: Vec<ModuleFailure> },

    #[error("No tools configured")]
    NoToolsConfigured,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Core error: {0}")]
    Core(#[from] tfgen_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why one module contributed no tools to a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleFailure {
    pub module_name: String,
    pub error_message: String,
}

impl ModuleFailure {
    pub fn new(module_name: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            error_message: error_message.into(),
        }
    }
}

impl fmt::Display for ModuleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.module_name, self.error_message)
    }
}

fn join_failures(failures: &[ModuleFailure]) -> String {
    failures
        .iter()
        .map(ModuleFailure::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
