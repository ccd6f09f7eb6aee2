//! # tfgen_iac
//!
//! Turns Terraform module references into registered tool descriptors.
//!
//! The pipeline for one module is: discover its variables through the
//! [`VariableDiscovery`] port, synthesize typed arguments, assemble the
//! plan / apply / vars descriptors, then hand them to a [`ToolSink`].
//! The [`BatchInitializer`] runs that pipeline over a list of modules with
//! per-module failure isolation.
//!
//! ## Features
//!
//! - Argument synthesis with JSON examples, validation hints and default coercion
//! - All-or-nothing assembly per module, with optional review-request plan tools
//! - Per-module discovery timeout and panic containment
//! - Per-module JSON config directories
//! - Import and scan tools for AWS, Google Cloud and Azure
//! - File-backed [`SnapshotDiscovery`] and a scriptable [`MockDiscovery`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tfgen_core::{RunConfig, ToolRegistry};
//! use tfgen_iac::{SnapshotDiscovery, ToolInitializer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfig::from_file("tfgen.yaml")?;
//!     let discovery = Arc::new(SnapshotDiscovery::load("snapshots")?);
//!     let registry = Arc::new(ToolRegistry::new());
//!
//!     let report = ToolInitializer::new(config, discovery, registry.clone())
//!         .initialize()
//!         .await?;
//!     println!("{} tools registered", report.total());
//!     Ok(())
//! }
//! ```
//!
//! [`ToolSink`]: tfgen_core::ToolSink

pub mod assembler;
pub mod batch;
pub mod discovery;
pub mod error;
pub mod initializer;
pub mod loader;
pub mod mock;
pub mod provider;
pub mod snapshot;
pub mod synthesizer;

pub use assembler::{AssemblerSettings, ToolAssembler, DEFAULT_VERSION, SUPPORT_SCRIPTS};
pub use batch::{BatchInitializer, BatchReport};
pub use discovery::{DiscoveryOutcome, DiscoveryRequest, VariableDiscovery};
pub use error::{IacError, IacResult, ModuleFailure};
pub use initializer::{InitReport, ToolInitializer};
pub use loader::ModuleConfigLoader;
pub use mock::{MockDiscovery, MockResponse};
pub use provider::{
    get_enabled_providers, select_providers, CloudProvider, ProviderDescriptor, ProviderToolFactory,
};
pub use snapshot::{SnapshotDiscovery, VariableSnapshot};
pub use synthesizer::{map_type, map_type_expr, synthesize, synthesize_argument, Synthesis, SynthesisWarning};
