//! # tfgen_core
//!
//! Data model and configuration for tfgen.
//!
//! tfgen turns external Terraform modules into typed, invocable tool
//! descriptors (plan, apply, show-variables). This crate holds everything
//! that does not talk to the outside world:
//!
//! - **Normalizer**: the four accepted module-input shapes → [`ModuleReference`]
//! - **Naming**: stable tool-family names derived from a reference
//! - **Variables**: discovered Terraform variable metadata and type descriptors
//! - **Tools**: [`ToolDescriptor`] and its argument specs
//! - **Registry**: the [`ToolSink`] seam and the in-memory [`ToolRegistry`]
//! - **Config**: the [`RunConfig`] schema
//!
//! # Example
//!
//! ```rust
//! use tfgen_core::{derive_name, ModuleInput};
//!
//! let input = ModuleInput::Csv(
//!     "https://github.com/terraform-aws-modules/terraform-aws-vpc, terraform-aws-modules/eks/aws".into(),
//! );
//! let names: Vec<String> = input.normalize().iter().map(derive_name).collect();
//! assert_eq!(names, vec!["aws_vpc", "aws_eks"]);
//! ```

pub mod config;
pub mod error;
pub mod module;
pub mod naming;
pub mod normalizer;
pub mod registry;
pub mod tool;
pub mod variable;

pub use config::{
    DiscoverySettings, ProviderSelection, ReverseSettings, ReviewMode, RunConfig, TerraformSection,
    ToolSettings,
};
pub use error::{CoreError, CoreResult};
pub use module::{GitConfig, ModuleFile, ModuleReference, ModuleSource};
pub use naming::{derive_name, name_from_url};
pub use normalizer::{normalize, registry_url, ListItem, ModuleEntry, ModuleInput, NamedItem, NamedModule};
pub use registry::{ToolRegistry, ToolSink};
pub use tool::{
    ArgType, ArgumentSpec, ExecutionTemplate, SourceConfig, ToolAction, ToolDescriptor,
    MAX_DESCRIPTION_LENGTH, SOURCE_CONFIG_ARG,
};
pub use variable::{BaseType, TypeDescriptor, ValidationRule, Variable};
