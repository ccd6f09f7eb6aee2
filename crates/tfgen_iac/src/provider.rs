//! Cloud provider reverse-engineering tools.
//!
//! Each supported provider contributes an `import` and a `scan` tool.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use tfgen_core::{ArgType, ArgumentSpec, ExecutionTemplate, ReverseSettings, ToolAction, ToolDescriptor, ToolSink};

/// Image the provider tools run in.
pub const REVERSE_IMAGE: &str = "quay.io/terraformer/terraformer:latest";

/// Default output directory of the import tool.
pub const DEFAULT_OUTPUT_DIR: &str = "terraform_imported";

/// Supported cloud providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    Aws,
    Gcp,
    Azure,
}

impl CloudProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "aws",
            CloudProvider::Gcp => "gcp",
            CloudProvider::Azure => "azure",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![CloudProvider::Aws, CloudProvider::Gcp, CloudProvider::Azure]
    }

    /// Static description of this provider.
    pub fn descriptor(&self) -> ProviderDescriptor {
        match self {
            CloudProvider::Aws => ProviderDescriptor {
                id: *self,
                display_name: "AWS",
                resource_vocabulary: &["vpc", "subnet", "security-group", "elb", "rds", "iam"],
                required_env_vars: &["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY", "AWS_REGION"],
            },
            CloudProvider::Gcp => ProviderDescriptor {
                id: *self,
                display_name: "Google Cloud",
                resource_vocabulary: &["compute", "storage", "sql", "iam"],
                required_env_vars: &["GOOGLE_CREDENTIALS", "GOOGLE_PROJECT"],
            },
            CloudProvider::Azure => ProviderDescriptor {
                id: *self,
                display_name: "Azure",
                resource_vocabulary: &["compute", "network", "storage", "database"],
                required_env_vars: &[
                    "AZURE_SUBSCRIPTION_ID",
                    "AZURE_CLIENT_ID",
                    "AZURE_CLIENT_SECRET",
                    "AZURE_TENANT_ID",
                ],
            },
        }
    }
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CloudProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aws" => Ok(CloudProvider::Aws),
            "gcp" => Ok(CloudProvider::Gcp),
            "azure" => Ok(CloudProvider::Azure),
            _ => Err(format!("Unsupported provider: {}", s)),
        }
    }
}

/// Display name, resource vocabulary and credential variables of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderDescriptor {
    pub id: CloudProvider,
    pub display_name: &'static str,
    pub resource_vocabulary: &'static [&'static str],
    pub required_env_vars: &'static [&'static str],
}

/// Split requested provider names into supported providers and rejects.
///
/// Matching ignores case; duplicates keep their first position.
pub fn select_providers(requested: &[String]) -> (Vec<CloudProvider>, Vec<String>) {
    let mut selected = Vec::new();
    let mut rejected = Vec::new();
    for name in requested {
        match name.parse::<CloudProvider>() {
            Ok(provider) if !selected.contains(&provider) => selected.push(provider),
            Ok(_) => {}
            Err(_) => rejected.push(name.clone()),
        }
    }
    (selected, rejected)
}

/// Providers to reverse-engineer for a run. Never fails.
pub fn get_enabled_providers(settings: &ReverseSettings) -> Vec<CloudProvider> {
    if !settings.enabled {
        return Vec::new();
    }
    if settings.providers.is_empty() {
        warn!("Reverse Terraform engineering is enabled but no providers specified");
        return Vec::new();
    }

    let (selected, rejected) = select_providers(&settings.providers);
    let supported: Vec<&str> = CloudProvider::all().iter().map(|p| p.as_str()).collect();
    for name in &rejected {
        warn!("Unsupported provider: {}. Supported providers: {:?}", name, supported);
    }
    if selected.is_empty() {
        warn!("Reverse Terraform engineering is enabled but none of the requested providers is supported");
    }
    selected
}

/// Builds and registers the provider tools.
pub struct ProviderToolFactory {
    sink: Arc<dyn ToolSink>,
    category: String,
    image: String,
}

impl ProviderToolFactory {
    pub fn new(sink: Arc<dyn ToolSink>, category: impl Into<String>) -> Self {
        Self {
            sink,
            category: category.into(),
            image: REVERSE_IMAGE.to_string(),
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Build the import and scan tools for one provider.
    ///
    /// A tool that fails validation is logged and skipped; the others are
    /// still registered and returned.
    pub fn initialize_provider_tools(&self, provider: CloudProvider) -> Vec<ToolDescriptor> {
        let descriptor = provider.descriptor();
        let mut tools = Vec::new();

        for tool in [self.import_tool(&descriptor), self.scan_tool(&descriptor)] {
            match tool.validate() {
                Ok(()) => {
                    self.sink.register(&self.category, tool.clone());
                    tools.push(tool);
                }
                Err(e) => error!("Failed to create tool {} for provider {}: {}", tool.name, provider, e),
            }
        }

        info!("Created {} tool(s) for provider: {}", tools.len(), provider);
        tools
    }

    fn import_tool(&self, descriptor: &ProviderDescriptor) -> ToolDescriptor {
        let template = ExecutionTemplate::new(&self.image, "terraformer_import.py");
        ToolDescriptor::new(
            format!("terraform_import_{}", descriptor.id),
            ToolAction::Import,
            template,
        )
        .with_description(format!(
            "Import existing {} infrastructure into Terraform",
            descriptor.display_name
        ))
        .arg(ArgumentSpec::new(
            "resource_type",
            ArgType::String,
            format!(
                "Type of resource to import. Available: {}",
                descriptor.resource_vocabulary.join(", ")
            ),
        ))
        .arg(ArgumentSpec::new(
            "resource_id",
            ArgType::String,
            "ID or name of the resource to import",
        ))
        .arg(
            ArgumentSpec::new(
                "output_dir",
                ArgType::String,
                "Directory to save the generated Terraform code",
            )
            .optional(DEFAULT_OUTPUT_DIR),
        )
        .with_env(descriptor.required_env_vars.iter().copied())
    }

    fn scan_tool(&self, descriptor: &ProviderDescriptor) -> ToolDescriptor {
        let template = ExecutionTemplate::new(&self.image, "terraformer_scan.py");
        ToolDescriptor::new(
            format!("terraform_scan_{}", descriptor.id),
            ToolAction::Scan,
            template,
        )
        .with_description(format!(
            "Scan and discover {} infrastructure for Terraform import",
            descriptor.display_name
        ))
        .arg(
            ArgumentSpec::new(
                "resource_types",
                ArgType::String,
                format!(
                    "Types of resources to scan. Available: {}",
                    descriptor.resource_vocabulary.join(", ")
                ),
            )
            .optional("all"),
        )
        .arg(
            ArgumentSpec::new("output_format", ArgType::String, "Output format (json, yaml, or hcl)")
                .optional("hcl"),
        )
        .with_env(descriptor.required_env_vars.iter().copied())
    }
}
