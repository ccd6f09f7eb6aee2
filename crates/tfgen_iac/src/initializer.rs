//! Top-level initialization of a run.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use tfgen_core::{ModuleReference, RunConfig, ToolDescriptor, ToolSink};

use crate::batch::{BatchInitializer, BatchReport};
use crate::discovery::VariableDiscovery;
use crate::error::{IacError, IacResult, ModuleFailure};
use crate::loader::ModuleConfigLoader;
use crate::provider::{get_enabled_providers, CloudProvider, ProviderToolFactory};

/// Everything one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct InitReport {
    /// `None` when no modules were configured.
    pub modules: Option<BatchReport>,
    pub providers: Vec<CloudProvider>,
    pub provider_tools: Vec<ToolDescriptor>,
}

impl InitReport {
    /// All produced descriptors, module tools first.
    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.modules
            .iter()
            .flat_map(|report| report.descriptors.iter())
            .chain(self.provider_tools.iter())
    }

    pub fn failures(&self) -> &[ModuleFailure] {
        self.modules
            .as_ref()
            .map(|report| report.failures.as_slice())
            .unwrap_or(&[])
    }

    pub fn total(&self) -> usize {
        self.descriptors().count()
    }
}

/// Wires configuration, discovery and the tool sink together.
pub struct ToolInitializer {
    config: RunConfig,
    discovery: Arc<dyn VariableDiscovery>,
    sink: Arc<dyn ToolSink>,
}

impl ToolInitializer {
    pub fn new(config: RunConfig, discovery: Arc<dyn VariableDiscovery>, sink: Arc<dyn ToolSink>) -> Self {
        Self {
            config,
            discovery,
            sink,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Modules from the inline configuration followed by the config directory.
    pub fn collect_modules(&self) -> IacResult<Vec<ModuleReference>> {
        let mut modules = self
            .config
            .terraform
            .modules
            .as_ref()
            .map(|input| input.normalize())
            .unwrap_or_default();

        if let Some(dir) = &self.config.terraform.config_dir {
            modules.extend(ModuleConfigLoader::new(dir).load()?);
        }
        Ok(modules)
    }

    /// Build and register every module and provider tool.
    pub async fn initialize(&self) -> IacResult<InitReport> {
        let modules = self.collect_modules()?;
        let module_report = if modules.is_empty() {
            None
        } else {
            info!("Initializing Terraform module tools");
            let batch = BatchInitializer::new(self.discovery.clone(), self.sink.clone(), &self.config);
            Some(batch.run(&modules).await?)
        };

        let providers = get_enabled_providers(&self.config.reverse_settings());
        let mut provider_tools = Vec::new();
        if !providers.is_empty() {
            info!("Initializing reverse Terraform engineering tools");
            let factory = ProviderToolFactory::new(self.sink.clone(), &self.config.tools.category);
            for provider in &providers {
                provider_tools.extend(factory.initialize_provider_tools(*provider));
            }
        }

        let report = InitReport {
            modules: module_report,
            providers,
            provider_tools,
        };
        if report.total() == 0 {
            return Err(IacError::NoToolsConfigured);
        }

        info!("Initialized {} Terraform tool(s)", report.total());
        Ok(report)
    }
}
