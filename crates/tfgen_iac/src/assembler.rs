//! Tool assembly: one module → its plan / apply / vars descriptors.

use tracing::{error, info, warn};

use tfgen_core::{
    ExecutionTemplate, ModuleReference, ReviewMode, RunConfig, SourceConfig, ToolAction, ToolDescriptor,
};

use crate::discovery::DiscoveryOutcome;
use crate::error::{IacError, IacResult};
use crate::synthesizer::synthesize;

/// Scripts every module tool ships next to its entrypoint.
pub const SUPPORT_SCRIPTS: &[&str] = &["prepare_tfvars.py", "terraform_handler.py"];

/// Version reported when neither the config nor discovery names one.
pub const DEFAULT_VERSION: &str = "latest";

/// Settings applied to every assembled module tool.
#[derive(Debug, Clone)]
pub struct AssemblerSettings {
    pub name_prefix: String,
    pub image: String,
    pub env: Vec<String>,
    pub secrets: Vec<String>,
    pub review_mode: ReviewMode,
}

impl Default for AssemblerSettings {
    fn default() -> Self {
        Self::from_config(&RunConfig::default())
    }
}

impl AssemblerSettings {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            name_prefix: config.tools.name_prefix.clone(),
            image: config.tools.image.clone(),
            env: config.tools.env.clone(),
            secrets: config.tools.secrets.clone(),
            review_mode: config.terraform.review_mode,
        }
    }

    pub fn with_review_mode(mut self, mode: ReviewMode) -> Self {
        self.review_mode = mode;
        self
    }
}

/// Assembles the descriptors of a module from its discovery outcome.
#[derive(Debug, Clone, Default)]
pub struct ToolAssembler {
    settings: AssemblerSettings,
}

impl ToolAssembler {
    pub fn new(settings: AssemblerSettings) -> Self {
        Self { settings }
    }

    /// Actions emitted per module, in emission order.
    pub fn actions(&self) -> Vec<ToolAction> {
        match self.settings.review_mode {
            ReviewMode::Off => vec![ToolAction::Plan, ToolAction::Apply, ToolAction::Vars],
            ReviewMode::Replace => vec![ToolAction::PlanPr, ToolAction::Apply, ToolAction::Vars],
            ReviewMode::Additional => vec![
                ToolAction::Plan,
                ToolAction::PlanPr,
                ToolAction::Apply,
                ToolAction::Vars,
            ],
        }
    }

    /// Tool name for a module and action.
    pub fn tool_name(&self, module_name: &str, action: ToolAction) -> String {
        if self.settings.name_prefix.is_empty() {
            format!("{}_{}", module_name, action)
        } else {
            format!("{}_{}_{}", self.settings.name_prefix, module_name, action)
        }
    }

    /// Assemble every descriptor for one module.
    ///
    /// All or nothing: either every action's descriptor is returned or the
    /// module fails as a whole.
    pub fn assemble(
        &self,
        module_name: &str,
        reference: &ModuleReference,
        outcome: &DiscoveryOutcome,
    ) -> IacResult<Vec<ToolDescriptor>> {
        if !outcome.errors.is_empty() {
            for e in &outcome.errors {
                error!("Variable discovery error for {}: {}", module_name, e);
            }
            return Err(IacError::Discovery(outcome.errors.join("; ")));
        }

        for w in &outcome.warnings {
            warn!("Variable discovery warning for {}: {}", module_name, w);
        }

        if outcome.variables.is_empty() {
            return Err(IacError::Assembly {
                module: module_name.to_string(),
                message: "no variables found".to_string(),
            });
        }
        info!("Found {} variables for {}", outcome.variables.len(), module_name);

        let synthesis = synthesize(&outcome.variables);
        if synthesis.arguments.is_empty() {
            return Err(IacError::Assembly {
                module: module_name.to_string(),
                message: format!(
                    "no valid arguments created ({} variable(s) skipped)",
                    synthesis.skipped.len()
                ),
            });
        }

        let source = SourceConfig {
            location: reference.url.clone(),
            version: reference
                .git_ref
                .clone()
                .or_else(|| outcome.resolved_ref.clone())
                .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            path: reference.path.clone(),
        };
        let module_description = reference
            .description
            .clone()
            .unwrap_or_else(|| format!("Terraform module for {}", module_name));
        let manifest = serde_json::to_value(&outcome.variables)?;

        let tools = self
            .actions()
            .into_iter()
            .map(|action| {
                let template = ExecutionTemplate::new(&self.settings.image, entrypoint(action))
                    .with_support_files(SUPPORT_SCRIPTS)
                    .with_variables_manifest(manifest.clone());

                let tool = ToolDescriptor::new(self.tool_name(module_name, action), action, template)
                    .with_description(format!(
                        "{} {} (original source code: {}) - version: {}",
                        action_phrase(action),
                        module_description,
                        source.location,
                        source.version
                    ))
                    .with_args(synthesis.arguments.clone())
                    .with_source_config(source.clone())
                    .with_env(self.settings.env.iter().chain(&reference.env).cloned())
                    .with_secrets(self.settings.secrets.iter().chain(&reference.secrets).cloned());

                tool.validate()?;
                Ok(tool)
            })
            .collect::<IacResult<Vec<_>>>()?;

        info!("Assembled {} tools for module {}", tools.len(), module_name);
        Ok(tools)
    }
}

fn action_phrase(action: ToolAction) -> &'static str {
    match action {
        ToolAction::Plan => "Plan infrastructure changes for",
        ToolAction::PlanPr => "Plan infrastructure changes and create PR for",
        ToolAction::Apply => "Apply infrastructure changes to",
        ToolAction::Vars => "Show variables for",
        ToolAction::Import => "Import existing infrastructure for",
        ToolAction::Scan => "Scan infrastructure for",
    }
}

fn entrypoint(action: ToolAction) -> &'static str {
    match action {
        ToolAction::Plan => "terraform_plan.py",
        ToolAction::PlanPr => "plan_with_pr.py",
        ToolAction::Apply => "terraform_apply.py",
        ToolAction::Vars => "get_module_vars.py",
        ToolAction::Import => "terraformer_import.py",
        ToolAction::Scan => "terraformer_scan.py",
    }
}
