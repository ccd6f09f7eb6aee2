//! Tool descriptors: the invocable operations handed to the tool sink.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};

/// Upper bound on argument descriptions, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 1024;

/// Name of the argument that carries a module's resolved source.
pub const SOURCE_CONFIG_ARG: &str = "source_config";

/// The restricted argument type system of the tool host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgType {
    Bool,
    Int,
    String,
    /// Structured value; only used for the `source_config` argument.
    Object,
}

impl ArgType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArgType::Bool => "bool",
            ArgType::Int => "int",
            ArgType::String => "string",
            ArgType::Object => "object",
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One typed, described argument of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentSpec {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub arg_type: ArgType,
    pub required: bool,
    /// Already encoded for `arg_type`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ArgumentSpec {
    pub fn new(name: impl Into<String>, arg_type: ArgType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            arg_type,
            required: true,
            default: None,
        }
    }

    /// An optional argument with a fallback value.
    pub fn optional(mut self, default: impl Into<String>) -> Self {
        self.required = false;
        self.default = Some(default.into());
        self
    }
}

/// The operation a tool performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolAction {
    Plan,
    PlanPr,
    Apply,
    Vars,
    Import,
    Scan,
}

impl ToolAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolAction::Plan => "plan",
            ToolAction::PlanPr => "plan_pr",
            ToolAction::Apply => "apply",
            ToolAction::Vars => "vars",
            ToolAction::Import => "import",
            ToolAction::Scan => "scan",
        }
    }
}

impl fmt::Display for ToolAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolved module source carried by every module tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub location: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Reference to the container template that executes a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionTemplate {
    pub image: String,
    /// Script the container runs.
    pub entrypoint: String,
    /// Scripts shipped alongside the entrypoint.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub support_files: Vec<String>,
    /// Discovered variable signature handed to the executor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables_manifest: Option<Value>,
}

impl ExecutionTemplate {
    pub fn new(image: impl Into<String>, entrypoint: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            entrypoint: entrypoint.into(),
            support_files: Vec::new(),
            variables_manifest: None,
        }
    }

    pub fn with_support_files(mut self, files: &[&str]) -> Self {
        self.support_files = files.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_variables_manifest(mut self, manifest: Value) -> Self {
        self.variables_manifest = Some(manifest);
        self
    }
}

/// An invocable operation exposed for a module or a cloud provider.
///
/// In the serialized form a module tool's `source_config` is also listed
/// as a required `object` argument at the end of `args`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireDescriptor", from = "WireDescriptor")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub action: ToolAction,
    pub args: Vec<ArgumentSpec>,
    /// Present on module tools, where it is always required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_config: Option<SourceConfig>,
    pub env: BTreeSet<String>,
    pub secrets: BTreeSet<String>,
    pub template: ExecutionTemplate,
}

/// Serialized shape of a [`ToolDescriptor`].
#[derive(Serialize, Deserialize)]
struct WireDescriptor {
    name: String,
    description: String,
    action: ToolAction,
    args: Vec<ArgumentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_config: Option<SourceConfig>,
    env: BTreeSet<String>,
    secrets: BTreeSet<String>,
    template: ExecutionTemplate,
}

fn source_config_arg() -> ArgumentSpec {
    ArgumentSpec::new(
        SOURCE_CONFIG_ARG,
        ArgType::Object,
        "Module source: location, version and optional path",
    )
}

impl From<ToolDescriptor> for WireDescriptor {
    fn from(tool: ToolDescriptor) -> Self {
        let mut args = tool.args;
        if tool.source_config.is_some() {
            args.push(source_config_arg());
        }
        Self {
            name: tool.name,
            description: tool.description,
            action: tool.action,
            args,
            source_config: tool.source_config,
            env: tool.env,
            secrets: tool.secrets,
            template: tool.template,
        }
    }
}

impl From<WireDescriptor> for ToolDescriptor {
    fn from(wire: WireDescriptor) -> Self {
        let args = wire
            .args
            .into_iter()
            .filter(|a| !(a.name == SOURCE_CONFIG_ARG && a.arg_type == ArgType::Object))
            .collect();
        Self {
            name: wire.name,
            description: wire.description,
            action: wire.action,
            args,
            source_config: wire.source_config,
            env: wire.env,
            secrets: wire.secrets,
            template: wire.template,
        }
    }
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, action: ToolAction, template: ExecutionTemplate) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            action,
            args: Vec::new(),
            source_config: None,
            env: BTreeSet::new(),
            secrets: BTreeSet::new(),
            template,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_args(mut self, args: Vec<ArgumentSpec>) -> Self {
        self.args = args;
        self
    }

    pub fn arg(mut self, arg: ArgumentSpec) -> Self {
        self.args.push(arg);
        self
    }

    pub fn with_source_config(mut self, source: SourceConfig) -> Self {
        self.source_config = Some(source);
        self
    }

    pub fn with_env<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_secrets<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.secrets.extend(names.into_iter().map(Into::into));
        self
    }

    /// Argument names in host order, `source_config` last when present.
    pub fn arg_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.args.iter().map(|a| a.name.as_str()).collect();
        if self.source_config.is_some() {
            names.push(SOURCE_CONFIG_ARG);
        }
        names
    }

    /// Check the invariants the tool host relies on.
    pub fn validate(&self) -> CoreResult<()> {
        let invalid = |message: String| CoreError::InvalidDescriptor {
            name: self.name.clone(),
            message,
        };

        let valid_char = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-';
        if self.name.is_empty() || !self.name.chars().all(valid_char) {
            return Err(invalid("tool name must be non-empty and use only [A-Za-z0-9_-]".into()));
        }
        if self.template.image.trim().is_empty() || self.template.entrypoint.trim().is_empty() {
            return Err(invalid("execution template is incomplete".into()));
        }

        let mut seen = HashSet::new();
        for name in self.arg_names() {
            if name.trim().is_empty() {
                return Err(invalid("argument with empty name".into()));
            }
            if !seen.insert(name) {
                return Err(invalid(format!("duplicate argument '{}'", name)));
            }
        }

        if let Some(arg) = self
            .args
            .iter()
            .find(|a| a.description.chars().count() > MAX_DESCRIPTION_LENGTH)
        {
            return Err(invalid(format!("description of '{}' exceeds {} characters", arg.name, MAX_DESCRIPTION_LENGTH)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template() -> ExecutionTemplate {
        ExecutionTemplate::new("hashicorp/terraform:latest", "terraform_plan.py")
    }

    #[test]
    fn test_arg_names_include_source_config() {
        let tool = ToolDescriptor::new("tf_vpc_plan", ToolAction::Plan, template())
            .arg(ArgumentSpec::new("cidr", ArgType::String, "CIDR"))
            .with_source_config(SourceConfig {
                location: "https://github.com/a/b".into(),
                version: "latest".into(),
                path: None,
            });

        assert_eq!(tool.arg_names(), vec!["cidr", SOURCE_CONFIG_ARG]);
        assert!(tool.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let tool = ToolDescriptor::new("tf_vpc_plan", ToolAction::Plan, template())
            .arg(ArgumentSpec::new("cidr", ArgType::String, "a"))
            .arg(ArgumentSpec::new("cidr", ArgType::Int, "b"));

        let err = tool.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate argument 'cidr'"));
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let tool = ToolDescriptor::new(" ", ToolAction::Scan, template());
        assert!(tool.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_url_characters() {
        let tool = ToolDescriptor::new("tf_aws_vpc.git?ref=v1_plan", ToolAction::Plan, template());
        assert!(tool.validate().is_err());
        assert!(ToolDescriptor::new("terraform_import_aws", ToolAction::Import, template())
            .validate()
            .is_ok());
    }

    #[test]
    fn test_source_config_listed_as_object_arg() {
        let tool = ToolDescriptor::new("tf_vpc_plan", ToolAction::Plan, template())
            .arg(ArgumentSpec::new("cidr", ArgType::String, "CIDR"))
            .with_source_config(SourceConfig {
                location: "https://github.com/a/b".into(),
                version: "v1.0.0".into(),
                path: None,
            });

        let value = serde_json::to_value(&tool).unwrap();
        let args = value["args"].as_array().unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(args[1]["name"], json!(SOURCE_CONFIG_ARG));
        assert_eq!(args[1]["type"], json!("object"));
        assert_eq!(args[1]["required"], json!(true));
        assert_eq!(value["source_config"]["version"], json!("v1.0.0"));

        let back: ToolDescriptor = serde_json::from_value(value).unwrap();
        assert_eq!(back, tool);
    }

    #[test]
    fn test_validate_rejects_long_description() {
        let tool = ToolDescriptor::new("t", ToolAction::Scan, template()).arg(ArgumentSpec::new(
            "a",
            ArgType::String,
            "x".repeat(MAX_DESCRIPTION_LENGTH + 1),
        ));
        assert!(tool.validate().is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let tool = ToolDescriptor::new("terraform_scan_aws", ToolAction::Scan, template())
            .arg(ArgumentSpec::new("output_format", ArgType::String, "Output format").optional("hcl"))
            .with_env(["AWS_REGION"]);

        let value = serde_json::to_value(&tool).unwrap();
        assert_eq!(value["action"], json!("scan"));
        assert_eq!(value["args"][0]["type"], json!("string"));
        assert_eq!(value["args"][0]["default"], json!("hcl"));
        assert_eq!(value["env"], json!(["AWS_REGION"]));
        assert!(value.get("source_config").is_none());
    }
}
