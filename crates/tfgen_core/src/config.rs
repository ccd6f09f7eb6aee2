//! Run configuration.
//!
//! The configuration is resolved once at the boundary. Every default is
//! applied during deserialization, so downstream code never has to guess.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::normalizer::ModuleInput;

/// Top-level configuration of one initialization run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "RawRunConfig")]
pub struct RunConfig {
    pub terraform: TerraformSection,
    pub discovery: DiscoverySettings,
    pub tools: ToolSettings,
}

/// Module and reverse-engineering settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TerraformSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules: Option<ModuleInput>,
    /// Directory of per-module JSON files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_dir: Option<PathBuf>,
    #[serde(default)]
    pub review_mode: ReviewMode,
    #[serde(default)]
    pub enable_reverse_terraform: bool,
    #[serde(default)]
    pub reverse_terraform_providers: ProviderSelection,
}

/// How review-request (pull request) plan tools are emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewMode {
    /// plan, apply, vars
    #[default]
    Off,
    /// plan_pr, apply, vars
    Replace,
    /// plan, plan_pr, apply, vars
    Additional,
}

/// A single provider or a list of providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderSelection {
    One(String),
    Many(Vec<String>),
}

impl Default for ProviderSelection {
    fn default() -> Self {
        ProviderSelection::Many(Vec::new())
    }
}

impl ProviderSelection {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            ProviderSelection::One(provider) => vec![provider.clone()],
            ProviderSelection::Many(providers) => providers.clone(),
        }
    }
}

/// Settings forwarded to the variable discovery port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoverySettings {
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Per-module timeout in seconds; `0` disables it.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl DiscoverySettings {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

fn default_max_workers() -> usize {
    8
}

fn default_timeout_secs() -> u64 {
    300
}

/// Settings applied to every generated module tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
    #[serde(default = "default_image")]
    pub image: String,
    #[serde(default)]
    pub env: Vec<String>,
    #[serde(default = "default_secrets")]
    pub secrets: Vec<String>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            category: default_category(),
            name_prefix: default_name_prefix(),
            image: default_image(),
            env: Vec::new(),
            secrets: default_secrets(),
        }
    }
}

fn default_category() -> String {
    "terraform".to_string()
}

fn default_name_prefix() -> String {
    "tf".to_string()
}

fn default_image() -> String {
    "hashicorp/terraform:latest".to_string()
}

fn default_secrets() -> Vec<String> {
    vec!["GH_TOKEN".to_string()]
}

/// Reverse-engineering settings, whichever shape they were written in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseSettings {
    pub enabled: bool,
    pub providers: Vec<String>,
}

/// On-disk shape: accepts the nested `terraform:` section or the legacy
/// flat reverse-engineering keys at the document root.
#[derive(Deserialize)]
struct RawRunConfig {
    #[serde(default)]
    terraform: Option<TerraformSection>,
    #[serde(default)]
    discovery: DiscoverySettings,
    #[serde(default)]
    tools: ToolSettings,
    #[serde(default)]
    enable_reverse_terraform: Option<bool>,
    #[serde(default)]
    reverse_terraform_providers: Option<ProviderSelection>,
}

impl From<RawRunConfig> for RunConfig {
    fn from(raw: RawRunConfig) -> Self {
        let terraform = match raw.terraform {
            Some(section) => section,
            None => {
                if raw.enable_reverse_terraform.is_some() || raw.reverse_terraform_providers.is_some() {
                    debug!("Normalizing legacy flat reverse-engineering config");
                }
                TerraformSection {
                    enable_reverse_terraform: raw.enable_reverse_terraform.unwrap_or(false),
                    reverse_terraform_providers: raw.reverse_terraform_providers.unwrap_or_default(),
                    ..TerraformSection::default()
                }
            }
        };

        Self {
            terraform,
            discovery: raw.discovery,
            tools: raw.tools,
        }
    }
}

impl RunConfig {
    /// Load a configuration file; the format follows the extension
    /// (`.yaml`/`.yml`, `.json`, `.toml`).
    pub fn from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        debug!("Loading run configuration from {:?}", path);

        let content = fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        let mut config = match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&content)?,
            "json" => Self::from_json_str(&content)?,
            "toml" => toml::from_str(&content)?,
            other => return Err(CoreError::UnsupportedFormat(format!("{:?} ({})", path, other))),
        };

        // Relative config directories are resolved against the config file.
        if let (Some(dir), Some(parent)) = (&config.terraform.config_dir, path.parent()) {
            if dir.is_relative() {
                config.terraform.config_dir = Some(parent.join(dir));
            }
        }
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> CoreResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// The reverse-engineering settings in their normalized form.
    pub fn reverse_settings(&self) -> ReverseSettings {
        ReverseSettings {
            enabled: self.terraform.enable_reverse_terraform,
            providers: self.terraform.reverse_terraform_providers.to_vec(),
        }
    }

    /// Whether any module source is configured.
    pub fn has_module_sources(&self) -> bool {
        self.terraform.modules.is_some() || self.terraform.config_dir.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RunConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config.discovery.max_workers, 8);
        assert_eq!(config.discovery.timeout(), Some(Duration::from_secs(300)));
        assert_eq!(config.tools.category, "terraform");
        assert_eq!(config.tools.name_prefix, "tf");
        assert_eq!(config.tools.secrets, vec!["GH_TOKEN"]);
        assert_eq!(config.terraform.review_mode, ReviewMode::Off);
        assert!(!config.reverse_settings().enabled);
    }

    #[test]
    fn test_nested_reverse_config() {
        let config = RunConfig::from_yaml_str(
            r#"
terraform:
  enable_reverse_terraform: true
  reverse_terraform_providers: aws
  review_mode: additional
discovery:
  timeout_secs: 0
"#,
        )
        .unwrap();

        let reverse = config.reverse_settings();
        assert!(reverse.enabled);
        assert_eq!(reverse.providers, vec!["aws"]);
        assert_eq!(config.terraform.review_mode, ReviewMode::Additional);
        assert_eq!(config.discovery.timeout(), None);
    }

    #[test]
    fn test_legacy_flat_reverse_config() {
        let config = RunConfig::from_json_str(
            r#"{"enable_reverse_terraform": true, "reverse_terraform_providers": ["gcp", "azure"]}"#,
        )
        .unwrap();

        assert_eq!(
            config.reverse_settings(),
            ReverseSettings {
                enabled: true,
                providers: vec!["gcp".into(), "azure".into()],
            }
        );
    }

    #[test]
    fn test_nested_section_wins_over_flat_keys() {
        let config = RunConfig::from_json_str(
            r#"{"terraform": {}, "enable_reverse_terraform": true, "reverse_terraform_providers": "aws"}"#,
        )
        .unwrap();
        assert!(!config.reverse_settings().enabled);
    }

    #[test]
    fn test_modules_shapes_in_yaml() {
        let config = RunConfig::from_yaml_str(
            r#"
terraform:
  modules:
    vpc:
      source: terraform-aws-modules/vpc/aws
      version: "5.0.0"
"#,
        )
        .unwrap();
        assert!(matches!(config.terraform.modules, Some(ModuleInput::Named(_))));
        assert!(config.has_module_sources());
    }

    #[test]
    fn test_from_file_toml_resolves_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tfgen.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[terraform]\nconfig_dir = \"modules\"\nmodules = \"https://github.com/a/b\"").unwrap();

        let config = RunConfig::from_file(&path).unwrap();
        assert_eq!(config.terraform.config_dir, Some(dir.path().join("modules")));
        assert!(matches!(config.terraform.modules, Some(ModuleInput::Csv(_))));
    }

    #[test]
    fn test_from_file_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tfgen.ini");
        fs::write(&path, "x=1").unwrap();

        assert!(matches!(RunConfig::from_file(&path), Err(CoreError::UnsupportedFormat(_))));
    }
}
