//! Canonical module references and the per-module JSON file format.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A normalized pointer to an external Terraform module.
///
/// Every optional field is either populated with a non-blank value or
/// absent; the canonical form never carries empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleReference {
    pub url: String,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    /// Extra environment variable names the module's tools need.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<String>,
    /// Extra secret names the module's tools need.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<String>,
}

impl ModuleReference {
    /// Create a reference from a URL. Returns `None` when the URL is blank.
    pub fn new(url: impl AsRef<str>) -> Option<Self> {
        let url = url.as_ref().trim();
        if url.is_empty() {
            return None;
        }
        Some(Self {
            url: url.to_string(),
            git_ref: None,
            path: None,
            name: None,
            description: None,
            provider: None,
            resource_type: None,
            metadata: Map::new(),
            env: Vec::new(),
            secrets: Vec::new(),
        })
    }

    pub fn with_ref(mut self, git_ref: impl Into<String>) -> Self {
        self.git_ref = non_blank(Some(git_ref.into()));
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = non_blank(Some(path.into()));
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = non_blank(Some(name.into()));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = non_blank(Some(description.into()));
        self
    }

    pub fn with_provider_resource(
        mut self,
        provider: impl Into<String>,
        resource_type: impl Into<String>,
    ) -> Self {
        self.provider = non_blank(Some(provider.into()));
        self.resource_type = non_blank(Some(resource_type.into()));
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        if !value.is_null() {
            self.metadata.insert(key.into(), value);
        }
        self
    }

    pub fn with_env(mut self, env: Vec<String>) -> Self {
        self.env = clean_names(env);
        self
    }

    pub fn with_secrets(mut self, secrets: Vec<String>) -> Self {
        self.secrets = clean_names(secrets);
        self
    }
}

/// Trim a value and drop it if nothing is left.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Deserialize a field, reading an explicit `null` as the type's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn clean_names(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .filter_map(|n| non_blank(Some(n)))
        .collect()
}

/// A per-module JSON configuration file as found in a config directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleFile {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub source: ModuleSource,
    #[serde(default, deserialize_with = "null_as_default")]
    pub env: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub secrets: Vec<String>,
}

/// Source block of a [`ModuleFile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleSource {
    pub location: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub git_config: Option<GitConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(rename = "ref", default)]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub subfolder: Option<String>,
}

impl ModuleFile {
    /// Convert into the canonical reference.
    ///
    /// `source.version` wins over `git_config.ref` and `source.path` over
    /// `git_config.subfolder`.
    pub fn into_reference(self) -> Option<ModuleReference> {
        let git = self.source.git_config.unwrap_or_default();
        let mut reference = ModuleReference::new(&self.source.location)?
            .with_name(self.name)
            .with_env(self.env)
            .with_secrets(self.secrets);
        reference.git_ref = non_blank(self.source.version).or_else(|| non_blank(git.git_ref));
        reference.path = non_blank(self.source.path).or_else(|| non_blank(git.subfolder));
        reference.description = non_blank(self.description);
        Some(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_url_rejected() {
        assert!(ModuleReference::new("   ").is_none());
        assert_eq!(
            ModuleReference::new("  https://github.com/a/b  ").unwrap().url,
            "https://github.com/a/b"
        );
    }

    #[test]
    fn test_serialization_omits_absent_fields() {
        let reference = ModuleReference::new("https://github.com/a/b")
            .unwrap()
            .with_ref("v1.0.0")
            .with_path("   ");

        let value = serde_json::to_value(&reference).unwrap();
        assert_eq!(value, json!({"url": "https://github.com/a/b", "ref": "v1.0.0"}));
    }

    #[test]
    fn test_module_file_git_config_fallback() {
        let file: ModuleFile = serde_json::from_value(json!({
            "name": "eks",
            "description": "EKS cluster",
            "source": {
                "location": "https://github.com/terraform-aws-modules/terraform-aws-eks",
                "git_config": {"ref": "v20.0.0", "subfolder": "modules/node"}
            },
            "env": ["AWS_REGION"],
            "secrets": ["", "AWS_SECRET_ACCESS_KEY"]
        }))
        .unwrap();

        let reference = file.into_reference().unwrap();
        assert_eq!(reference.git_ref.as_deref(), Some("v20.0.0"));
        assert_eq!(reference.path.as_deref(), Some("modules/node"));
        assert_eq!(reference.name.as_deref(), Some("eks"));
        assert_eq!(reference.secrets, vec!["AWS_SECRET_ACCESS_KEY".to_string()]);
    }

    #[test]
    fn test_module_file_version_wins() {
        let file: ModuleFile = serde_json::from_value(json!({
            "name": "vpc",
            "source": {
                "location": "https://github.com/terraform-aws-modules/terraform-aws-vpc",
                "version": "v5.0.0",
                "git_config": {"ref": "main"}
            }
        }))
        .unwrap();

        let reference = file.into_reference().unwrap();
        assert_eq!(reference.git_ref.as_deref(), Some("v5.0.0"));
        assert!(reference.description.is_none());
    }

    #[test]
    fn test_module_file_null_lists() {
        let file: ModuleFile = serde_json::from_value(json!({
            "name": "vpc",
            "source": {"location": "https://github.com/terraform-aws-modules/terraform-aws-vpc"},
            "env": null,
            "secrets": null
        }))
        .unwrap();

        let reference = file.into_reference().unwrap();
        assert!(reference.env.is_empty());
        assert!(reference.secrets.is_empty());
    }
}
