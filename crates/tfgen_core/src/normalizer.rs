//! Module input normalization.
//!
//! Module lists arrive in four shapes. Each shape is a variant of
//! [`ModuleInput`] and [`normalize`] turns any of them into the same
//! ordered list of [`ModuleReference`]s.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::module::{non_blank, null_as_default, ModuleReference};

/// Host that registry coordinates are rewritten onto.
pub const REGISTRY_HOST: &str = "registry.terraform.io";

/// The accepted shapes of module input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModuleInput {
    /// `"url1, url2"`
    Csv(String),
    /// `["url1", "url2"]`
    Urls(Vec<String>),
    /// `[{"url": "url1", "ref": "main"}, ...]`
    Entries(Vec<ListItem>),
    /// `{"vpc": {"source": "terraform-aws-modules/vpc/aws", "version": "5.0.0"}}`
    Named(IndexMap<String, NamedItem>),
}

/// One element of a list-shaped input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListItem {
    Url(String),
    Entry(ModuleEntry),
    Invalid(Value),
}

/// A per-module mapping object from a list-shaped input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleEntry {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(rename = "ref", default)]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub env: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub secrets: Vec<String>,
}

/// One value of a name-keyed input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NamedItem {
    Module(NamedModule),
    Invalid(Value),
}

/// Module config object of the name-keyed shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedModule {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    /// Absent or `null` means enabled.
    #[serde(default)]
    pub auto_discover: Option<bool>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub variables: Map<String, Value>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ModuleInput {
    /// Normalize this input into canonical references.
    pub fn normalize(&self) -> Vec<ModuleReference> {
        normalize(self)
    }
}

/// Normalize any accepted input shape into canonical references.
///
/// Entries that cannot be normalized are dropped; the rest keep input order.
pub fn normalize(input: &ModuleInput) -> Vec<ModuleReference> {
    let references: Vec<ModuleReference> = match input {
        ModuleInput::Csv(urls) => urls.split(',').filter_map(ModuleReference::new).collect(),
        ModuleInput::Urls(urls) => urls.iter().filter_map(ModuleReference::new).collect(),
        ModuleInput::Entries(items) => items.iter().filter_map(normalize_item).collect(),
        ModuleInput::Named(modules) => modules
            .iter()
            .filter_map(|(name, item)| normalize_named(name, item))
            .collect(),
    };

    debug!("Normalized {} module reference(s)", references.len());
    references
}

fn normalize_item(item: &ListItem) -> Option<ModuleReference> {
    match item {
        ListItem::Url(url) => ModuleReference::new(url),
        ListItem::Entry(entry) => {
            if entry.url.is_none() {
                warn!("Skipping module config missing URL: {:?}", entry);
                return None;
            }
            normalize_entry(entry)
        }
        ListItem::Invalid(value) => {
            warn!("Skipping invalid module config: {}", value);
            None
        }
    }
}

fn normalize_entry(entry: &ModuleEntry) -> Option<ModuleReference> {
    let mut reference = ModuleReference::new(entry.url.as_deref()?)?;
    reference.git_ref = non_blank(entry.git_ref.clone())
        .or_else(|| non_blank(entry.version.clone()))
        .or_else(|| non_blank(entry.branch.clone()));
    reference.path = non_blank(entry.path.clone());
    reference.name = non_blank(entry.name.clone());
    reference.description = non_blank(entry.description.clone());
    reference.provider = non_blank(entry.provider.clone());
    reference.resource_type = non_blank(entry.resource_type.clone());
    reference.metadata = entry
        .metadata
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Some(
        reference
            .with_env(entry.env.clone())
            .with_secrets(entry.secrets.clone()),
    )
}

fn normalize_named(name: &str, item: &NamedItem) -> Option<ModuleReference> {
    let module = match item {
        NamedItem::Module(module) => module,
        NamedItem::Invalid(value) => {
            warn!("Skipping invalid config for module {}: {}", name, value);
            return None;
        }
    };

    let Some(source) = non_blank(module.source.clone()) else {
        warn!("Skipping module {}: no source configured", name);
        return None;
    };
    let mut reference = ModuleReference::new(registry_url(&source))?.with_name(name);
    reference.git_ref = non_blank(module.version.clone());
    reference.description = non_blank(module.description.clone());

    if module.auto_discover == Some(false) {
        reference = reference.with_metadata("auto_discover", Value::Bool(false));
    }
    if let Some(instructions) = non_blank(module.instructions.clone()) {
        reference = reference.with_metadata("instructions", Value::String(instructions));
    }
    if !module.variables.is_empty() {
        reference = reference.with_metadata("variables", Value::Object(module.variables.clone()));
    }
    Some(reference)
}

/// Rewrite a `namespace/name/provider` registry coordinate into a fully
/// qualified registry URL. Anything else is returned unchanged.
pub fn registry_url(source: &str) -> String {
    if is_registry_coordinate(source) {
        format!("{}/{}", REGISTRY_HOST, source)
    } else {
        source.to_string()
    }
}

/// Whether `source` looks like a bare `namespace/name/provider` coordinate.
pub fn is_registry_coordinate(source: &str) -> bool {
    let parts: Vec<&str> = source.split('/').collect();
    parts.len() == 3
        && !source.contains(':')
        && !parts[0].contains('.')
        && parts.iter().all(|p| !p.is_empty())
}
