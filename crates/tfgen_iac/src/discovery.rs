//! Variable discovery port.
//!
//! Fetching and parsing module sources happens outside this crate. The
//! pipeline only sees the [`VariableDiscovery`] trait and the structured
//! [`DiscoveryOutcome`] it returns.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use tfgen_core::{ModuleReference, Variable};

use crate::error::IacResult;

/// What to discover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryRequest {
    pub source_url: String,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Concurrency hint for the implementation; the pipeline never schedules it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,
}

impl DiscoveryRequest {
    pub fn for_module(reference: &ModuleReference) -> Self {
        Self {
            source_url: reference.url.clone(),
            git_ref: reference.git_ref.clone(),
            path: reference.path.clone(),
            max_workers: None,
        }
    }

    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = Some(workers);
        self
    }
}

/// Variables, warnings and errors reported for one module.
///
/// Non-empty `errors` make the module fail; `warnings` are advisory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryOutcome {
    #[serde(default)]
    pub variables: IndexMap<String, Variable>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
    /// Ref the implementation actually checked out, if it knows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_ref: Option<String>,
}

impl DiscoveryOutcome {
    /// Build an outcome from variables, keyed by their names.
    pub fn from_variables(variables: impl IntoIterator<Item = Variable>) -> Self {
        Self {
            variables: variables.into_iter().map(|v| (v.name.clone(), v)).collect(),
            ..Self::default()
        }
    }

    /// An outcome that carries only errors.
    pub fn failed(errors: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            errors: errors.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_resolved_ref(mut self, git_ref: impl Into<String>) -> Self {
        self.resolved_ref = Some(git_ref.into());
        self
    }

    /// Fill in variable names from map keys where the payload omitted them.
    pub fn with_names_from_keys(mut self) -> Self {
        for (key, variable) in self.variables.iter_mut() {
            if variable.name.trim().is_empty() {
                variable.name = key.clone();
            }
        }
        self
    }
}

/// Discovers the declared variables of a Terraform module.
#[async_trait]
pub trait VariableDiscovery: Send + Sync {
    /// Discover variables for one module.
    ///
    /// `Err` and a non-empty `errors` list are both fatal for that module only.
    async fn discover(&self, request: &DiscoveryRequest) -> IacResult<DiscoveryOutcome>;
}
