//! File-backed variable discovery.
//!
//! An external parser writes one JSON snapshot per module; this port serves
//! them back to the pipeline.
//!
//! ```json
//! {
//!   "source": "https://github.com/terraform-aws-modules/terraform-aws-vpc",
//!   "ref": "v5.0.0",
//!   "resolved_ref": "v5.0.0",
//!   "variables": {
//!     "cidr": {"type": "string", "default": "10.0.0.0/16", "description": "VPC CIDR"}
//!   },
//!   "warnings": []
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use tfgen_core::Variable;

use crate::discovery::{DiscoveryOutcome, DiscoveryRequest, VariableDiscovery};
use crate::error::{IacError, IacResult};

/// One module's discovered variables as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableSnapshot {
    pub source: String,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_ref: Option<String>,
    #[serde(default)]
    pub variables: IndexMap<String, Variable>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl VariableSnapshot {
    fn same_module(&self, request: &DiscoveryRequest) -> bool {
        let same_source = normalize_source(&self.source) == normalize_source(&request.source_url);
        let same_path = self.path.as_deref().map(|p| p.trim_matches('/'))
            == request.path.as_deref().map(|p| p.trim_matches('/'));
        same_source && same_path
    }

    /// A snapshot pinned to one ref never serves another.
    fn serves_ref(&self, request: &DiscoveryRequest) -> bool {
        match (&self.git_ref, &request.git_ref) {
            (Some(pinned), Some(requested)) => pinned == requested,
            _ => true,
        }
    }

    fn to_outcome(&self, request: &DiscoveryRequest) -> DiscoveryOutcome {
        let mut warnings = self.warnings.clone();
        if let (None, Some(requested)) = (&self.git_ref, &request.git_ref) {
            warnings.push(format!(
                "Snapshot for {} records no ref; its variables may not match requested ref {}",
                self.source, requested
            ));
        }
        DiscoveryOutcome {
            variables: self.variables.clone(),
            warnings,
            errors: self.errors.clone(),
            resolved_ref: self.resolved_ref.clone().or_else(|| self.git_ref.clone()),
        }
        .with_names_from_keys()
    }
}

fn normalize_source(source: &str) -> &str {
    let source = source.trim().trim_end_matches('/');
    source.strip_suffix(".git").unwrap_or(source)
}

/// Discovery port backed by a directory of JSON snapshots.
#[derive(Debug, Clone, Default)]
pub struct SnapshotDiscovery {
    snapshots: Vec<VariableSnapshot>,
}

impl SnapshotDiscovery {
    pub fn new(snapshots: Vec<VariableSnapshot>) -> Self {
        Self { snapshots }
    }

    /// Load every `*.json` snapshot below `dir`.
    ///
    /// Unreadable or malformed files are logged and skipped.
    pub fn load(dir: impl AsRef<Path>) -> IacResult<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(IacError::Configuration(format!(
                "Snapshot directory not found: {:?}",
                dir
            )));
        }

        let mut snapshots = Vec::new();
        for path in json_files(dir, usize::MAX) {
            match read_snapshot(&path) {
                Ok(snapshot) => {
                    debug!("Loaded variable snapshot for {} from {:?}", snapshot.source, path);
                    snapshots.push(snapshot);
                }
                Err(e) => warn!("Skipping invalid snapshot {:?}: {}", path, e),
            }
        }

        info!("Loaded {} variable snapshot(s) from {:?}", snapshots.len(), dir);
        Ok(Self { snapshots })
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// An exact ref match wins over a ref-less snapshot of the same module.
    fn find(&self, request: &DiscoveryRequest) -> Option<&VariableSnapshot> {
        let mut fallback = None;
        for snapshot in &self.snapshots {
            if !snapshot.same_module(request) || !snapshot.serves_ref(request) {
                continue;
            }
            if snapshot.git_ref.is_some() && snapshot.git_ref == request.git_ref {
                return Some(snapshot);
            }
            fallback = fallback.or(Some(snapshot));
        }
        fallback
    }
}

fn read_snapshot(path: &Path) -> IacResult<VariableSnapshot> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// `*.json` files below `dir`, sorted by path. `max_depth` of 1 reads
/// only the top level.
pub(crate) fn json_files(dir: &Path, max_depth: usize) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && p.extension().map_or(false, |ext| ext == "json"))
        .collect()
}

#[async_trait]
impl VariableDiscovery for SnapshotDiscovery {
    async fn discover(&self, request: &DiscoveryRequest) -> IacResult<DiscoveryOutcome> {
        match self.find(request) {
            Some(snapshot) => Ok(snapshot.to_outcome(request)),
            None => Err(IacError::Discovery(format!(
                "No variable snapshot for {}{}",
                request.source_url,
                request
                    .git_ref
                    .as_deref()
                    .map(|r| format!(" @ {}", r))
                    .unwrap_or_default()
            ))),
        }
    }
}
