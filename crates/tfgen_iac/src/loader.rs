//! Per-module JSON configuration directories.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use tfgen_core::{ModuleFile, ModuleReference};

use crate::error::{IacError, IacResult};
use crate::snapshot::json_files;

/// Loads module references from a directory of `*.json` module files.
#[derive(Debug, Clone)]
pub struct ModuleConfigLoader {
    dir: PathBuf,
}

impl ModuleConfigLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load every module file in the directory.
    ///
    /// A malformed file is logged and skipped; only a missing directory is
    /// an error.
    pub fn load(&self) -> IacResult<Vec<ModuleReference>> {
        if !self.dir.is_dir() {
            return Err(IacError::Configuration(format!(
                "Module config directory not found: {:?}",
                self.dir
            )));
        }

        let mut modules = Vec::new();
        for path in json_files(&self.dir, 1) {
            match read_module_file(&path) {
                Ok(Some(reference)) => {
                    debug!("Loaded module config {:?}", path);
                    modules.push(reference);
                }
                Ok(None) => warn!("Skipping module config {:?}: empty source location", path),
                Err(e) => warn!("Skipping invalid module config {:?}: {}", path, e),
            }
        }

        info!("Loaded {} module config(s) from {:?}", modules.len(), self.dir);
        Ok(modules)
    }
}

fn read_module_file(path: &Path) -> IacResult<Option<ModuleReference>> {
    let content = fs::read_to_string(path)?;
    let file: ModuleFile = serde_json::from_str(&content)?;
    Ok(file.into_reference())
}
