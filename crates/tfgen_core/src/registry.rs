//! Tool sink and the in-memory tool registry.

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::tool::ToolDescriptor;

/// Destination for assembled tool descriptors.
///
/// Registration is a side effect with no read-back. Implementations own
/// any locking they need.
pub trait ToolSink: Send + Sync {
    fn register(&self, category: &str, descriptor: ToolDescriptor);
}

/// A registry of tool descriptors grouped by category.
///
/// Registering a name that already exists in the same category replaces
/// the previous descriptor and logs a warning.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<IndexMap<String, IndexMap<String, ToolDescriptor>>>,
    collisions: RwLock<Vec<String>>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a tool by category and name.
    pub fn get(&self, category: &str, name: &str) -> Option<ToolDescriptor> {
        self.tools
            .read()
            .get(category)
            .and_then(|tools| tools.get(name))
            .cloned()
    }

    /// Check if a tool is registered.
    pub fn contains(&self, category: &str, name: &str) -> bool {
        self.tools
            .read()
            .get(category)
            .map_or(false, |tools| tools.contains_key(name))
    }

    /// Tool names of a category in registration order.
    pub fn names(&self, category: &str) -> Vec<String> {
        self.tools
            .read()
            .get(category)
            .map(|tools| tools.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// All descriptors of a category in registration order.
    pub fn tools(&self, category: &str) -> Vec<ToolDescriptor> {
        self.tools
            .read()
            .get(category)
            .map(|tools| tools.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn categories(&self) -> Vec<String> {
        self.tools.read().keys().cloned().collect()
    }

    /// Total number of registered tools across categories.
    pub fn len(&self) -> usize {
        self.tools.read().values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Qualified names (`category/name`) that were registered more than once.
    pub fn collisions(&self) -> Vec<String> {
        self.collisions.read().clone()
    }
}

impl ToolSink for ToolRegistry {
    fn register(&self, category: &str, descriptor: ToolDescriptor) {
        let name = descriptor.name.clone();
        debug!("Registering tool: {}/{}", category, name);

        let previous = self
            .tools
            .write()
            .entry(category.to_string())
            .or_default()
            .insert(name.clone(), descriptor);

        if previous.is_some() {
            warn!("Tool {}/{} was already registered; replacing it", category, name);
            self.collisions.write().push(format!("{}/{}", category, name));
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tools = self.tools.read();
        let names: Vec<String> = tools
            .iter()
            .flat_map(|(category, tools)| tools.keys().map(move |name| format!("{}/{}", category, name)))
            .collect();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{ExecutionTemplate, ToolAction};

    fn tool(name: &str, description: &str) -> ToolDescriptor {
        ToolDescriptor::new(
            name,
            ToolAction::Plan,
            ExecutionTemplate::new("hashicorp/terraform:latest", "terraform_plan.py"),
        )
        .with_description(description)
    }

    #[test]
    fn test_registry_register() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());

        registry.register("terraform", tool("tf_vpc_plan", "plan"));

        assert_eq!(registry.len(), 1);
        assert!(registry.contains("terraform", "tf_vpc_plan"));
        assert!(!registry.contains("other", "tf_vpc_plan"));
    }

    #[test]
    fn test_registry_names_keep_order() {
        let registry = ToolRegistry::new();
        registry.register("terraform", tool("tf_b_plan", ""));
        registry.register("terraform", tool("tf_a_plan", ""));
        registry.register("reverse", tool("terraform_scan_aws", ""));

        assert_eq!(registry.names("terraform"), vec!["tf_b_plan", "tf_a_plan"]);
        assert_eq!(registry.categories(), vec!["terraform", "reverse"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_registry_last_write_wins() {
        let registry = ToolRegistry::new();
        registry.register("terraform", tool("tf_vpc_plan", "first"));
        registry.register("terraform", tool("tf_vpc_plan", "second"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("terraform", "tf_vpc_plan").unwrap().description, "second");
        assert_eq!(registry.collisions(), vec!["terraform/tf_vpc_plan"]);
    }
}
