use crate::traits::tool::Tool;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry for managing tool instances.
///
/// Project activation (see `App::activate_project`) registers a fresh
/// batch of symbol tools once an SLS is ready, and deactivation removes
/// them again by name prefix — so the map is held behind a lock rather
/// than rebuilt wholesale, even though lookups vastly outnumber writes.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: Arc<RwLock<HashMap<String, Arc<dyn Tool>>>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            tools: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a registry from a list of tools
    pub fn from_tools(tools: Vec<Arc<dyn Tool>>) -> Self {
        let registry = Self::new();
        registry.extend(tools);
        registry
    }

    /// Get a tool by name
    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().get(name).cloned()
    }

    /// List all registered tools
    pub fn list_tools(&self) -> Vec<Arc<dyn Tool>> {
        self.tools.read().values().cloned().collect()
    }

    /// Get all tool names
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.read().keys().cloned().collect()
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.read().contains_key(name)
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.read().len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.read().is_empty()
    }

    /// Register additional tools, overwriting any existing entry with the
    /// same name. Used to add the per-project symbol tools once an SLS
    /// becomes ready.
    pub fn extend(&self, tools: Vec<Arc<dyn Tool>>) -> usize {
        let mut map = self.tools.write();
        let count = tools.len();
        for tool in tools {
            map.insert(tool.name().to_string(), tool);
        }
        count
    }

    /// Remove every tool whose name starts with `prefix`, returning the
    /// number removed. Used on project deactivation to tear down the
    /// dynamically-registered symbol tools without needing their exact
    /// names.
    pub fn remove_by_prefix(&self, prefix: &str) -> usize {
        let mut map = self.tools.write();
        let to_remove: Vec<String> = map
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect();
        for name in &to_remove {
            map.remove(name);
        }
        to_remove.len()
    }

    /// Remove a single tool by exact name, returning it if present.
    pub fn remove(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.write().remove(name)
    }

    /// Tools carrying the given tag, in the context-filtering sense of
    /// the tool-dispatch contract (§4.7): tags group tools for
    /// enable/disable decisions without needing subclassing.
    pub fn get_by_tag(&self, tag: &str) -> Vec<Arc<dyn Tool>> {
        self.tools
            .read()
            .values()
            .filter(|tool| tool.tags().iter().any(|t| t == tag))
            .cloned()
            .collect()
    }

    /// Names of tools carrying the given tag.
    pub fn get_names_by_tag(&self, tag: &str) -> Vec<String> {
        self.get_by_tag(tag)
            .iter()
            .map(|tool| tool.name().to_string())
            .collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating a tool registry
pub struct ToolRegistryBuilder {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistryBuilder {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn add_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn add_tools(mut self, tools: Vec<Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn build(self) -> ToolRegistry {
        ToolRegistry::from_tools(self.tools)
    }
}

impl Default for ToolRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
