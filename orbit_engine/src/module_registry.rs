/// Registry of pluggable modules (video drivers, image loaders, ...).
///
/// Modules are kept sorted by priority, then API version, then name, all
/// descending. Consumers walk the registry in that order and use the first
/// module that succeeds. The registry is an explicit object built at startup
/// and handed to whoever needs it.

/// A registered module
pub struct ModuleEntry<T> {
    /// Unique module name (e.g. "headless", "png")
    pub name: String,
    /// Higher priorities are tried first
    pub priority: i32,
    /// Interface version the module implements
    pub api_version: u32,
    /// The module itself (factory, loader, ...)
    pub module: T,
}

impl<T> ModuleEntry<T> {
    fn sort_key(&self) -> (i32, u32, &str) {
        (self.priority, self.api_version, self.name.as_str())
    }
}

/// Priority-ordered collection of modules
pub struct ModuleRegistry<T> {
    entries: Vec<ModuleEntry<T>>,
}

impl<T> ModuleRegistry<T> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Register a module
    ///
    /// A module registered under an existing name replaces the previous one.
    pub fn register(&mut self, name: &str, priority: i32, api_version: u32, module: T) {
        self.entries.retain(|entry| entry.name != name);

        let entry = ModuleEntry {
            name: name.to_string(),
            priority,
            api_version,
            module,
        };
        let position = self
            .entries
            .iter()
            .position(|existing| existing.sort_key() < entry.sort_key())
            .unwrap_or(self.entries.len());
        self.entries.insert(position, entry);
    }

    /// Remove a module by name. Returns true if it was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.name != name);
        self.entries.len() != before
    }

    /// Find a module by name
    pub fn find(&self, name: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.module)
    }

    /// Iterate over modules in priority order
    pub fn iter(&self) -> impl Iterator<Item = &ModuleEntry<T>> {
        self.entries.iter()
    }

    /// Module names in priority order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for ModuleRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "module_registry_tests.rs"]
mod tests;
