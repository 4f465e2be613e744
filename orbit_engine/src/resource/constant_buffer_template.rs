/// Shader constant buffer layout.
///
/// A template is an ordered list of named typed entries packed without
/// padding: the offset of an entry is the sum of the sizes of every entry
/// before it. Templates are assembled with `ShaderConstantBufferTemplateBuilder`
/// and are immutable afterwards, so they can be shared (`Arc`) by every
/// buffer and shader that uses the same layout.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::value_type::ValueType;
use crate::engine_warn;

// ===== ENTRY =====

/// A named entry of a constant buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderConstantBufferEntry {
    pub name: String,
    pub value_type: ValueType,
    /// Number of elements (arrays have more than one)
    pub count: usize,
    /// Byte offset from the start of the buffer
    pub offset: usize,
}

impl ShaderConstantBufferEntry {
    /// Total size of the entry in bytes
    pub fn size_bytes(&self) -> usize {
        self.value_type.size_bytes() * self.count
    }

    /// Offset just past the entry
    pub fn end(&self) -> usize {
        self.offset + self.size_bytes()
    }
}

// ===== TEMPLATE =====

/// Immutable constant buffer layout
#[derive(Debug, Clone)]
pub struct ShaderConstantBufferTemplate {
    entries: Vec<ShaderConstantBufferEntry>,
    names: FxHashMap<String, usize>,
    size: usize,
}

impl ShaderConstantBufferTemplate {
    /// Start building a template
    pub fn builder() -> ShaderConstantBufferTemplateBuilder {
        ShaderConstantBufferTemplateBuilder::new()
    }

    /// Find an entry by name
    pub fn find_entry(&self, name: &str) -> Option<&ShaderConstantBufferEntry> {
        self.find_shader_value_index(name).map(|index| &self.entries[index])
    }

    /// Index of an entry, for index-based writes in hot loops
    pub fn find_shader_value_index(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    pub fn entry(&self, index: usize) -> Option<&ShaderConstantBufferEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[ShaderConstantBufferEntry] {
        &self.entries
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Total size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// True if both templates describe the same layout
    pub fn is_compatible(self: &Arc<Self>, other: &Arc<Self>) -> bool {
        Arc::ptr_eq(self, other) || self.entries == other.entries
    }
}

impl PartialEq for ShaderConstantBufferTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for ShaderConstantBufferTemplate {}

// ===== BUILDER =====

/// Accumulates entries, then freezes them into a template
#[derive(Debug, Default)]
pub struct ShaderConstantBufferTemplateBuilder {
    entries: Vec<ShaderConstantBufferEntry>,
    names: FxHashMap<String, usize>,
    size: usize,
}

impl ShaderConstantBufferTemplateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at the current end of the layout
    ///
    /// Returns false (and adds nothing) if `name` is already used or
    /// `count` is zero.
    pub fn add_entry(&mut self, value_type: ValueType, count: usize, name: &str) -> bool {
        if self.names.contains_key(name) {
            engine_warn!("orbit::ShaderConstantBufferTemplate",
                "Entry '{}' already exists", name);
            return false;
        }
        if count == 0 {
            engine_warn!("orbit::ShaderConstantBufferTemplate",
                "Entry '{}' has zero elements", name);
            return false;
        }

        let entry = ShaderConstantBufferEntry {
            name: name.to_string(),
            value_type,
            count,
            offset: self.size,
        };
        self.size = entry.end();
        self.names.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
        true
    }

    /// Chaining variant of `add_entry` that ignores rejected entries
    pub fn with_entry(mut self, value_type: ValueType, count: usize, name: &str) -> Self {
        self.add_entry(value_type, count, name);
        self
    }

    /// Current accumulated size
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn find_entry(&self, name: &str) -> Option<&ShaderConstantBufferEntry> {
        self.names.get(name).map(|&index| &self.entries[index])
    }

    /// Freeze the layout
    pub fn build(self) -> Arc<ShaderConstantBufferTemplate> {
        Arc::new(ShaderConstantBufferTemplate {
            entries: self.entries,
            names: self.names,
            size: self.size,
        })
    }
}

#[cfg(test)]
#[path = "constant_buffer_template_tests.rs"]
mod tests;
