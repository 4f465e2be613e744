/// Shader constant buffer instance.
///
/// Holds the live bytes of one constant buffer laid out by a shared
/// template, plus a 16-bit change version. Every successful write bumps the
/// version; backends compare it with the version of their last upload to
/// skip redundant transfers. Version 0 means "never written" and is skipped
/// on wraparound.

use std::sync::{Arc, Mutex};

use crate::device::{ConstantBufferContent, DeviceBound, DeviceResource, Screen};
use crate::resource::constant_buffer_template::{ShaderConstantBufferEntry, ShaderConstantBufferTemplate};
use crate::value_type::ShaderValue;
use crate::engine_warn;

/// Shared handle to a constant buffer
pub type ShaderConstantBufferRef = Arc<Mutex<ShaderConstantBuffer>>;

#[derive(Debug)]
pub struct ShaderConstantBuffer {
    template: Arc<ShaderConstantBufferTemplate>,
    data: Vec<u8>,
    change_ver: u16,
    resource: DeviceResource<dyn ConstantBufferContent>,
}

impl ShaderConstantBuffer {
    /// Create a zero-filled buffer for `template`
    pub fn new(template: Arc<ShaderConstantBufferTemplate>) -> Self {
        let data = vec![0; template.size()];
        Self {
            template,
            data,
            change_ver: 0,
            resource: DeviceResource::new(),
        }
    }

    /// Create a zero-filled buffer behind a shared handle
    pub fn new_shared(template: Arc<ShaderConstantBufferTemplate>) -> ShaderConstantBufferRef {
        Arc::new(Mutex::new(Self::new(template)))
    }

    pub fn template(&self) -> &Arc<ShaderConstantBufferTemplate> {
        &self.template
    }

    /// Raw bytes of the whole buffer
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Version of the current bytes (0 = never written)
    pub fn change_ver(&self) -> u16 {
        self.change_ver
    }

    fn bump_change_ver(&mut self) {
        self.change_ver = match self.change_ver {
            u16::MAX => 1,
            ver => ver + 1,
        };
    }

    // ===== WRITES =====

    /// Copy `bytes` at `offset`
    ///
    /// Returns false without writing anything if the range does not fit
    /// inside the buffer.
    pub fn write_data_at_offset(&mut self, offset: usize, bytes: &[u8]) -> bool {
        let end = match offset.checked_add(bytes.len()) {
            Some(end) if end <= self.data.len() => end,
            _ => {
                engine_warn!("orbit::ShaderConstantBuffer",
                    "Write of {} bytes at offset {} exceeds buffer size {}",
                    bytes.len(), offset, self.data.len());
                return false;
            }
        };
        self.data[offset..end].copy_from_slice(bytes);
        self.bump_change_ver();
        true
    }

    fn checked_element_offset(entry: &ShaderConstantBufferEntry, element: usize, value: &ShaderValue) -> Option<usize> {
        if value.value_type() != entry.value_type {
            engine_warn!("orbit::ShaderConstantBuffer",
                "Entry '{}' is {:?}, got {:?}", entry.name, entry.value_type, value.value_type());
            return None;
        }
        if element >= entry.count {
            engine_warn!("orbit::ShaderConstantBuffer",
                "Element {} out of range for entry '{}' ({} elements)", element, entry.name, entry.count);
            return None;
        }
        Some(entry.offset + element * entry.value_type.size_bytes())
    }

    /// Write one element of the entry at `index`
    pub fn set_shader_value_element(&mut self, index: usize, element: usize, value: ShaderValue) -> bool {
        let offset = match self.template.entry(index) {
            Some(entry) => Self::checked_element_offset(entry, element, &value),
            None => {
                engine_warn!("orbit::ShaderConstantBuffer", "No entry at index {}", index);
                None
            }
        };
        match offset {
            Some(offset) => self.write_data_at_offset(offset, &value.to_bytes()),
            None => false,
        }
    }

    /// Write the first element of the entry at `index`
    pub fn set_shader_value_at(&mut self, index: usize, value: ShaderValue) -> bool {
        self.set_shader_value_element(index, 0, value)
    }

    /// Write the first element of the entry called `name`
    ///
    /// Returns false if the name is unknown or the value type does not match.
    pub fn set_shader_value(&mut self, name: &str, value: ShaderValue) -> bool {
        match self.template.find_shader_value_index(name) {
            Some(index) => self.set_shader_value_at(index, value),
            None => {
                engine_warn!("orbit::ShaderConstantBuffer", "Unknown entry '{}'", name);
                false
            }
        }
    }

    /// Write consecutive elements of the entry at `index`, starting at element 0
    pub fn set_shader_values_at(&mut self, index: usize, values: &[ShaderValue]) -> bool {
        let Some(entry) = self.template.entry(index) else {
            return false;
        };
        if values.len() > entry.count {
            engine_warn!("orbit::ShaderConstantBuffer",
                "{} values do not fit entry '{}' ({} elements)", values.len(), entry.name, entry.count);
            return false;
        }
        if values.iter().any(|value| value.value_type() != entry.value_type) {
            return false;
        }
        let bytes: Vec<u8> = values.iter().flat_map(|value| value.to_bytes()).collect();
        let offset = entry.offset;
        self.write_data_at_offset(offset, &bytes)
    }

    /// Write the entry at `index` only if its stored bytes differ
    ///
    /// Leaves `change_ver` untouched when the value is already stored.
    /// Returns false only if the write was needed and failed.
    pub fn set_shader_value_if_changed(&mut self, index: usize, value: ShaderValue) -> bool {
        if self.shader_value_at(index, 0) == Some(value) {
            return true;
        }
        self.set_shader_value_at(index, value)
    }

    // ===== READS =====

    /// Bytes of the entry called `name` (all elements)
    pub fn shader_data(&self, name: &str) -> Option<&[u8]> {
        let entry = self.template.find_entry(name)?;
        Some(&self.data[entry.offset..entry.end()])
    }

    /// First element of the entry called `name`
    pub fn shader_value(&self, name: &str) -> Option<ShaderValue> {
        let index = self.template.find_shader_value_index(name)?;
        self.shader_value_at(index, 0)
    }

    pub fn shader_value_at(&self, index: usize, element: usize) -> Option<ShaderValue> {
        let entry = self.template.entry(index)?;
        if element >= entry.count {
            return None;
        }
        let offset = entry.offset + element * entry.value_type.size_bytes();
        ShaderValue::from_bytes(entry.value_type, &self.data[offset..entry.end()])
    }

    /// Load content if needed and upload the bytes when they changed
    pub(crate) fn prepare(&mut self, screen: &mut Screen) -> Option<&dyn ConstantBufferContent> {
        if !self.load_content_from(screen) {
            return None;
        }
        let content = self.resource.content_mut()?;
        if !content.upload(&self.data, self.change_ver) {
            engine_warn!("orbit::ShaderConstantBuffer", "Constant buffer upload failed");
            return None;
        }
        self.resource.content()
    }
}

impl DeviceBound for ShaderConstantBuffer {
    fn load_content_from(&mut self, screen: &mut Screen) -> bool {
        let template = &self.template;
        self.resource.load_with(screen, "constant buffer", |driver| {
            driver.create_constant_buffer_content(template)
        })
    }

    fn unload_content(&mut self) {
        self.resource.unload_content();
    }

    fn is_loaded(&self) -> bool {
        self.resource.is_loaded()
    }
}

#[cfg(test)]
#[path = "constant_buffer_tests.rs"]
mod tests;
