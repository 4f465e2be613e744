/// Lighting manager.
///
/// Owns one constant buffer describing up to `max_light_sources` lights and
/// shares it with every registered shader target. The buffer layout is:
///
/// - `count` (Int32): number of active lights
/// - per slot `i`: `lights[i].position` (Vector3D), `lights[i].ambient`,
///   `lights[i].diffuse`, `lights[i].specular` (Color4), `lights[i].strength` (Float)
///
/// The value index of every slot field is resolved once when the manager is
/// built. `pre_render` copies enabled lights into the slots, in registration
/// order, writing only the values that changed so unchanged frames cost no
/// upload.

use std::sync::{Arc, Mutex, Weak};

use crate::lighting::light_source::LightSourceRef;
use crate::resource::{
    ShaderConstantBuffer, ShaderConstantBufferRef, ShaderConstantBufferTemplate,
    ShaderConstantBufferTemplateBuilder, ShaderDesc, ShaderRef,
};
use crate::scene::{ShaderTarget, ShaderTargetRef};
use crate::utils::lock;
use crate::value_type::{ShaderValue, ValueType};
use crate::engine_debug;

/// Per-light fields, in the order of a slot's index table
const LIGHT_FIELDS: [&str; 5] = ["position", "ambient", "diffuse", "specular", "strength"];

/// Value indices of one light slot, in `LIGHT_FIELDS` order
type LightSlot = [usize; 5];

fn light_slot(template: &ShaderConstantBufferTemplate, slot: usize) -> Option<LightSlot> {
    let mut indices = [0; 5];
    for (index, field) in indices.iter_mut().zip(LIGHT_FIELDS) {
        *index = template.find_shader_value_index(&format!("lights[{slot}].{field}"))?;
    }
    Some(indices)
}

// ===== BUILDER =====

#[derive(Debug)]
pub struct LightingManagerBuilder {
    max_light_sources: usize,
    buffer_name: String,
    default_shader: Option<ShaderRef>,
}

impl Default for LightingManagerBuilder {
    fn default() -> Self {
        Self {
            max_light_sources: 4,
            buffer_name: "Lighting".to_string(),
            default_shader: None,
        }
    }
}

impl LightingManagerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_light_sources(mut self, max: usize) -> Self {
        self.max_light_sources = max;
        self
    }

    /// Name the buffer is attached under in shader targets
    pub fn with_buffer_name(mut self, name: &str) -> Self {
        self.buffer_name = name.to_string();
        self
    }

    /// Shader given to targets that have none
    pub fn with_default_shader(mut self, shader: ShaderRef) -> Self {
        self.default_shader = Some(shader);
        self
    }

    pub fn build(self) -> LightingManager {
        let mut builder = ShaderConstantBufferTemplateBuilder::new().with_entry(ValueType::Int32, 1, "count");
        for slot in 0..self.max_light_sources {
            builder = builder
                .with_entry(ValueType::Vector3D, 1, &format!("lights[{slot}].position"))
                .with_entry(ValueType::Color4, 1, &format!("lights[{slot}].ambient"))
                .with_entry(ValueType::Color4, 1, &format!("lights[{slot}].diffuse"))
                .with_entry(ValueType::Color4, 1, &format!("lights[{slot}].specular"))
                .with_entry(ValueType::Float, 1, &format!("lights[{slot}].strength"));
        }
        let template = builder.build();
        let count_index = template.find_shader_value_index("count");
        let slots: Vec<LightSlot> = (0..self.max_light_sources)
            .filter_map(|slot| light_slot(&template, slot))
            .collect();
        engine_debug!("orbit::LightingManager",
            "Lighting buffer '{}': {} slots, {} bytes", self.buffer_name, self.max_light_sources, template.size());

        LightingManager {
            buffer: ShaderConstantBuffer::new_shared(template.clone()),
            template,
            buffer_name: self.buffer_name,
            max_light_sources: self.max_light_sources,
            count_index,
            slots,
            default_shader: self.default_shader,
            lights: Vec::new(),
            targets: Vec::new(),
        }
    }
}

// ===== MANAGER =====

#[derive(Debug)]
pub struct LightingManager {
    template: Arc<ShaderConstantBufferTemplate>,
    buffer: ShaderConstantBufferRef,
    buffer_name: String,
    max_light_sources: usize,
    count_index: Option<usize>,
    slots: Vec<LightSlot>,
    default_shader: Option<ShaderRef>,
    lights: Vec<LightSourceRef>,
    targets: Vec<Weak<Mutex<ShaderTarget>>>,
}

impl LightingManager {
    pub fn builder() -> LightingManagerBuilder {
        LightingManagerBuilder::new()
    }

    pub fn template(&self) -> &Arc<ShaderConstantBufferTemplate> {
        &self.template
    }

    pub fn buffer(&self) -> &ShaderConstantBufferRef {
        &self.buffer
    }

    pub fn buffer_name(&self) -> &str {
        &self.buffer_name
    }

    pub fn max_light_sources(&self) -> usize {
        self.max_light_sources
    }

    /// Value indices of slot `slot`: position, ambient, diffuse, specular, strength
    pub fn light_slot_indices(&self, slot: usize) -> Option<[usize; 5]> {
        self.slots.get(slot).copied()
    }

    /// Declare the lighting buffer in a shader descriptor
    pub fn declare(&self, desc: ShaderDesc) -> ShaderDesc {
        desc.with_constant_buffer(&self.buffer_name, self.template.clone())
    }

    // ===== LIGHTS =====

    /// Register a light; false if it is already registered
    pub fn add_light_source(&mut self, light: &LightSourceRef) -> bool {
        if self.lights.iter().any(|existing| Arc::ptr_eq(existing, light)) {
            return false;
        }
        self.lights.push(light.clone());
        true
    }

    /// Unregister a light; false if it was not registered
    pub fn remove_light_source(&mut self, light: &LightSourceRef) -> bool {
        let before = self.lights.len();
        self.lights.retain(|existing| !Arc::ptr_eq(existing, light));
        self.lights.len() != before
    }

    pub fn light_source_count(&self) -> usize {
        self.lights.len()
    }

    // ===== TARGETS =====

    pub fn default_shader(&self) -> Option<&ShaderRef> {
        self.default_shader.as_ref()
    }

    pub fn set_default_shader(&mut self, shader: Option<ShaderRef>) {
        self.default_shader = shader;
    }

    /// Attach the lighting buffer to `target`
    ///
    /// The target gets the default shader if it has none. Targets are held
    /// weakly; dropping one is enough to unregister it. Returns false if the
    /// target was already registered.
    pub fn add_target(&mut self, target: &ShaderTargetRef) -> bool {
        let weak = Arc::downgrade(target);
        if self.targets.iter().any(|existing| existing.ptr_eq(&weak)) {
            return false;
        }
        let mut guard = lock(target);
        guard.set_constant_buffer(&self.buffer_name, self.buffer.clone());
        if guard.shader().is_none() {
            guard.set_shader(self.default_shader.clone());
        }
        drop(guard);
        self.targets.push(weak);
        true
    }

    /// Detach the lighting buffer from `target`
    pub fn remove_target(&mut self, target: &ShaderTargetRef) -> bool {
        let weak = Arc::downgrade(target);
        let Some(index) = self.targets.iter().position(|existing| existing.ptr_eq(&weak)) else {
            return false;
        };
        self.targets.remove(index);
        let mut guard = lock(target);
        if guard
            .constant_buffer(&self.buffer_name)
            .is_some_and(|buffer| Arc::ptr_eq(buffer, &self.buffer))
        {
            guard.remove_constant_buffer(&self.buffer_name);
        }
        true
    }

    /// Number of registered targets still alive
    pub fn target_count(&self) -> usize {
        self.targets.iter().filter(|target| target.strong_count() > 0).count()
    }

    // ===== FRAME =====

    /// Copy the enabled lights into the buffer; returns the active count
    ///
    /// Lights beyond `max_light_sources` are ignored. The count is written last.
    pub fn pre_render(&mut self) -> usize {
        self.targets.retain(|target| target.strong_count() > 0);

        let mut buffer = lock(&self.buffer);
        let mut slots = self.slots.iter();
        let mut active = 0;
        for light in &self.lights {
            let light = lock(light);
            if !light.is_enabled() {
                continue;
            }
            let Some(&[position, ambient, diffuse, specular, strength]) = slots.next() else {
                break;
            };
            buffer.set_shader_value_if_changed(position, ShaderValue::Vector3D(light.position()));
            buffer.set_shader_value_if_changed(ambient, ShaderValue::Color4(light.ambient()));
            buffer.set_shader_value_if_changed(diffuse, ShaderValue::Color4(light.diffuse()));
            buffer.set_shader_value_if_changed(specular, ShaderValue::Color4(light.specular()));
            buffer.set_shader_value_if_changed(strength, ShaderValue::Float(light.strength()));
            active += 1;
        }
        if let Some(count) = self.count_index {
            buffer.set_shader_value_if_changed(count, ShaderValue::Int32(active as i32));
        }
        active
    }
}

#[cfg(test)]
#[path = "lighting_manager_tests.rs"]
mod tests;
