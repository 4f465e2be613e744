/// Binding capabilities shared by drawable node contents.
///
/// A `ShaderTarget` holds the shader a content draws with plus the named
/// constant buffers bound alongside it. A `TextureTarget` holds the textures
/// bound to consecutive texture units.

use std::sync::{Arc, Mutex};

use crate::render::RenderContext;
use crate::resource::{ShaderConstantBufferRef, ShaderRef, TextureRef};
use crate::utils::lock;

/// Shared handle to a shader target, so external managers can feed it buffers
pub type ShaderTargetRef = Arc<Mutex<ShaderTarget>>;

// ===== SHADER TARGET =====

#[derive(Debug, Default)]
pub struct ShaderTarget {
    shader: Option<ShaderRef>,
    constant_buffers: Vec<(String, ShaderConstantBufferRef)>,
}

impl ShaderTarget {
    pub fn new(shader: Option<ShaderRef>) -> Self {
        Self {
            shader,
            constant_buffers: Vec::new(),
        }
    }

    pub fn new_shared(shader: Option<ShaderRef>) -> ShaderTargetRef {
        Arc::new(Mutex::new(Self::new(shader)))
    }

    pub fn shader(&self) -> Option<&ShaderRef> {
        self.shader.as_ref()
    }

    pub fn set_shader(&mut self, shader: Option<ShaderRef>) {
        self.shader = shader;
    }

    /// Bind `buffer` under `name`, replacing any buffer of that name
    pub fn set_constant_buffer(&mut self, name: &str, buffer: ShaderConstantBufferRef) {
        match self.constant_buffers.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = buffer,
            None => self.constant_buffers.push((name.to_string(), buffer)),
        }
    }

    pub fn constant_buffer(&self, name: &str) -> Option<&ShaderConstantBufferRef> {
        self.constant_buffers
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, buffer)| buffer)
    }

    pub fn remove_constant_buffer(&mut self, name: &str) -> Option<ShaderConstantBufferRef> {
        let index = self.constant_buffers.iter().position(|(existing, _)| existing == name)?;
        Some(self.constant_buffers.remove(index).1)
    }

    pub fn constant_buffer_count(&self) -> usize {
        self.constant_buffers.len()
    }

    /// Bind the shader and its constant buffers
    ///
    /// Returns false when there is no shader or it could not be bound.
    /// Buffers the shader does not declare are skipped.
    pub fn apply(&self, ctx: &mut RenderContext<'_>) -> bool {
        let Some(shader) = &self.shader else {
            return false;
        };
        if !ctx.set_shader(Some(shader)) {
            return false;
        }
        for (_, buffer) in &self.constant_buffers {
            let template = lock(buffer).template().clone();
            ctx.assign_shader_constant_buffer(&template, buffer);
        }
        true
    }
}

// ===== TEXTURE TARGET =====

#[derive(Debug, Default, Clone)]
pub struct TextureTarget {
    layers: Vec<Option<TextureRef>>,
}

impl TextureTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Texture on layer 0 only
    pub fn single(texture: TextureRef) -> Self {
        Self {
            layers: vec![Some(texture)],
        }
    }

    /// Set (or clear with None) the texture of `layer`, growing the list as needed
    pub fn set_texture(&mut self, layer: usize, texture: Option<TextureRef>) {
        if layer >= self.layers.len() {
            self.layers.resize(layer + 1, None);
        }
        self.layers[layer] = texture;
        while matches!(self.layers.last(), Some(None)) {
            self.layers.pop();
        }
    }

    pub fn texture(&self, layer: usize) -> Option<&TextureRef> {
        self.layers.get(layer).and_then(Option::as_ref)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Bind every layer to its texture unit and disable the units above
    ///
    /// Returns false if a texture could not be bound.
    pub fn apply(&self, ctx: &mut RenderContext<'_>) -> bool {
        let mut complete = true;
        for (unit, texture) in self.layers.iter().enumerate() {
            complete &= ctx.set_texture(unit, texture.as_ref());
        }
        ctx.prepare_texture_layers(self.layers.len());
        complete
    }
}

#[cfg(test)]
#[path = "targets_tests.rs"]
mod tests;
