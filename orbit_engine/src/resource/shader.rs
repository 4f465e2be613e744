/// Shader program resource.
///
/// A shader keeps its sources, the vertex input layout it consumes and the
/// constant buffers it declares. Compilation happens in the backend when the
/// content is created.

use std::sync::{Arc, Mutex};

use crate::device::{DeviceBound, DeviceResource, Screen, ShaderContent};
use crate::resource::constant_buffer_template::ShaderConstantBufferTemplate;
use crate::resource::vertex_buffer::VertexLayout;

/// Shared handle to a shader
pub type ShaderRef = Arc<Mutex<Shader>>;

/// Constant buffer declared by a shader
#[derive(Debug, Clone)]
pub struct ConstantBufferDecl {
    /// Name of the buffer in the shader source
    pub name: String,
    pub template: Arc<ShaderConstantBufferTemplate>,
}

/// Shader descriptor
#[derive(Debug, Clone, Default)]
pub struct ShaderDesc {
    /// Debug name
    pub name: String,
    /// Vertex stage source, in the backend's language
    pub vertex_source: String,
    /// Fragment stage source, in the backend's language
    pub fragment_source: String,
    /// Components every vertex buffer drawn with this shader must provide
    pub vertex_layout: VertexLayout,
    /// Constant buffers, in binding slot order
    pub constant_buffers: Vec<ConstantBufferDecl>,
}

impl ShaderDesc {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_sources(mut self, vertex_source: &str, fragment_source: &str) -> Self {
        self.vertex_source = vertex_source.to_string();
        self.fragment_source = fragment_source.to_string();
        self
    }

    pub fn with_vertex_layout(mut self, mut layout: VertexLayout) -> Self {
        layout.update_offsets();
        self.vertex_layout = layout;
        self
    }

    /// Declare a constant buffer in the next binding slot
    pub fn with_constant_buffer(mut self, name: &str, template: Arc<ShaderConstantBufferTemplate>) -> Self {
        self.constant_buffers.push(ConstantBufferDecl {
            name: name.to_string(),
            template,
        });
        self
    }
}

#[derive(Debug)]
pub struct Shader {
    desc: ShaderDesc,
    resource: DeviceResource<dyn ShaderContent>,
}

impl Shader {
    pub fn new(desc: ShaderDesc) -> Self {
        Self {
            desc,
            resource: DeviceResource::new(),
        }
    }

    pub fn new_shared(desc: ShaderDesc) -> ShaderRef {
        Arc::new(Mutex::new(Self::new(desc)))
    }

    pub fn name(&self) -> &str {
        &self.desc.name
    }

    pub fn desc(&self) -> &ShaderDesc {
        &self.desc
    }

    pub fn vertex_layout(&self) -> &VertexLayout {
        &self.desc.vertex_layout
    }

    /// Binding slot of the declared buffer whose layout matches `template`
    pub fn constant_buffer_slot(&self, template: &Arc<ShaderConstantBufferTemplate>) -> Option<usize> {
        self.desc
            .constant_buffers
            .iter()
            .position(|decl| decl.template.is_compatible(template))
    }

    /// Binding slot of the declared buffer called `name`
    pub fn constant_buffer_slot_by_name(&self, name: &str) -> Option<usize> {
        self.desc.constant_buffers.iter().position(|decl| decl.name == name)
    }

    pub(crate) fn content(&self) -> Option<&dyn ShaderContent> {
        self.resource.content()
    }
}

impl DeviceBound for Shader {
    fn load_content_from(&mut self, screen: &mut Screen) -> bool {
        let desc = &self.desc;
        self.resource.load_with(screen, "shader", |driver| driver.create_shader_content(desc))
    }

    fn unload_content(&mut self) {
        self.resource.unload_content();
    }

    fn is_loaded(&self) -> bool {
        self.resource.is_loaded()
    }
}

#[cfg(test)]
#[path = "shader_tests.rs"]
mod tests;
