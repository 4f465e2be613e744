/// Node content drawing a vertex buffer, optionally indexed, with a shader and textures.

use std::sync::Arc;

use glam::Mat4;

use crate::render::{Primitive, RenderContext};
use crate::resource::{IndexBuffer, ShaderRef, VertexBuffer};
use crate::scene::content::NodeContent;
use crate::scene::targets::{ShaderTarget, ShaderTargetRef, TextureTarget};
use crate::utils::lock;

#[derive(Debug)]
pub struct MeshNode {
    primitive: Primitive,
    vertices: VertexBuffer,
    indices: Option<IndexBuffer>,
    shader: ShaderTargetRef,
    textures: TextureTarget,
}

impl MeshNode {
    pub fn new(primitive: Primitive, vertices: VertexBuffer) -> Self {
        Self {
            primitive,
            vertices,
            indices: None,
            shader: ShaderTarget::new_shared(None),
            textures: TextureTarget::new(),
        }
    }

    pub fn with_indices(mut self, indices: IndexBuffer) -> Self {
        self.indices = Some(indices);
        self
    }

    pub fn with_shader(self, shader: ShaderRef) -> Self {
        lock(&self.shader).set_shader(Some(shader));
        self
    }

    pub fn with_textures(mut self, textures: TextureTarget) -> Self {
        self.textures = textures;
        self
    }

    pub fn primitive(&self) -> Primitive {
        self.primitive
    }

    pub fn vertices(&self) -> &VertexBuffer {
        &self.vertices
    }

    pub fn vertices_mut(&mut self) -> &mut VertexBuffer {
        &mut self.vertices
    }

    pub fn indices(&self) -> Option<&IndexBuffer> {
        self.indices.as_ref()
    }

    pub fn indices_mut(&mut self) -> Option<&mut IndexBuffer> {
        self.indices.as_mut()
    }

    /// Shared shader target, e.g. to hand to a lighting manager
    pub fn shader_target(&self) -> ShaderTargetRef {
        Arc::clone(&self.shader)
    }

    pub fn textures_mut(&mut self) -> &mut TextureTarget {
        &mut self.textures
    }
}

impl NodeContent for MeshNode {
    fn draw(&mut self, ctx: &mut RenderContext<'_>, _world: &Mat4) {
        if !lock(&self.shader).apply(ctx) {
            return;
        }
        self.textures.apply(ctx);
        ctx.draw(self.primitive, &mut self.vertices, self.indices.as_mut());
    }
}
