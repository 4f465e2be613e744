/// Node content drawing a textured rectangle of a given size.
///
/// The quad spans (0, 0) to `size` in the node's local space and is drawn as
/// a triangle strip with one texture layer. When the texture was padded to a
/// power of two, texture coordinates only cover the original image.

use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};

use crate::error::Result;
use crate::render::{Primitive, RenderContext};
use crate::resource::{ShaderRef, TextureRef, VertexBuffer, VertexLayout};
use crate::scene::content::NodeContent;
use crate::scene::targets::{ShaderTarget, ShaderTargetRef, TextureTarget};
use crate::utils::lock;

const CORNERS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 1.0),
];

/// Build a 4-vertex strip covering `size`, with coordinates up to `uv_max`
pub(crate) fn build_quad(size: Vec2, uv_max: Vec2) -> Result<VertexBuffer> {
    let mut quad = VertexBuffer::with_layout(VertexLayout::position_2d_textured(1));
    quad.set_capacity(CORNERS.len())?;
    for _ in CORNERS {
        quad.add_vertex()?;
    }
    write_quad(&mut quad, size, uv_max)?;
    Ok(quad)
}

/// Rewrite the corners of a quad built by `build_quad`
pub(crate) fn write_quad(quad: &mut VertexBuffer, size: Vec2, uv_max: Vec2) -> Result<()> {
    for (index, corner) in CORNERS.iter().enumerate() {
        quad.set_vertex_position(index, (*corner * size).extend(0.0))?;
        quad.set_vertex_texture_coordinate(index, 0, *corner * uv_max)?;
    }
    Ok(())
}

/// Part of the texture covered by its original image
fn texture_extent(texture: Option<&TextureRef>) -> Vec2 {
    let Some(texture) = texture else {
        return Vec2::ONE;
    };
    let texture = lock(texture);
    let (width, height) = texture.size();
    let (content_width, content_height) = texture.content_size();
    if width == 0 || height == 0 {
        return Vec2::ONE;
    }
    Vec2::new(content_width as f32 / width as f32, content_height as f32 / height as f32)
}

#[derive(Debug)]
pub struct SpriteNode {
    size: Vec2,
    quad: VertexBuffer,
    shader: ShaderTargetRef,
    textures: TextureTarget,
}

impl SpriteNode {
    pub fn new(size: Vec2, texture: Option<TextureRef>) -> Result<Self> {
        let quad = build_quad(size, texture_extent(texture.as_ref()))?;
        let mut textures = TextureTarget::new();
        textures.set_texture(0, texture);
        Ok(Self {
            size,
            quad,
            shader: ShaderTarget::new_shared(None),
            textures,
        })
    }

    pub fn with_shader(self, shader: ShaderRef) -> Self {
        lock(&self.shader).set_shader(Some(shader));
        self
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn set_size(&mut self, size: Vec2) -> Result<()> {
        let uv_max = texture_extent(self.textures.texture(0));
        write_quad(&mut self.quad, size, uv_max)?;
        self.size = size;
        Ok(())
    }

    pub fn texture(&self) -> Option<&TextureRef> {
        self.textures.texture(0)
    }

    pub fn set_texture(&mut self, texture: Option<TextureRef>) -> Result<()> {
        write_quad(&mut self.quad, self.size, texture_extent(texture.as_ref()))?;
        self.textures.set_texture(0, texture);
        Ok(())
    }

    pub fn shader_target(&self) -> ShaderTargetRef {
        Arc::clone(&self.shader)
    }

    pub fn quad(&self) -> &VertexBuffer {
        &self.quad
    }

    /// True if `local` (in the node's local space) lies on the quad
    pub fn contains(&self, local: Vec3) -> bool {
        local.x >= 0.0 && local.y >= 0.0 && local.x < self.size.x && local.y < self.size.y
    }
}

impl NodeContent for SpriteNode {
    fn draw(&mut self, ctx: &mut RenderContext<'_>, _world: &Mat4) {
        if !lock(&self.shader).apply(ctx) {
            return;
        }
        self.textures.apply(ctx);
        ctx.draw(Primitive::TriangleStrip, &mut self.quad, None);
    }
}

#[cfg(test)]
#[path = "sprite_node_tests.rs"]
mod tests;
