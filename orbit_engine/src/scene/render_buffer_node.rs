/// Node content rendering its subtree off-screen, then drawing the result.
///
/// While the subtree renders, drawing is redirected into a render buffer and
/// the projection maps the node's local space onto the buffer. Once the
/// subtree is done the buffer is popped and its color texture is drawn as a
/// quad at the node's place. Attached to a viewport node, the buffer follows
/// the viewport's logical size.

use std::sync::Arc;

use glam::{Mat4, Vec2};

use crate::error::Result;
use crate::math::Rect;
use crate::render::{Primitive, RenderContext};
use crate::resource::{RenderBuffer, RenderBufferRef, ShaderRef, Texture, TextureRef, VertexBuffer};
use crate::scene::content::NodeContent;
use crate::scene::sprite_node::{build_quad, write_quad};
use crate::scene::targets::{ShaderTarget, ShaderTargetRef};
use crate::utils::lock;
use crate::engine_warn;

#[derive(Debug)]
pub struct RenderBufferNode {
    name: String,
    size: Vec2,
    buffer: RenderBufferRef,
    texture: TextureRef,
    quad: VertexBuffer,
    shader: ShaderTargetRef,
    saved_projection: Option<Mat4>,
}

impl RenderBufferNode {
    /// Off-screen target of `size` pixels; `name` names its color texture
    pub fn new(name: &str, size: Vec2) -> Result<Self> {
        let (buffer, texture) = RenderBuffer::with_color_target(name, Rect::from_size(size.x, size.y));
        Ok(Self {
            name: name.to_string(),
            size,
            buffer,
            texture,
            quad: build_quad(size, Vec2::ONE)?,
            shader: ShaderTarget::new_shared(None),
            saved_projection: None,
        })
    }

    /// Shader used to draw the buffer's texture
    pub fn with_shader(self, shader: ShaderRef) -> Self {
        lock(&self.shader).set_shader(Some(shader));
        self
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn buffer(&self) -> &RenderBufferRef {
        &self.buffer
    }

    /// Current color texture; replaced on every resize
    pub fn texture(&self) -> &TextureRef {
        &self.texture
    }

    pub fn shader_target(&self) -> ShaderTargetRef {
        Arc::clone(&self.shader)
    }

    /// Reallocate the color texture and the framebuffer for `size`
    pub fn resize(&mut self, size: Vec2) -> Result<()> {
        if size == self.size {
            return Ok(());
        }
        write_quad(&mut self.quad, size, Vec2::ONE)?;
        let texture = Texture::render_target(&self.name, size.x as u32, size.y as u32).into_shared();
        {
            let mut buffer = lock(&self.buffer);
            buffer.set_viewport(Rect::from_size(size.x, size.y));
            buffer.set_target(0, Some(texture.clone()));
        }
        self.texture = texture;
        self.size = size;
        Ok(())
    }
}

impl NodeContent for RenderBufferNode {
    fn begin_render(&mut self, ctx: &mut RenderContext<'_>, world: &Mat4) -> bool {
        if !ctx.push_render_buffer(&self.buffer) {
            return false;
        }
        let projection = Mat4::orthographic_rh(0.0, self.size.x, self.size.y, 0.0, -1.0, 1.0);
        let to_local = if world.determinant() != 0.0 { world.inverse() } else { Mat4::IDENTITY };
        self.saved_projection = Some(ctx.projection_matrix());
        ctx.set_projection_matrix(projection * to_local);
        true
    }

    fn end_render(&mut self, ctx: &mut RenderContext<'_>, world: &Mat4) {
        let Some(projection) = self.saved_projection.take() else {
            return;
        };
        ctx.set_projection_matrix(projection);
        if ctx.pop_render_buffer(&self.buffer).is_err() {
            return;
        }

        if !lock(&self.shader).apply(ctx) {
            return;
        }
        if !ctx.set_texture(0, Some(&self.texture)) {
            return;
        }
        ctx.prepare_texture_layers(1);
        ctx.set_modelview_matrix(*world);
        ctx.draw(Primitive::TriangleStrip, &mut self.quad, None);
    }

    fn on_viewport_changed(&mut self, _old: &Rect, new: &Rect) {
        if let Err(error) = self.resize(new.size()) {
            engine_warn!("orbit::RenderBufferNode", "Resize of '{}' failed: {}", self.name, error);
        }
    }
}

#[cfg(test)]
#[path = "render_buffer_node_tests.rs"]
mod tests;
