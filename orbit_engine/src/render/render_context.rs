/// Per-frame draw and binding state.
///
/// A `RenderContext` is handed out by `Screen::begin_frame` and closed with
/// `end_frame`. It tracks the active shader, the texture units and the stack
/// of render buffers, loads every resource a draw references against the
/// screen's driver, and dispatches the backend calls. Shared resources it
/// loads are tracked by the screen, so a driver switch reloads them.
///
/// Dropping a context without `end_frame` still closes the frame.
///
/// Failures caused by missing resources (no shader bound, content the driver
/// cannot create, incompatible layouts) are logged and reported as `false`;
/// the frame goes on and the draw is skipped.

use std::sync::Arc;

use glam::{Mat4, Vec2};

use crate::device::{DeviceBound, DrawCall, Screen};
use crate::error::Result;
use crate::math::Rect;
use crate::render::primitive::Primitive;
use crate::resource::{
    IndexBuffer, RenderBufferRef, ShaderConstantBufferRef, ShaderConstantBufferTemplate,
    ShaderRef, TextureRef, VertexBuffer,
};
use crate::utils::lock;
use crate::{engine_bail_state, engine_debug, engine_warn};

/// Counters gathered over one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub draw_calls: usize,
    pub failed_draws: usize,
    pub triangles: usize,
    pub shader_binds: usize,
    pub texture_binds: usize,
    pub constant_buffer_binds: usize,
    pub render_buffer_pushes: usize,
}

pub struct RenderContext<'a> {
    screen: &'a mut Screen,
    projection: Mat4,
    modelview: Mat4,
    shader: Option<ShaderRef>,
    textures: Vec<Option<TextureRef>>,
    render_buffers: Vec<RenderBufferRef>,
    stats: FrameStats,
    ended: bool,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(screen: &'a mut Screen) -> Self {
        Self {
            screen,
            projection: Mat4::IDENTITY,
            modelview: Mat4::IDENTITY,
            shader: None,
            textures: Vec::new(),
            render_buffers: Vec::new(),
            stats: FrameStats::default(),
            ended: false,
        }
    }

    pub fn screen(&self) -> &Screen {
        &*self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut *self.screen
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Convert screen pixels to normalized device coordinates
    pub fn convert_screen_to_world(&self, point: Vec2) -> Option<Vec2> {
        self.screen.convert_screen_to_world(point)
    }

    // ===== MATRICES =====

    /// Set the projection used by every following draw of the frame
    pub fn set_projection_matrix(&mut self, matrix: Mat4) {
        self.projection = matrix;
        if let Some(driver) = self.screen.driver_mut() {
            driver.set_projection_matrix(&matrix);
        }
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// Set the modelview of the next draws
    pub fn set_modelview_matrix(&mut self, matrix: Mat4) {
        self.modelview = matrix;
        if let Some(driver) = self.screen.driver_mut() {
            driver.set_modelview_matrix(&matrix);
        }
    }

    pub fn modelview_matrix(&self) -> Mat4 {
        self.modelview
    }

    // ===== SHADER =====

    /// Bind a shader (loading it if needed), or unbind with None
    ///
    /// Matrices are resent after a successful bind. On failure no shader is
    /// active afterwards.
    pub fn set_shader(&mut self, shader: Option<&ShaderRef>) -> bool {
        let Some(shader_ref) = shader else {
            if let Some(driver) = self.screen.driver_mut() {
                driver.bind_shader(None);
            }
            self.shader = None;
            return true;
        };

        let mut shader = lock(shader_ref);
        if !shader.load_content_from(self.screen) {
            engine_warn!("orbit::RenderContext", "Shader '{}' is not available", shader.name());
            self.shader = None;
            return false;
        }
        let Some(driver) = self.screen.driver_mut() else {
            self.shader = None;
            return false;
        };
        if !driver.bind_shader(shader.content()) {
            engine_warn!("orbit::RenderContext", "Video driver refused shader '{}'", shader.name());
            self.shader = None;
            return false;
        }
        driver.set_projection_matrix(&self.projection);
        driver.set_modelview_matrix(&self.modelview);
        drop(shader);

        self.screen.track(shader_ref);
        self.shader = Some(shader_ref.clone());
        self.stats.shader_binds += 1;
        true
    }

    pub fn active_shader(&self) -> Option<&ShaderRef> {
        self.shader.as_ref()
    }

    /// Bind `buffer` to the slot of the active shader declared with `template`
    ///
    /// Fails if no shader is bound, the shader declares no matching buffer,
    /// or the buffer cannot be uploaded.
    pub fn assign_shader_constant_buffer(
        &mut self,
        template: &Arc<ShaderConstantBufferTemplate>,
        buffer_ref: &ShaderConstantBufferRef,
    ) -> bool {
        let Some(active) = self.shader.clone() else {
            engine_debug!("orbit::RenderContext", "Constant buffer assigned without a bound shader");
            return false;
        };
        let shader = lock(&active);
        let Some(slot) = shader.constant_buffer_slot(template) else {
            engine_debug!("orbit::RenderContext",
                "Shader '{}' declares no matching constant buffer", shader.name());
            return false;
        };

        let mut buffer = lock(buffer_ref);
        if !buffer.template().is_compatible(template) {
            engine_warn!("orbit::RenderContext", "Constant buffer layout does not match its template");
            return false;
        }
        let Some(buffer_content) = buffer.prepare(self.screen) else {
            return false;
        };
        let (Some(shader_content), Some(driver)) = (shader.content(), self.screen.driver_mut()) else {
            return false;
        };
        if !driver.bind_constant_buffer(shader_content, slot, buffer_content) {
            return false;
        }
        drop(buffer);
        drop(shader);

        self.screen.track(buffer_ref);
        self.stats.constant_buffer_binds += 1;
        true
    }

    // ===== TEXTURES =====

    /// Texture units usable in this frame
    pub fn max_texture_units(&self) -> usize {
        let limit = self.screen.config().max_texture_layers;
        self.screen
            .driver()
            .map(|driver| driver.max_texture_units().min(limit))
            .unwrap_or(0)
    }

    /// Bind a texture (loading it if needed) to `unit`, or clear the unit with None
    pub fn set_texture(&mut self, unit: usize, texture: Option<&TextureRef>) -> bool {
        if unit >= self.max_texture_units() {
            engine_warn!("orbit::RenderContext",
                "Texture unit {} out of range ({} available)", unit, self.max_texture_units());
            return false;
        }

        let bound = match texture {
            None => self
                .screen
                .driver_mut()
                .is_some_and(|driver| driver.bind_texture(unit, None)),
            Some(texture_ref) => {
                let mut texture = lock(texture_ref);
                match texture.prepare(self.screen) {
                    Some(content) => self
                        .screen
                        .driver_mut()
                        .is_some_and(|driver| driver.bind_texture(unit, Some(content))),
                    None => {
                        engine_warn!("orbit::RenderContext",
                            "Texture '{}' is not available", texture.name());
                        false
                    }
                }
            }
        };
        if !bound {
            return false;
        }
        if let Some(texture_ref) = texture {
            self.screen.track(texture_ref);
        }

        if self.textures.len() <= unit {
            self.textures.resize(unit + 1, None);
        }
        self.textures[unit] = texture.cloned();
        if texture.is_some() {
            self.stats.texture_binds += 1;
        }
        true
    }

    pub fn texture(&self, unit: usize) -> Option<&TextureRef> {
        self.textures.get(unit).and_then(Option::as_ref)
    }

    /// Disable every unit >= `count`, leaving units below untouched
    pub fn prepare_texture_layers(&mut self, count: usize) {
        if let Some(driver) = self.screen.driver_mut() {
            driver.disable_texture_units(count);
        }
        self.textures.truncate(count);
    }

    /// Disable every texture unit
    pub fn clear_textures(&mut self) {
        self.prepare_texture_layers(0);
    }

    // ===== RENDER BUFFERS =====

    /// Redirect drawing into `buffer`, loading it if needed
    ///
    /// Every push must be matched by a `pop_render_buffer` of the same buffer.
    pub fn push_render_buffer(&mut self, buffer: &RenderBufferRef) -> bool {
        let mut guard = lock(buffer);
        if !guard.load_content_from(self.screen) {
            engine_warn!("orbit::RenderContext", "Render buffer is not available");
            return false;
        }
        let viewport = guard.viewport();
        let Some(driver) = self.screen.driver_mut() else {
            return false;
        };
        if !driver.bind_render_target(guard.content(), &viewport) {
            return false;
        }
        drop(guard);

        self.screen.track(buffer);
        self.render_buffers.push(buffer.clone());
        self.stats.render_buffer_pushes += 1;
        true
    }

    /// Stop drawing into `buffer` and restore the previous target
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if `buffer` is not the most recently pushed one.
    pub fn pop_render_buffer(&mut self, buffer: &RenderBufferRef) -> Result<()> {
        match self.render_buffers.last() {
            Some(top) if Arc::ptr_eq(top, buffer) => {}
            Some(_) => engine_bail_state!("orbit::RenderContext",
                "Popped render buffer is not the active one"),
            None => engine_bail_state!("orbit::RenderContext",
                "Render buffer popped with an empty stack"),
        }
        self.render_buffers.pop();
        self.bind_current_target();
        Ok(())
    }

    /// Number of pushed render buffers
    pub fn render_buffer_depth(&self) -> usize {
        self.render_buffers.len()
    }

    pub fn active_render_buffer(&self) -> Option<&RenderBufferRef> {
        self.render_buffers.last()
    }

    fn bind_current_target(&mut self) {
        match self.render_buffers.last().cloned() {
            Some(top) => {
                let guard = lock(&top);
                let viewport = guard.viewport();
                if let Some(driver) = self.screen.driver_mut() {
                    driver.bind_render_target(guard.content(), &viewport);
                }
            }
            None => {
                let size = self.screen.resolution();
                let viewport = Rect::from_size(size.width as f32, size.height as f32);
                if let Some(driver) = self.screen.driver_mut() {
                    driver.bind_render_target(None, &viewport);
                }
            }
        }
    }

    // ===== DRAW =====

    /// Draw `vertices` (optionally indexed) with the active shader
    ///
    /// Buffers are loaded and uploaded as needed. Returns false and draws
    /// nothing if no shader is active, a buffer is unavailable or the vertex
    /// layout lacks a component the shader consumes.
    pub fn draw(&mut self, primitive: Primitive, vertices: &mut VertexBuffer, indices: Option<&mut IndexBuffer>) -> bool {
        let Some(active) = self.shader.clone() else {
            engine_debug!("orbit::RenderContext", "Draw skipped: no shader bound");
            self.stats.failed_draws += 1;
            return false;
        };
        let shader = lock(&active);

        let Some((vertex_content, vertex_data)) = vertices.prepare(self.screen) else {
            self.stats.failed_draws += 1;
            return false;
        };
        if vertex_data.size() == 0 {
            return false;
        }
        if !vertex_data.layout().satisfies(shader.vertex_layout()) {
            engine_warn!("orbit::RenderContext",
                "Vertex layout does not provide the inputs of shader '{}'", shader.name());
            self.stats.failed_draws += 1;
            return false;
        }

        let index_part = match indices {
            Some(index_buffer) => match index_buffer.prepare(self.screen) {
                Some((content, data)) => Some((content, data.index_size(), data.size())),
                None => {
                    self.stats.failed_draws += 1;
                    return false;
                }
            },
            None => None,
        };

        let Some(shader_content) = shader.content() else {
            self.stats.failed_draws += 1;
            return false;
        };
        let call = DrawCall {
            primitive,
            shader: shader_content,
            vertices: vertex_content,
            vertex_layout: vertex_data.layout(),
            vertex_count: vertex_data.size(),
            indices: index_part,
        };
        let drawn = self
            .screen
            .driver_mut()
            .is_some_and(|driver| driver.draw(&call));

        if drawn {
            let elements = index_part.map_or(vertex_data.size(), |(_, _, count)| count);
            self.stats.draw_calls += 1;
            self.stats.triangles += primitive.triangle_count(elements);
        } else {
            self.stats.failed_draws += 1;
        }
        drawn
    }

    // ===== FRAME =====

    /// Finish the frame and present it
    ///
    /// Render buffers still pushed are unwound with a warning.
    pub fn end_frame(mut self) -> Result<FrameStats> {
        self.finish()?;
        Ok(self.stats)
    }

    fn finish(&mut self) -> Result<()> {
        self.ended = true;
        if !self.render_buffers.is_empty() {
            engine_warn!("orbit::RenderContext",
                "{} render buffers still pushed at end of frame", self.render_buffers.len());
            self.render_buffers.clear();
            self.bind_current_target();
        }
        match self.screen.driver_mut() {
            Some(driver) => driver.post_render(),
            None => engine_bail_state!("orbit::RenderContext", "Video driver removed during the frame"),
        }
    }
}

impl Drop for RenderContext<'_> {
    /// Close a frame left open, so the next `begin_frame` can start
    fn drop(&mut self) {
        if self.ended {
            return;
        }
        engine_warn!("orbit::RenderContext", "Render context dropped without end_frame");
        if let Err(err) = self.finish() {
            engine_warn!("orbit::RenderContext", "Closing the dropped frame failed: {}", err);
        }
    }
}

#[cfg(test)]
#[path = "render_context_tests.rs"]
mod tests;
