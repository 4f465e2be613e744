/// HeadlessDriver - video driver without any output surface
///
/// Validates the call sequence the engine issues and records it in an
/// `EventLog`. Used by tests and by tools that need the scene graph without
/// a window.

use glam::Mat4;
use orbit_engine::orbit::device::{
    ConstantBufferContent, ContentId, DeviceContent, DrawCall, IndexBufferContent, RenderBufferContent,
    ScreenConfig, ShaderContent, TextureContent, VertexBufferContent, VideoDeviceDriver,
};
use orbit_engine::orbit::io::Image;
use orbit_engine::orbit::resource::{
    IndexData, ShaderConstantBufferTemplate, ShaderDesc, TextureDesc, VertexData,
};
use orbit_engine::orbit::{Error, Rect, Result};
use orbit_engine::{engine_bail, engine_debug, engine_warn};
use rustc_hash::FxHashSet;
use winit::dpi::PhysicalSize;

use crate::events::{ContentKind, DrawRecord, DriverEvent, EventLog};
use crate::headless_content::{
    ContentHandle, HeadlessConstantBuffer, HeadlessIndexBuffer, HeadlessRenderBuffer,
    HeadlessShader, HeadlessTexture, HeadlessVertexBuffer,
};

/// Texture units exposed when not overridden
pub const DEFAULT_TEXTURE_UNITS: usize = 8;

/// Headless video driver
pub struct HeadlessDriver {
    name: String,
    log: EventLog,
    resolution: PhysicalSize<u32>,
    max_texture_units: usize,
    refused: FxHashSet<ContentKind>,
    fail_init: bool,
    initialized: bool,

    // Frame state
    frame: u64,
    in_frame: bool,

    // Binding state
    projection: Mat4,
    modelview: Mat4,
    shader: Option<ContentId>,
    textures: Vec<Option<ContentId>>,
    render_target: Option<ContentId>,
}

impl HeadlessDriver {
    /// Create a driver with its own event log
    pub fn new() -> Self {
        Self::with_log(EventLog::new())
    }

    /// Create a driver recording into an existing log
    pub fn with_log(log: EventLog) -> Self {
        Self {
            name: "headless".to_string(),
            log,
            resolution: PhysicalSize::new(0, 0),
            max_texture_units: DEFAULT_TEXTURE_UNITS,
            refused: FxHashSet::default(),
            fail_init: false,
            initialized: false,
            frame: 0,
            in_frame: false,
            projection: Mat4::IDENTITY,
            modelview: Mat4::IDENTITY,
            shader: None,
            textures: Vec::new(),
            render_target: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_max_texture_units(mut self, units: usize) -> Self {
        self.max_texture_units = units;
        self
    }

    /// Make every `create_*_content` of this kind fail
    pub fn refusing(mut self, kind: ContentKind) -> Self {
        self.refused.insert(kind);
        self
    }

    /// Make `init` fail
    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Handle on the event log
    pub fn events(&self) -> EventLog {
        self.log.clone()
    }

    /// Number of frames completed
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    fn content_handle(&self, kind: ContentKind) -> Option<ContentHandle> {
        if self.refused.contains(&kind) {
            engine_warn!("orbit::headless", "Refusing to create {:?} content", kind);
            return None;
        }
        Some(ContentHandle::new(self.log.next_id(), kind, self.log.clone()))
    }

    fn check_frame(&self, operation: &str) -> bool {
        if !self.in_frame {
            engine_warn!("orbit::headless", "{} called outside of a frame", operation);
        }
        self.in_frame
    }
}

impl Default for HeadlessDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoDeviceDriver for HeadlessDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, config: &ScreenConfig) -> Result<()> {
        if self.fail_init {
            engine_bail!("orbit::headless", "Driver '{}' configured to fail initialization", self.name);
        }
        if config.resolution.width == 0 || config.resolution.height == 0 {
            return Err(Error::InitializationFailed(format!(
                "Invalid resolution {}x{}",
                config.resolution.width, config.resolution.height
            )));
        }
        self.resolution = config.resolution;
        self.initialized = true;
        self.log.record(DriverEvent::Init { resolution: self.resolution });
        engine_debug!("orbit::headless", "Driver '{}' initialized at {}x{}",
            self.name, self.resolution.width, self.resolution.height);
        Ok(())
    }

    fn resolution(&self) -> PhysicalSize<u32> {
        self.resolution
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.resolution = size;
        self.log.record(DriverEvent::Resize(size));
    }

    fn max_texture_units(&self) -> usize {
        self.max_texture_units
    }

    fn pre_render(&mut self) -> Result<()> {
        if !self.initialized {
            engine_bail!("orbit::headless", "pre_render called before init");
        }
        if self.in_frame {
            engine_bail!("orbit::headless", "pre_render called twice (frame {} still open)", self.frame);
        }
        self.in_frame = true;
        self.shader = None;
        self.textures.clear();
        self.render_target = None;
        self.log.record(DriverEvent::BeginFrame(self.frame));
        Ok(())
    }

    fn post_render(&mut self) -> Result<()> {
        if !self.in_frame {
            engine_bail!("orbit::headless", "post_render called without pre_render");
        }
        if self.render_target.is_some() {
            engine_bail!("orbit::headless", "Frame {} ended while drawing off-screen", self.frame);
        }
        self.in_frame = false;
        self.log.record(DriverEvent::EndFrame(self.frame));
        self.frame += 1;
        Ok(())
    }

    // ===== CONTENT FACTORY =====

    fn create_index_buffer_content(&mut self, data: &IndexData) -> Option<Box<dyn IndexBufferContent>> {
        let handle = self.content_handle(ContentKind::IndexBuffer)?;
        Some(Box::new(HeadlessIndexBuffer::new(handle, data)))
    }

    fn create_vertex_buffer_content(&mut self, data: &VertexData) -> Option<Box<dyn VertexBufferContent>> {
        let handle = self.content_handle(ContentKind::VertexBuffer)?;
        Some(Box::new(HeadlessVertexBuffer::new(handle, data)))
    }

    fn create_shader_content(&mut self, desc: &ShaderDesc) -> Option<Box<dyn ShaderContent>> {
        let handle = self.content_handle(ContentKind::Shader)?;
        engine_debug!("orbit::headless", "Shader '{}' with {} constant buffers",
            desc.name, desc.constant_buffers.len());
        Some(Box::new(HeadlessShader::new(handle)))
    }

    fn create_texture_content(&mut self, desc: &TextureDesc, image: &Image) -> Option<Box<dyn TextureContent>> {
        if image.width() == 0 || image.height() == 0 {
            engine_warn!("orbit::headless", "Texture '{}' has an empty image", desc.name);
            return None;
        }
        let handle = self.content_handle(ContentKind::Texture)?;
        let mut texture = HeadlessTexture::new(handle, (image.width(), image.height()));
        texture.update(image);
        Some(Box::new(texture))
    }

    fn create_constant_buffer_content(
        &mut self,
        template: &ShaderConstantBufferTemplate,
    ) -> Option<Box<dyn ConstantBufferContent>> {
        if template.size() == 0 {
            engine_warn!("orbit::headless", "Constant buffer template has no entries");
            return None;
        }
        let handle = self.content_handle(ContentKind::ConstantBuffer)?;
        Some(Box::new(HeadlessConstantBuffer::new(handle, template.size())))
    }

    fn create_render_buffer_content(
        &mut self,
        viewport: &Rect,
        targets: &[Option<&dyn TextureContent>],
    ) -> Option<Box<dyn RenderBufferContent>> {
        if viewport.is_empty() {
            engine_warn!("orbit::headless", "Render buffer with an empty viewport");
            return None;
        }
        if targets.iter().all(Option::is_none) {
            engine_warn!("orbit::headless", "Render buffer without any color target");
            return None;
        }
        let handle = self.content_handle(ContentKind::RenderBuffer)?;
        Some(Box::new(HeadlessRenderBuffer::new(handle)))
    }

    // ===== DRAW DISPATCH =====

    fn set_projection_matrix(&mut self, matrix: &Mat4) {
        self.projection = *matrix;
        self.log.record(DriverEvent::SetProjection(*matrix));
    }

    fn set_modelview_matrix(&mut self, matrix: &Mat4) {
        self.modelview = *matrix;
        self.log.record(DriverEvent::SetModelview(*matrix));
    }

    fn bind_shader(&mut self, shader: Option<&dyn ShaderContent>) -> bool {
        if !self.check_frame("bind_shader") {
            return false;
        }
        self.shader = shader.map(|shader| shader.id());
        self.log.record(DriverEvent::BindShader(self.shader));
        true
    }

    fn bind_constant_buffer(
        &mut self,
        shader: &dyn ShaderContent,
        slot: usize,
        buffer: &dyn ConstantBufferContent,
    ) -> bool {
        if !self.check_frame("bind_constant_buffer") {
            return false;
        }
        if self.shader != Some(shader.id()) {
            engine_warn!("orbit::headless", "Constant buffer bound to shader {:?} which is not active",
                shader.id());
            return false;
        }
        self.log.record(DriverEvent::BindConstantBuffer {
            shader: shader.id(),
            slot,
            buffer: buffer.id(),
        });
        true
    }

    fn bind_texture(&mut self, unit: usize, texture: Option<&dyn TextureContent>) -> bool {
        if !self.check_frame("bind_texture") {
            return false;
        }
        if unit >= self.max_texture_units {
            engine_warn!("orbit::headless", "Texture unit {} out of range (max {})",
                unit, self.max_texture_units);
            return false;
        }
        if self.textures.len() <= unit {
            self.textures.resize(unit + 1, None);
        }
        let id = texture.map(|texture| texture.id());
        self.textures[unit] = id;
        self.log.record(DriverEvent::BindTexture { unit, texture: id });
        true
    }

    fn disable_texture_units(&mut self, first_unit: usize) {
        self.textures.truncate(first_unit);
        self.log.record(DriverEvent::DisableTextureUnits(first_unit));
    }

    fn bind_render_target(&mut self, target: Option<&dyn RenderBufferContent>, viewport: &Rect) -> bool {
        if !self.check_frame("bind_render_target") {
            return false;
        }
        self.render_target = target.map(|target| target.id());
        self.log.record(DriverEvent::BindRenderTarget {
            target: self.render_target,
            viewport: *viewport,
        });
        true
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> bool {
        if !self.check_frame("draw") {
            return false;
        }
        if self.shader != Some(call.shader.id()) {
            engine_warn!("orbit::headless", "Draw with shader {:?} which is not bound", call.shader.id());
            return false;
        }
        if call.vertex_count == 0 {
            engine_warn!("orbit::headless", "Draw without vertices");
            return false;
        }
        if let Some((_, _, count)) = call.indices {
            if count == 0 {
                engine_warn!("orbit::headless", "Indexed draw without indices");
                return false;
            }
        }

        self.log.record(DriverEvent::Draw(DrawRecord {
            primitive: call.primitive,
            shader: call.shader.id(),
            vertices: call.vertices.id(),
            vertex_count: call.vertex_count,
            indices: call.indices.map(|(buffer, _, count)| (buffer.id(), count)),
            textures: self.textures.clone(),
            render_target: self.render_target,
            projection: self.projection,
            modelview: self.modelview,
        }));
        true
    }
}

#[cfg(test)]
#[path = "headless_driver_tests.rs"]
mod tests;
