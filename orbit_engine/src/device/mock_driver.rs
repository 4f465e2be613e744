/// Mock video driver for unit tests (no GPU required)
///
/// Records every driver call as a named event in a shared log so tests can
/// assert what the engine asked the backend to do.

use std::sync::{Arc, Mutex};

use glam::Mat4;
use winit::dpi::PhysicalSize;

use crate::device::content::{
    ConstantBufferContent, ContentId, DeviceContent, IndexBufferContent, RenderBufferContent,
    ShaderContent, TextureContent, VertexBufferContent,
};
use crate::device::driver::{DrawCall, VideoDeviceDriver};
use crate::device::screen::{Screen, ScreenConfig};
use crate::engine_bail;
use crate::error::Result;
use crate::io::Image;
use crate::math::Rect;
use crate::render::Primitive;
use crate::resource::{
    IndexData, ShaderConstantBufferTemplate, ShaderDesc, TextureDesc, VertexData,
};
use crate::utils::lock;

// ============================================================================
// Shared state
// ============================================================================

/// One recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub struct MockDraw {
    pub primitive: Primitive,
    pub shader: ContentId,
    pub vertex_count: usize,
    pub index_count: Option<usize>,
    pub modelview: Mat4,
}

#[derive(Debug, Default)]
struct MockState {
    events: Vec<String>,
    draws: Vec<MockDraw>,
    projection: Mat4,
    modelview: Mat4,
}

/// Handle on the log of a mock driver
#[derive(Debug, Clone, Default)]
pub struct MockEvents(Arc<Mutex<MockState>>);

impl MockEvents {
    fn push(&self, name: &str) {
        lock(&self.0).events.push(name.to_string());
    }

    pub fn names(&self) -> Vec<String> {
        lock(&self.0).events.clone()
    }

    pub fn count(&self, name: &str) -> usize {
        lock(&self.0).events.iter().filter(|event| *event == name).count()
    }

    pub fn draws(&self) -> Vec<MockDraw> {
        lock(&self.0).draws.clone()
    }

    pub fn projection(&self) -> Mat4 {
        lock(&self.0).projection
    }

    pub fn clear(&self) {
        let mut state = lock(&self.0);
        state.events.clear();
        state.draws.clear();
    }
}

// ============================================================================
// Mock contents
// ============================================================================

struct MockVertexBuffer {
    id: ContentId,
    version: u64,
    events: MockEvents,
}

impl DeviceContent for MockVertexBuffer {
    fn id(&self) -> ContentId {
        self.id
    }
}

impl VertexBufferContent for MockVertexBuffer {
    fn update(&mut self, data: &VertexData) -> bool {
        if data.version() != self.version {
            self.version = data.version();
            self.events.push("upload_vertex_buffer");
        }
        true
    }
}

struct MockIndexBuffer {
    id: ContentId,
    version: u64,
    events: MockEvents,
}

impl DeviceContent for MockIndexBuffer {
    fn id(&self) -> ContentId {
        self.id
    }
}

impl IndexBufferContent for MockIndexBuffer {
    fn update(&mut self, data: &IndexData) -> bool {
        if data.version() != self.version {
            self.version = data.version();
            self.events.push("upload_index_buffer");
        }
        true
    }
}

struct MockShader {
    id: ContentId,
}

impl DeviceContent for MockShader {
    fn id(&self) -> ContentId {
        self.id
    }
}

impl ShaderContent for MockShader {}

struct MockTexture {
    id: ContentId,
    size: (u32, u32),
    events: MockEvents,
}

impl DeviceContent for MockTexture {
    fn id(&self) -> ContentId {
        self.id
    }
}

impl TextureContent for MockTexture {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn update(&mut self, image: &Image) -> bool {
        self.events.push("update_texture");
        (image.width(), image.height()) == self.size
    }
}

struct MockConstantBuffer {
    id: ContentId,
    uploaded: u16,
    events: MockEvents,
}

impl DeviceContent for MockConstantBuffer {
    fn id(&self) -> ContentId {
        self.id
    }
}

impl ConstantBufferContent for MockConstantBuffer {
    fn upload(&mut self, _data: &[u8], change_ver: u16) -> bool {
        if change_ver != self.uploaded {
            self.uploaded = change_ver;
            self.events.push("upload_constant_buffer");
        }
        true
    }

    fn uploaded_version(&self) -> u16 {
        self.uploaded
    }
}

struct MockRenderBuffer {
    id: ContentId,
}

impl DeviceContent for MockRenderBuffer {
    fn id(&self) -> ContentId {
        self.id
    }
}

impl RenderBufferContent for MockRenderBuffer {}

// ============================================================================
// Mock driver
// ============================================================================

/// Mock driver; every `refuse_*` flag makes the matching factory return None
#[derive(Debug, Default)]
pub struct MockDriver {
    pub name: String,
    pub resolution: PhysicalSize<u32>,
    pub max_texture_units: usize,
    pub fail_init: bool,
    pub refuse_vertex_buffers: bool,
    pub refuse_index_buffers: bool,
    pub refuse_shaders: bool,
    pub refuse_textures: bool,
    pub refuse_constant_buffers: bool,
    pub refuse_render_buffers: bool,
    next_id: u64,
    events: MockEvents,
}

impl MockDriver {
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            resolution: PhysicalSize::new(800, 600),
            max_texture_units: 4,
            ..Self::default()
        }
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::new()
        }
    }

    pub fn events(&self) -> MockEvents {
        self.events.clone()
    }

    fn next_id(&mut self) -> ContentId {
        self.next_id += 1;
        ContentId(self.next_id)
    }
}

impl VideoDeviceDriver for MockDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&mut self, _config: &ScreenConfig) -> Result<()> {
        if self.fail_init {
            engine_bail!("orbit::MockDriver", "Mock driver configured to fail init");
        }
        self.events.push("init");
        Ok(())
    }

    fn resolution(&self) -> PhysicalSize<u32> {
        self.resolution
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.resolution = size;
        self.events.push("resize");
    }

    fn max_texture_units(&self) -> usize {
        self.max_texture_units
    }

    fn pre_render(&mut self) -> Result<()> {
        self.events.push("pre_render");
        Ok(())
    }

    fn post_render(&mut self) -> Result<()> {
        self.events.push("post_render");
        Ok(())
    }

    fn create_index_buffer_content(&mut self, data: &IndexData) -> Option<Box<dyn IndexBufferContent>> {
        if self.refuse_index_buffers {
            return None;
        }
        self.events.push("create_index_buffer");
        Some(Box::new(MockIndexBuffer {
            id: self.next_id(),
            version: data.version(),
            events: self.events.clone(),
        }))
    }

    fn create_vertex_buffer_content(&mut self, data: &VertexData) -> Option<Box<dyn VertexBufferContent>> {
        if self.refuse_vertex_buffers {
            return None;
        }
        self.events.push("create_vertex_buffer");
        Some(Box::new(MockVertexBuffer {
            id: self.next_id(),
            version: data.version(),
            events: self.events.clone(),
        }))
    }

    fn create_shader_content(&mut self, _desc: &ShaderDesc) -> Option<Box<dyn ShaderContent>> {
        if self.refuse_shaders {
            return None;
        }
        self.events.push("create_shader");
        Some(Box::new(MockShader { id: self.next_id() }))
    }

    fn create_texture_content(&mut self, desc: &TextureDesc, _image: &Image) -> Option<Box<dyn TextureContent>> {
        if self.refuse_textures {
            return None;
        }
        self.events.push("create_texture");
        Some(Box::new(MockTexture {
            id: self.next_id(),
            size: (desc.width, desc.height),
            events: self.events.clone(),
        }))
    }

    fn create_constant_buffer_content(
        &mut self,
        _template: &ShaderConstantBufferTemplate,
    ) -> Option<Box<dyn ConstantBufferContent>> {
        if self.refuse_constant_buffers {
            return None;
        }
        self.events.push("create_constant_buffer");
        Some(Box::new(MockConstantBuffer {
            id: self.next_id(),
            uploaded: 0,
            events: self.events.clone(),
        }))
    }

    fn create_render_buffer_content(
        &mut self,
        _viewport: &Rect,
        targets: &[Option<&dyn TextureContent>],
    ) -> Option<Box<dyn RenderBufferContent>> {
        if self.refuse_render_buffers || targets.iter().all(Option::is_none) {
            return None;
        }
        self.events.push("create_render_buffer");
        Some(Box::new(MockRenderBuffer { id: self.next_id() }))
    }

    fn set_projection_matrix(&mut self, matrix: &Mat4) {
        lock(&self.events.0).projection = *matrix;
        self.events.push("set_projection");
    }

    fn set_modelview_matrix(&mut self, matrix: &Mat4) {
        lock(&self.events.0).modelview = *matrix;
        self.events.push("set_modelview");
    }

    fn bind_shader(&mut self, shader: Option<&dyn ShaderContent>) -> bool {
        self.events.push(if shader.is_some() { "bind_shader" } else { "unbind_shader" });
        true
    }

    fn bind_constant_buffer(
        &mut self,
        _shader: &dyn ShaderContent,
        _slot: usize,
        _buffer: &dyn ConstantBufferContent,
    ) -> bool {
        self.events.push("bind_constant_buffer");
        true
    }

    fn bind_texture(&mut self, unit: usize, texture: Option<&dyn TextureContent>) -> bool {
        if unit >= self.max_texture_units {
            return false;
        }
        self.events.push(if texture.is_some() { "bind_texture" } else { "clear_texture" });
        true
    }

    fn disable_texture_units(&mut self, _first_unit: usize) {
        self.events.push("disable_texture_units");
    }

    fn bind_render_target(&mut self, target: Option<&dyn RenderBufferContent>, _viewport: &Rect) -> bool {
        self.events.push(if target.is_some() { "bind_render_target" } else { "bind_screen" });
        true
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> bool {
        let mut state = lock(&self.events.0);
        let modelview = state.modelview;
        state.draws.push(MockDraw {
            primitive: call.primitive,
            shader: call.shader.id(),
            vertex_count: call.vertex_count,
            index_count: call.indices.map(|(_, _, count)| count),
            modelview,
        });
        state.events.push("draw".to_string());
        true
    }
}

/// Screen with a fresh mock driver installed and an empty event log
pub fn mock_screen() -> (Screen, MockEvents) {
    let driver = MockDriver::new();
    let events = driver.events();
    let mut screen = Screen::new(ScreenConfig::default());
    // Mock init never fails
    let _ = screen.set_driver(Box::new(driver));
    events.clear();
    (screen, events)
}
