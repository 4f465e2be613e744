/// VideoDeviceDriver trait - backend factory and draw dispatch interface

use glam::{Mat4, Vec2};
use winit::dpi::PhysicalSize;

use crate::device::content::{
    ConstantBufferContent, IndexBufferContent, RenderBufferContent, ShaderContent,
    TextureContent, VertexBufferContent,
};
use crate::device::screen::ScreenConfig;
use crate::error::Result;
use crate::io::Image;
use crate::math::Rect;
use crate::module_registry::ModuleRegistry;
use crate::render::Primitive;
use crate::resource::{
    IndexData, IndexSize, ShaderConstantBufferTemplate, ShaderDesc, TextureDesc, VertexData,
    VertexLayout,
};

/// One draw call as seen by the backend
///
/// All referenced content has been loaded against the active driver and is
/// up to date with its CPU-side data.
pub struct DrawCall<'a> {
    /// Primitive assembly mode
    pub primitive: Primitive,
    /// Bound shader program
    pub shader: &'a dyn ShaderContent,
    /// Vertex storage
    pub vertices: &'a dyn VertexBufferContent,
    /// Layout of one vertex inside `vertices`
    pub vertex_layout: &'a VertexLayout,
    /// Number of vertices in `vertices`
    pub vertex_count: usize,
    /// Optional index storage with its element width and count
    pub indices: Option<(&'a dyn IndexBufferContent, IndexSize, usize)>,
}

/// Main video driver trait
///
/// This is the factory interface for creating backend content and the
/// dispatch interface the render context drives. Implemented once per
/// backend (OpenGL, DirectX11, headless, ...).
///
/// Every `create_*_content` returns None when the backend cannot satisfy the
/// request; callers treat that as a recoverable failure.
pub trait VideoDeviceDriver: Send {
    /// Backend name (e.g. "opengl", "headless")
    fn name(&self) -> &str;

    /// Initialize the backend for a screen
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is fundamentally unusable.
    fn init(&mut self, config: &ScreenConfig) -> Result<()>;

    /// Current output resolution in pixels
    fn resolution(&self) -> PhysicalSize<u32>;

    /// Notify the driver that the output surface was resized
    fn resize(&mut self, size: PhysicalSize<u32>);

    /// Number of texture units a draw call may use
    fn max_texture_units(&self) -> usize;

    /// Convert a point in screen pixels (origin top-left, y down) to
    /// normalized device coordinates (origin center, y up)
    fn convert_screen_to_world(&self, point: Vec2) -> Vec2 {
        let size = self.resolution();
        if size.width == 0 || size.height == 0 {
            return Vec2::ZERO;
        }
        Vec2::new(
            point.x / size.width as f32 * 2.0 - 1.0,
            1.0 - point.y / size.height as f32 * 2.0,
        )
    }

    /// Called before any draw call of a frame
    fn pre_render(&mut self) -> Result<()>;

    /// Called after the last draw call of a frame (presents the frame)
    fn post_render(&mut self) -> Result<()>;

    // ===== CONTENT FACTORY =====

    /// Create backend storage for an index buffer
    fn create_index_buffer_content(&mut self, data: &IndexData) -> Option<Box<dyn IndexBufferContent>>;

    /// Create backend storage for a vertex buffer
    fn create_vertex_buffer_content(&mut self, data: &VertexData) -> Option<Box<dyn VertexBufferContent>>;

    /// Create a backend shader program
    fn create_shader_content(&mut self, desc: &ShaderDesc) -> Option<Box<dyn ShaderContent>>;

    /// Create a backend texture from CPU pixels (empty image for render targets)
    fn create_texture_content(&mut self, desc: &TextureDesc, image: &Image) -> Option<Box<dyn TextureContent>>;

    /// Create backend storage for a constant buffer of the given layout
    fn create_constant_buffer_content(
        &mut self,
        template: &ShaderConstantBufferTemplate,
    ) -> Option<Box<dyn ConstantBufferContent>>;

    /// Create an off-screen framebuffer rendering into the given target textures
    fn create_render_buffer_content(
        &mut self,
        viewport: &Rect,
        targets: &[Option<&dyn TextureContent>],
    ) -> Option<Box<dyn RenderBufferContent>>;

    // ===== DRAW DISPATCH =====

    /// Set the projection matrix for subsequent draws
    fn set_projection_matrix(&mut self, matrix: &Mat4);

    /// Set the modelview matrix for subsequent draws
    fn set_modelview_matrix(&mut self, matrix: &Mat4);

    /// Bind a shader program, or unbind with None
    fn bind_shader(&mut self, shader: Option<&dyn ShaderContent>) -> bool;

    /// Bind a constant buffer to the given slot of the bound shader
    fn bind_constant_buffer(
        &mut self,
        shader: &dyn ShaderContent,
        slot: usize,
        buffer: &dyn ConstantBufferContent,
    ) -> bool;

    /// Bind a texture to a texture unit, or clear the unit with None
    fn bind_texture(&mut self, unit: usize, texture: Option<&dyn TextureContent>) -> bool;

    /// Disable every texture unit >= `first_unit`
    fn disable_texture_units(&mut self, first_unit: usize);

    /// Redirect drawing to an off-screen framebuffer, or back to the screen with None
    fn bind_render_target(&mut self, target: Option<&dyn RenderBufferContent>, viewport: &Rect) -> bool;

    /// Issue a draw call
    fn draw(&mut self, call: &DrawCall<'_>) -> bool;
}

/// Factory creating a fresh driver instance
pub type DriverFactory = Box<dyn Fn() -> Box<dyn VideoDeviceDriver> + Send + Sync>;

/// Registry of video drivers, ordered by priority
pub type DriverRegistry = ModuleRegistry<DriverFactory>;
