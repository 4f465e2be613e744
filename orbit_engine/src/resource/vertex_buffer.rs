/// Vertex buffer with a configurable packed vertex layout.
///
/// Each vertex is a packed record of optional components, always stored in
/// the order position, normal, color, texture layers. The layout can only be
/// changed while the buffer holds no storage (capacity 0); once storage is
/// allocated the layout is locked until `clear()`.
///
/// CPU-side data (`VertexData`) is the source of truth. Backend content is a
/// cache created on demand and refreshed from the data version.

use glam::{Vec2, Vec3, Vec4};

use crate::device::{DeviceBound, DeviceResource, Screen, VertexBufferContent};
use crate::error::{Error, Result};
use crate::{engine_bail_state, engine_error};

const FLOAT_SIZE: usize = std::mem::size_of::<f32>();

// ===== VERTEX COMPONENT =====

/// One component of a vertex (position, normal, color or a texture layer)
///
/// A component with zero fields is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VertexComponent {
    /// Number of f32 fields (0 = disabled)
    pub fields: usize,
    /// Byte offset inside one vertex
    pub offset: usize,
}

impl VertexComponent {
    fn with_fields(fields: usize) -> Self {
        Self { fields, offset: 0 }
    }

    pub fn is_enabled(&self) -> bool {
        self.fields > 0
    }

    pub fn size_bytes(&self) -> usize {
        self.fields * FLOAT_SIZE
    }

    /// Byte offset just past this component
    pub fn end(&self) -> usize {
        self.offset + self.size_bytes()
    }
}

// ===== VERTEX LAYOUT =====

/// Component table of a vertex buffer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VertexLayout {
    pub position: VertexComponent,
    pub normal: VertexComponent,
    pub color: VertexComponent,
    pub texture_layers: Vec<VertexComponent>,
    stride: usize,
}

impl VertexLayout {
    /// Empty layout (no components)
    pub fn new() -> Self {
        Self::default()
    }

    /// Layout with 2D positions and `layers` texture coordinate pairs
    pub fn position_2d_textured(layers: usize) -> Self {
        let mut layout = Self::new();
        layout.position = VertexComponent::with_fields(2);
        layout.texture_layers = vec![VertexComponent::with_fields(2); layers];
        layout.update_offsets();
        layout
    }

    /// Recompute component offsets and the vertex stride
    ///
    /// Components are packed sequentially in the fixed order position,
    /// normal, color, texture layers. Disabled components take no space.
    pub fn update_offsets(&mut self) {
        let mut offset = 0;
        for component in [&mut self.position, &mut self.normal, &mut self.color]
            .into_iter()
            .chain(self.texture_layers.iter_mut())
        {
            component.offset = offset;
            offset += component.size_bytes();
        }
        self.stride = offset;
    }

    /// Size in bytes of one vertex
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of texture coordinate layers
    pub fn texture_layer_count(&self) -> usize {
        self.texture_layers.len()
    }

    /// True if every component `required` enables is present here with the same field count
    ///
    /// Used to check a vertex buffer against the input layout a shader expects.
    pub fn satisfies(&self, required: &VertexLayout) -> bool {
        let matches = |have: &VertexComponent, want: &VertexComponent| {
            !want.is_enabled() || have.fields == want.fields
        };
        matches(&self.position, &required.position)
            && matches(&self.normal, &required.normal)
            && matches(&self.color, &required.color)
            && self.texture_layers.len() >= required.texture_layers.len()
    }
}

// ===== VERTEX DATA =====

/// CPU-side vertex storage
#[derive(Debug, Clone, Default)]
pub struct VertexData {
    layout: VertexLayout,
    bytes: Vec<u8>,
    size: usize,
    capacity: usize,
    version: u64,
}

impl VertexData {
    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    /// Packed bytes of the used vertices (`size * stride`)
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..self.size * self.layout.stride()]
    }

    /// Number of vertices
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of vertices storage is allocated for
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bumped on every change, used by backends to skip redundant uploads
    pub fn version(&self) -> u64 {
        self.version
    }

    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}

// ===== VERTEX BUFFER =====

/// Vertex buffer device resource
#[derive(Debug, Default)]
pub struct VertexBuffer {
    data: VertexData,
    resource: DeviceResource<dyn VertexBufferContent>,
}

impl VertexBuffer {
    /// Create an empty buffer with no components
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with the given component table
    pub fn with_layout(mut layout: VertexLayout) -> Self {
        layout.update_offsets();
        Self {
            data: VertexData {
                layout,
                ..VertexData::default()
            },
            resource: DeviceResource::new(),
        }
    }

    // ===== LAYOUT SETUP =====

    fn check_if_setup_possible(&self) -> Result<()> {
        if self.data.capacity != 0 {
            engine_bail_state!("orbit::VertexBuffer",
                "Vertex layout is locked: storage for {} vertices is allocated", self.data.capacity);
        }
        Ok(())
    }

    fn finish_setup(&mut self) {
        self.data.layout.update_offsets();
        self.data.touch();
    }

    /// Enable positions with 2 or 3 fields
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if storage is allocated, `InvalidResource` for
    /// an unsupported dimension count.
    pub fn setup_vertex_positions(&mut self, dimensions: usize) -> Result<()> {
        self.check_if_setup_possible()?;
        if !(2..=3).contains(&dimensions) {
            engine_error!("orbit::VertexBuffer", "Invalid position dimensions {}", dimensions);
            return Err(Error::InvalidResource(format!(
                "position dimensions must be 2 or 3, got {}", dimensions
            )));
        }
        self.data.layout.position = VertexComponent::with_fields(dimensions);
        self.finish_setup();
        Ok(())
    }

    pub fn disable_vertex_positions(&mut self) -> Result<()> {
        self.check_if_setup_possible()?;
        self.data.layout.position = VertexComponent::default();
        self.finish_setup();
        Ok(())
    }

    /// Enable 3-field normals
    pub fn setup_vertex_normals(&mut self) -> Result<()> {
        self.check_if_setup_possible()?;
        self.data.layout.normal = VertexComponent::with_fields(3);
        self.finish_setup();
        Ok(())
    }

    pub fn disable_vertex_normals(&mut self) -> Result<()> {
        self.check_if_setup_possible()?;
        self.data.layout.normal = VertexComponent::default();
        self.finish_setup();
        Ok(())
    }

    /// Enable colors with 3 (RGB) or 4 (RGBA) fields
    pub fn setup_vertex_colors(&mut self, fields: usize) -> Result<()> {
        self.check_if_setup_possible()?;
        if !(3..=4).contains(&fields) {
            engine_error!("orbit::VertexBuffer", "Invalid color field count {}", fields);
            return Err(Error::InvalidResource(format!(
                "color field count must be 3 or 4, got {}", fields
            )));
        }
        self.data.layout.color = VertexComponent::with_fields(fields);
        self.finish_setup();
        Ok(())
    }

    pub fn disable_vertex_colors(&mut self) -> Result<()> {
        self.check_if_setup_possible()?;
        self.data.layout.color = VertexComponent::default();
        self.finish_setup();
        Ok(())
    }

    /// Use `count` texture coordinate layers (2 fields each)
    pub fn setup_texture_layers(&mut self, count: usize) -> Result<()> {
        self.check_if_setup_possible()?;
        self.data.layout.texture_layers = vec![VertexComponent::with_fields(2); count];
        self.finish_setup();
        Ok(())
    }

    pub fn disable_texture_layers(&mut self) -> Result<()> {
        self.setup_texture_layers(0)
    }

    /// Recompute component offsets
    pub fn update_offsets(&mut self) {
        self.data.layout.update_offsets();
    }

    // ===== STORAGE =====

    /// Grow storage to hold at least `count` vertices
    ///
    /// Storage grows to the larger of `count` and twice the current capacity.
    /// Never shrinks.
    pub fn ensure_capacity(&mut self, count: usize) -> Result<()> {
        if count <= self.data.capacity {
            return Ok(());
        }
        let grown = count.max(self.data.capacity.saturating_mul(2));
        self.set_capacity(grown)
    }

    /// Reallocate storage for exactly `count` vertices
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if `count` is below the current vertex count or
    /// the layout has no component.
    pub fn set_capacity(&mut self, count: usize) -> Result<()> {
        if count < self.data.size {
            engine_bail_state!("orbit::VertexBuffer",
                "Cannot shrink capacity to {} below vertex count {}", count, self.data.size);
        }
        if count > 0 && self.data.layout.stride() == 0 {
            engine_bail_state!("orbit::VertexBuffer",
                "Cannot allocate vertices without any enabled component");
        }
        let bytes = count.checked_mul(self.data.layout.stride()).ok_or_else(|| {
            Error::CapacityOverflow(format!("{} vertices do not fit in memory", count))
        })?;
        self.data.bytes.resize(bytes, 0);
        self.data.capacity = count;
        self.data.touch();
        Ok(())
    }

    /// Append one zeroed vertex and return its index
    pub fn add_vertex(&mut self) -> Result<usize> {
        self.ensure_capacity(self.data.size + 1)?;
        let index = self.data.size;
        self.data.size += 1;
        self.data.touch();
        Ok(index)
    }

    /// Remove every vertex and release storage, unlocking the layout
    pub fn clear(&mut self) {
        self.data.bytes = Vec::new();
        self.data.size = 0;
        self.data.capacity = 0;
        self.data.touch();
    }

    // ===== VERTEX ACCESS =====

    fn component_range(&self, index: usize, component: VertexComponent, what: &str) -> Result<std::ops::Range<usize>> {
        if index >= self.data.size {
            engine_bail_state!("orbit::VertexBuffer",
                "Vertex index {} out of range (size {})", index, self.data.size);
        }
        if !component.is_enabled() {
            engine_bail_state!("orbit::VertexBuffer", "Vertex {} component is disabled", what);
        }
        let start = index * self.data.layout.stride() + component.offset;
        Ok(start..start + component.size_bytes())
    }

    fn write_floats(&mut self, range: std::ops::Range<usize>, values: &[f32]) {
        let count = range.len() / FLOAT_SIZE;
        let target = &mut self.data.bytes[range];
        target.copy_from_slice(bytemuck::cast_slice(&values[..count]));
        self.data.touch();
    }

    fn read_floats(&self, range: std::ops::Range<usize>) -> Vec<f32> {
        self.data.bytes[range]
            .chunks_exact(FLOAT_SIZE)
            .map(bytemuck::pod_read_unaligned::<f32>)
            .collect()
    }

    /// Write a position; z is ignored for 2D positions
    pub fn set_vertex_position(&mut self, index: usize, position: Vec3) -> Result<()> {
        let range = self.component_range(index, self.data.layout.position, "position")?;
        self.write_floats(range, &position.to_array());
        Ok(())
    }

    pub fn set_vertex_normal(&mut self, index: usize, normal: Vec3) -> Result<()> {
        let range = self.component_range(index, self.data.layout.normal, "normal")?;
        self.write_floats(range, &normal.to_array());
        Ok(())
    }

    /// Write a color; alpha is ignored for RGB colors
    pub fn set_vertex_color(&mut self, index: usize, color: Vec4) -> Result<()> {
        let range = self.component_range(index, self.data.layout.color, "color")?;
        self.write_floats(range, &color.to_array());
        Ok(())
    }

    pub fn set_vertex_texture_coordinate(&mut self, index: usize, layer: usize, uv: Vec2) -> Result<()> {
        let component = self.data.layout.texture_layers.get(layer).copied().unwrap_or_default();
        let range = self.component_range(index, component, "texture coordinate")?;
        self.write_floats(range, &uv.to_array());
        Ok(())
    }

    /// Read back a position (z = 0 for 2D positions)
    pub fn vertex_position(&self, index: usize) -> Option<Vec3> {
        let range = self.component_range(index, self.data.layout.position, "position").ok()?;
        let fields = self.read_floats(range);
        Some(Vec3::new(fields[0], fields[1], fields.get(2).copied().unwrap_or(0.0)))
    }

    pub fn vertex_texture_coordinate(&self, index: usize, layer: usize) -> Option<Vec2> {
        let component = self.data.layout.texture_layers.get(layer).copied()?;
        let range = self.component_range(index, component, "texture coordinate").ok()?;
        let fields = self.read_floats(range);
        Some(Vec2::new(fields[0], fields[1]))
    }

    // ===== ACCESSORS =====

    pub fn size(&self) -> usize {
        self.data.size
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity
    }

    /// Size in bytes of one vertex
    pub fn vertex_size(&self) -> usize {
        self.data.layout.stride()
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.data.layout
    }

    pub fn data(&self) -> &VertexData {
        &self.data
    }

    /// Load content if needed and bring it up to date with the CPU data
    pub(crate) fn prepare(&mut self, screen: &mut Screen) -> Option<(&dyn VertexBufferContent, &VertexData)> {
        if !self.load_content_from(screen) {
            return None;
        }
        let content = self.resource.content_mut()?;
        if !content.update(&self.data) {
            crate::engine_warn!("orbit::VertexBuffer", "Vertex upload failed");
            return None;
        }
        Some((self.resource.content()?, &self.data))
    }
}

impl DeviceBound for VertexBuffer {
    fn load_content_from(&mut self, screen: &mut Screen) -> bool {
        let data = &self.data;
        self.resource.load_with(screen, "vertex buffer", |driver| {
            driver.create_vertex_buffer_content(data)
        })
    }

    fn unload_content(&mut self) {
        self.resource.unload_content();
    }

    fn is_loaded(&self) -> bool {
        self.resource.is_loaded()
    }
}

#[cfg(test)]
#[path = "vertex_buffer_tests.rs"]
mod tests;
