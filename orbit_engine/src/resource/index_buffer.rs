/// Index buffer with a configurable element width.
///
/// The element width (1, 2 or 4 bytes) is fixed before the first index is
/// stored. Indices that do not fit the configured width are rejected before
/// anything is written.

use crate::device::{DeviceBound, DeviceResource, IndexBufferContent, Screen};
use crate::error::{Error, Result};
use crate::{engine_bail_state, engine_error};

// ===== INDEX SIZE =====

/// Byte width of one index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexSize {
    U8,
    #[default]
    U16,
    U32,
}

impl IndexSize {
    /// Index size from a byte width (1, 2 or 4)
    pub fn from_bytes(bytes: usize) -> Option<Self> {
        match bytes {
            1 => Some(IndexSize::U8),
            2 => Some(IndexSize::U16),
            4 => Some(IndexSize::U32),
            _ => None,
        }
    }

    pub fn size_bytes(&self) -> usize {
        match self {
            IndexSize::U8 => 1,
            IndexSize::U16 => 2,
            IndexSize::U32 => 4,
        }
    }

    /// Largest index value representable at this width
    pub fn max_value(&self) -> u32 {
        match self {
            IndexSize::U8 => u8::MAX as u32,
            IndexSize::U16 => u16::MAX as u32,
            IndexSize::U32 => u32::MAX,
        }
    }
}

// ===== INDEX DATA =====

/// CPU-side index storage
#[derive(Debug, Clone, Default)]
pub struct IndexData {
    index_size: IndexSize,
    bytes: Vec<u8>,
    size: usize,
    capacity: usize,
    version: u64,
}

impl IndexData {
    pub fn index_size(&self) -> IndexSize {
        self.index_size
    }

    /// Packed bytes of the used indices
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..self.size * self.index_size.size_bytes()]
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bumped on every change
    pub fn version(&self) -> u64 {
        self.version
    }

    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}

// ===== INDEX BUFFER =====

/// Index buffer device resource
#[derive(Debug, Default)]
pub struct IndexBuffer {
    data: IndexData,
    resource: DeviceResource<dyn IndexBufferContent>,
}

impl IndexBuffer {
    /// Create an empty buffer of 16-bit indices
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_index_size(index_size: IndexSize) -> Self {
        let mut buffer = Self::new();
        buffer.data.index_size = index_size;
        buffer
    }

    /// Set the element width in bytes (1, 2 or 4)
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if storage is allocated, `InvalidResource` for
    /// an unsupported width.
    pub fn setup_index_size(&mut self, bytes: usize) -> Result<()> {
        if self.data.capacity != 0 {
            engine_bail_state!("orbit::IndexBuffer",
                "Index size is locked: storage for {} indices is allocated", self.data.capacity);
        }
        let index_size = IndexSize::from_bytes(bytes).ok_or_else(|| {
            engine_error!("orbit::IndexBuffer", "Invalid index size {}", bytes);
            Error::InvalidResource(format!("index size must be 1, 2 or 4 bytes, got {}", bytes))
        })?;
        self.data.index_size = index_size;
        self.data.touch();
        Ok(())
    }

    // ===== STORAGE =====

    /// Grow storage to hold at least `count` indices (never shrinks)
    pub fn ensure_capacity(&mut self, count: usize) -> Result<()> {
        if count <= self.data.capacity {
            return Ok(());
        }
        let grown = count.max(self.data.capacity.saturating_mul(2));
        self.set_capacity(grown)
    }

    /// Reallocate storage for exactly `count` indices
    pub fn set_capacity(&mut self, count: usize) -> Result<()> {
        if count < self.data.size {
            engine_bail_state!("orbit::IndexBuffer",
                "Cannot shrink capacity to {} below index count {}", count, self.data.size);
        }
        let bytes = count.checked_mul(self.data.index_size.size_bytes()).ok_or_else(|| {
            Error::CapacityOverflow(format!("{} indices do not fit in memory", count))
        })?;
        self.data.bytes.resize(bytes, 0);
        self.data.capacity = count;
        self.data.touch();
        Ok(())
    }

    fn check_fits(&self, value: u32) -> Result<()> {
        let max = self.data.index_size.max_value();
        if value > max {
            engine_error!("orbit::IndexBuffer",
                "Index {} does not fit in {} bytes", value, self.data.index_size.size_bytes());
            return Err(Error::CapacityOverflow(format!(
                "index {} exceeds maximum {} for {:?}", value, max, self.data.index_size
            )));
        }
        Ok(())
    }

    /// Append an index and return its position
    ///
    /// # Errors
    ///
    /// Returns `CapacityOverflow` if `value` does not fit the element width.
    /// Nothing is stored in that case.
    pub fn add_index(&mut self, value: u32) -> Result<usize> {
        self.check_fits(value)?;
        self.ensure_capacity(self.data.size + 1)?;
        let position = self.data.size;
        self.data.size += 1;
        self.write(position, value);
        Ok(position)
    }

    /// Append several indices; stops at the first one that does not fit
    pub fn add_indices(&mut self, values: &[u32]) -> Result<()> {
        if let Some(&too_big) = values.iter().find(|&&v| v > self.data.index_size.max_value()) {
            return self.check_fits(too_big);
        }
        self.ensure_capacity(self.data.size + values.len())?;
        for &value in values {
            let position = self.data.size;
            self.data.size += 1;
            self.write(position, value);
        }
        Ok(())
    }

    /// Overwrite the index at `position`
    pub fn set_index(&mut self, position: usize, value: u32) -> Result<()> {
        if position >= self.data.size {
            engine_bail_state!("orbit::IndexBuffer",
                "Index position {} out of range (size {})", position, self.data.size);
        }
        self.check_fits(value)?;
        self.write(position, value);
        Ok(())
    }

    fn write(&mut self, position: usize, value: u32) {
        let width = self.data.index_size.size_bytes();
        let start = position * width;
        let target = &mut self.data.bytes[start..start + width];
        match self.data.index_size {
            IndexSize::U8 => target.copy_from_slice(&(value as u8).to_ne_bytes()),
            IndexSize::U16 => target.copy_from_slice(&(value as u16).to_ne_bytes()),
            IndexSize::U32 => target.copy_from_slice(&value.to_ne_bytes()),
        }
        self.data.touch();
    }

    /// Index stored at `position`
    pub fn index(&self, position: usize) -> Option<u32> {
        if position >= self.data.size {
            return None;
        }
        let width = self.data.index_size.size_bytes();
        let bytes = &self.data.bytes[position * width..(position + 1) * width];
        Some(match self.data.index_size {
            IndexSize::U8 => bytes[0] as u32,
            IndexSize::U16 => bytemuck::pod_read_unaligned::<u16>(bytes) as u32,
            IndexSize::U32 => bytemuck::pod_read_unaligned::<u32>(bytes),
        })
    }

    /// Largest index value this buffer accepts
    pub fn max_index(&self) -> u32 {
        self.data.index_size.max_value()
    }

    /// Remove every index and release storage
    pub fn clear(&mut self) {
        self.data.bytes = Vec::new();
        self.data.size = 0;
        self.data.capacity = 0;
        self.data.touch();
    }

    // ===== ACCESSORS =====

    pub fn size(&self) -> usize {
        self.data.size
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity
    }

    pub fn index_size(&self) -> IndexSize {
        self.data.index_size
    }

    pub fn data(&self) -> &IndexData {
        &self.data
    }

    /// Load content if needed and bring it up to date with the CPU data
    pub(crate) fn prepare(&mut self, screen: &mut Screen) -> Option<(&dyn IndexBufferContent, &IndexData)> {
        if !self.load_content_from(screen) {
            return None;
        }
        let content = self.resource.content_mut()?;
        if !content.update(&self.data) {
            crate::engine_warn!("orbit::IndexBuffer", "Index upload failed");
            return None;
        }
        Some((self.resource.content()?, &self.data))
    }
}

impl DeviceBound for IndexBuffer {
    fn load_content_from(&mut self, screen: &mut Screen) -> bool {
        let data = &self.data;
        self.resource.load_with(screen, "index buffer", |driver| {
            driver.create_index_buffer_content(data)
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
#[path = "index_buffer_tests.rs"]
mod tests;
