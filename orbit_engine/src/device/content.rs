/// Backend content traits.
///
/// A content object is the backend realization (GPU buffer, program,
/// framebuffer, ...) of a device resource. Backends implement one type per
/// trait. Content objects carry a `ContentId` so the driver can identify them
/// during binding and drawing without downcasting.
///
/// Dropping a content object releases its backend storage.

use crate::io::Image;
use crate::resource::{IndexData, VertexData};

/// Backend-assigned identifier of a content object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(pub u64);

/// Common interface of every backend content object
pub trait DeviceContent: Send {
    /// Identifier assigned by the driver that created this content
    fn id(&self) -> ContentId;
}

/// Backend vertex buffer
pub trait VertexBufferContent: DeviceContent {
    /// Synchronize with the CPU-side vertex data
    ///
    /// Implementations skip the upload when `data.version()` matches the
    /// version they last uploaded. Returns false if the upload failed.
    fn update(&mut self, data: &VertexData) -> bool;
}

/// Backend index buffer
pub trait IndexBufferContent: DeviceContent {
    /// Synchronize with the CPU-side index data (skipped when the version is unchanged)
    fn update(&mut self, data: &IndexData) -> bool;
}

/// Backend shader program
pub trait ShaderContent: DeviceContent {}

/// Backend texture
pub trait TextureContent: DeviceContent {
    /// Size in texels the content was created with
    fn size(&self) -> (u32, u32);

    /// Re-upload pixel data of an unchanged size
    fn update(&mut self, image: &Image) -> bool;
}

/// Backend constant (uniform) buffer
pub trait ConstantBufferContent: DeviceContent {
    /// Upload `data` unless `change_ver` equals the version of the last upload
    ///
    /// Returns false if the upload failed.
    fn upload(&mut self, data: &[u8], change_ver: u16) -> bool;

    /// Change version of the last successful upload (0 = never uploaded)
    fn uploaded_version(&self) -> u16;
}

/// Backend off-screen framebuffer
pub trait RenderBufferContent: DeviceContent {}
