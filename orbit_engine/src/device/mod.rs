//! Logical device layer: video drivers, backend content and the screen

pub mod content;
pub mod device_resource;
pub mod driver;
pub mod screen;

#[cfg(test)]
pub(crate) mod mock_driver;

pub use content::{
    ConstantBufferContent, ContentId, DeviceContent, IndexBufferContent, RenderBufferContent,
    ShaderContent, TextureContent, VertexBufferContent,
};
pub use device_resource::{DeviceBound, DeviceResource};
pub use driver::{DrawCall, DriverFactory, DriverRegistry, VideoDeviceDriver};
pub use screen::{Screen, ScreenConfig};
