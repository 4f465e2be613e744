/// Headless content objects
///
/// Each content keeps only what the engine can observe: its id, its size and
/// the version of the last upload. Dropping one records its destruction.

use orbit_engine::orbit::device::{
    ConstantBufferContent, ContentId, DeviceContent, IndexBufferContent, RenderBufferContent,
    ShaderContent, TextureContent, VertexBufferContent,
};
use orbit_engine::orbit::io::Image;
use orbit_engine::orbit::resource::{IndexData, VertexData};

use crate::events::{ContentKind, DriverEvent, EventLog};

/// Id, kind and log shared by every headless content
#[derive(Debug)]
pub(crate) struct ContentHandle {
    id: ContentId,
    kind: ContentKind,
    log: EventLog,
}

impl ContentHandle {
    pub(crate) fn new(id: ContentId, kind: ContentKind, log: EventLog) -> Self {
        log.record(DriverEvent::Created { kind, id });
        Self { id, kind, log }
    }

    fn uploaded(&self, bytes: usize) {
        self.log.record(DriverEvent::Uploaded { kind: self.kind, id: self.id, bytes });
    }
}

impl Drop for ContentHandle {
    fn drop(&mut self) {
        self.log.record(DriverEvent::Destroyed { kind: self.kind, id: self.id });
    }
}

// ===== BUFFERS =====

pub(crate) struct HeadlessVertexBuffer {
    handle: ContentHandle,
    version: Option<u64>,
}

impl HeadlessVertexBuffer {
    pub(crate) fn new(handle: ContentHandle, data: &VertexData) -> Self {
        let mut buffer = Self { handle, version: None };
        buffer.update(data);
        buffer
    }
}

impl DeviceContent for HeadlessVertexBuffer {
    fn id(&self) -> ContentId {
        self.handle.id
    }
}

impl VertexBufferContent for HeadlessVertexBuffer {
    fn update(&mut self, data: &VertexData) -> bool {
        if self.version != Some(data.version()) {
            self.handle.uploaded(data.bytes().len());
            self.version = Some(data.version());
        }
        true
    }
}

pub(crate) struct HeadlessIndexBuffer {
    handle: ContentHandle,
    version: Option<u64>,
}

impl HeadlessIndexBuffer {
    pub(crate) fn new(handle: ContentHandle, data: &IndexData) -> Self {
        let mut buffer = Self { handle, version: None };
        buffer.update(data);
        buffer
    }
}

impl DeviceContent for HeadlessIndexBuffer {
    fn id(&self) -> ContentId {
        self.handle.id
    }
}

impl IndexBufferContent for HeadlessIndexBuffer {
    fn update(&mut self, data: &IndexData) -> bool {
        if self.version != Some(data.version()) {
            self.handle.uploaded(data.bytes().len());
            self.version = Some(data.version());
        }
        true
    }
}

pub(crate) struct HeadlessConstantBuffer {
    handle: ContentHandle,
    size: usize,
    uploaded: u16,
}

impl HeadlessConstantBuffer {
    pub(crate) fn new(handle: ContentHandle, size: usize) -> Self {
        Self { handle, size, uploaded: 0 }
    }
}

impl DeviceContent for HeadlessConstantBuffer {
    fn id(&self) -> ContentId {
        self.handle.id
    }
}

impl ConstantBufferContent for HeadlessConstantBuffer {
    fn upload(&mut self, data: &[u8], change_ver: u16) -> bool {
        if data.len() != self.size {
            return false;
        }
        if change_ver != self.uploaded {
            self.handle.uploaded(data.len());
            self.uploaded = change_ver;
        }
        true
    }

    fn uploaded_version(&self) -> u16 {
        self.uploaded
    }
}

// ===== PROGRAMS, TEXTURES, FRAMEBUFFERS =====

pub(crate) struct HeadlessShader {
    handle: ContentHandle,
}

impl HeadlessShader {
    pub(crate) fn new(handle: ContentHandle) -> Self {
        Self { handle }
    }
}

impl DeviceContent for HeadlessShader {
    fn id(&self) -> ContentId {
        self.handle.id
    }
}

impl ShaderContent for HeadlessShader {}

pub(crate) struct HeadlessTexture {
    handle: ContentHandle,
    size: (u32, u32),
}

impl HeadlessTexture {
    pub(crate) fn new(handle: ContentHandle, size: (u32, u32)) -> Self {
        Self { handle, size }
    }
}

impl DeviceContent for HeadlessTexture {
    fn id(&self) -> ContentId {
        self.handle.id
    }
}

impl TextureContent for HeadlessTexture {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn update(&mut self, image: &Image) -> bool {
        if (image.width(), image.height()) != self.size {
            return false;
        }
        self.handle.uploaded(image.pixels().len());
        true
    }
}

pub(crate) struct HeadlessRenderBuffer {
    handle: ContentHandle,
}

impl HeadlessRenderBuffer {
    pub(crate) fn new(handle: ContentHandle) -> Self {
        Self { handle }
    }
}

impl DeviceContent for HeadlessRenderBuffer {
    fn id(&self) -> ContentId {
        self.handle.id
    }
}

impl RenderBufferContent for HeadlessRenderBuffer {}
