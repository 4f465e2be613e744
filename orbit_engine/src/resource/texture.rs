/// Texture resource.
///
/// A texture owns its CPU-side pixels (`Image`). Render target textures
/// start with an empty image of the requested size and are written by the
/// backend only.

use std::sync::{Arc, Mutex};

use crate::device::{DeviceBound, DeviceResource, Screen, TextureContent};
use crate::error::Result;
use crate::io::{Image, ImageLoaderRegistry, PixelFormat};
use crate::engine_warn;

/// Shared handle to a texture
pub type TextureRef = Arc<Mutex<Texture>>;

/// Texel sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFilter {
    Nearest,
    #[default]
    Linear,
}

/// Addressing outside [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureWrap {
    #[default]
    Clamp,
    Repeat,
}

/// Texture descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub filter: TextureFilter,
    pub wrap: TextureWrap,
    /// The texture is a render buffer target
    pub render_target: bool,
}

#[derive(Debug)]
pub struct Texture {
    desc: TextureDesc,
    image: Image,
    /// Size of the picture inside a power-of-two padded image
    content_size: (u32, u32),
    image_version: u64,
    uploaded_version: u64,
    resource: DeviceResource<dyn TextureContent>,
}

impl Texture {
    /// Texture sampling the given pixels
    pub fn from_image(name: &str, image: Image) -> Self {
        let desc = TextureDesc {
            name: name.to_string(),
            width: image.width(),
            height: image.height(),
            format: image.format(),
            filter: TextureFilter::default(),
            wrap: TextureWrap::default(),
            render_target: false,
        };
        let content_size = (image.width(), image.height());
        Self {
            desc,
            image,
            content_size,
            image_version: 0,
            uploaded_version: 0,
            resource: DeviceResource::new(),
        }
    }

    /// Empty texture a render buffer draws into
    pub fn render_target(name: &str, width: u32, height: u32) -> Self {
        let mut texture = Self::from_image(name, Image::empty(width, height, PixelFormat::Rgba8));
        texture.desc.render_target = true;
        texture
    }

    /// Decode `source` with the registered loaders into a power-of-two texture
    ///
    /// The picture keeps its original size as `content_size()`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidResource` if no loader accepts the data.
    pub fn load(name: &str, source: &[u8], loaders: &ImageLoaderRegistry) -> Result<Self> {
        let (image, original) = loaders.load_power_of_two_image(source)?;
        let mut texture = Self::from_image(name, image);
        texture.content_size = original;
        Ok(texture)
    }

    pub fn into_shared(self) -> TextureRef {
        Arc::new(Mutex::new(self))
    }

    pub fn with_filter(mut self, filter: TextureFilter) -> Self {
        self.desc.filter = filter;
        self
    }

    pub fn with_wrap(mut self, wrap: TextureWrap) -> Self {
        self.desc.wrap = wrap;
        self
    }

    pub fn name(&self) -> &str {
        &self.desc.name
    }

    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    /// Allocated size in texels
    pub fn size(&self) -> (u32, u32) {
        (self.desc.width, self.desc.height)
    }

    /// Size of the meaningful picture (smaller than `size()` when padded)
    pub fn content_size(&self) -> (u32, u32) {
        self.content_size
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Replace the pixels
    ///
    /// Content of the same size is updated in place on next use; a size
    /// change drops the content so it is recreated.
    pub fn set_image(&mut self, image: Image) {
        let resized = image.width() != self.desc.width || image.height() != self.desc.height;
        self.desc.width = image.width();
        self.desc.height = image.height();
        self.desc.format = image.format();
        self.content_size = (image.width(), image.height());
        self.image = image;
        self.image_version = self.image_version.wrapping_add(1);
        if resized {
            self.resource.unload_content();
        }
    }

    /// Load content if needed and push pending pixel changes
    pub(crate) fn prepare(&mut self, screen: &mut Screen) -> Option<&dyn TextureContent> {
        if !self.load_content_from(screen) {
            return None;
        }
        if self.uploaded_version != self.image_version && !self.desc.render_target {
            let content = self.resource.content_mut()?;
            if !content.update(&self.image) {
                engine_warn!("orbit::Texture", "Pixel upload of '{}' failed", self.desc.name);
                return None;
            }
            self.uploaded_version = self.image_version;
        }
        self.resource.content()
    }

    pub(crate) fn content(&self) -> Option<&dyn TextureContent> {
        self.resource.content()
    }
}

impl DeviceBound for Texture {
    fn load_content_from(&mut self, screen: &mut Screen) -> bool {
        if self.resource.is_loaded_for(screen) {
            return true;
        }
        let (desc, image) = (&self.desc, &self.image);
        let loaded = self.resource.load_with(screen, "texture", |driver| {
            driver.create_texture_content(desc, image)
        });
        // Fresh content already holds the current pixels
        if loaded {
            self.uploaded_version = self.image_version;
        }
        loaded
    }

    fn unload_content(&mut self) {
        self.resource.unload_content();
    }

    fn is_loaded(&self) -> bool {
        self.resource.is_loaded()
    }
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
