/// CPU images and pluggable image loaders.
///
/// Loaders are kept in a priority-ordered registry; loading tries them in
/// order and the first one that decodes the data wins.

use crate::error::{Error, Result};
use crate::module_registry::{ModuleEntry, ModuleRegistry};
use crate::{engine_debug, engine_warn};

/// Pixel layout of an `Image`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    Gray8,
    Rgb8,
    #[default]
    Rgba8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// Decoded pixels, rows top to bottom, tightly packed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Image {
    width: u32,
    height: u32,
    format: PixelFormat,
    pixels: Vec<u8>,
}

impl Image {
    /// Wrap decoded pixels
    ///
    /// # Errors
    ///
    /// Returns `InvalidResource` if `pixels` does not hold exactly
    /// `width * height` pixels of `format`.
    pub fn new(width: u32, height: u32, format: PixelFormat, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if pixels.len() != expected {
            return Err(Error::InvalidResource(format!(
                "{}x{} {:?} image needs {} bytes, got {}",
                width, height, format, expected, pixels.len()
            )));
        }
        Ok(Self { width, height, format, pixels })
    }

    /// Zero-filled image
    pub fn empty(width: u32, height: u32, format: PixelFormat) -> Self {
        let pixels = vec![0; width as usize * height as usize * format.bytes_per_pixel()];
        Self { width, height, format, pixels }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn is_power_of_two(&self) -> bool {
        self.width.is_power_of_two() && self.height.is_power_of_two()
    }

    /// Copy into the top-left corner of a zeroed power-of-two image
    pub fn to_power_of_two(&self) -> Image {
        let width = self.width.max(1).next_power_of_two();
        let height = self.height.max(1).next_power_of_two();
        if width == self.width && height == self.height {
            return self.clone();
        }
        let mut padded = Image::empty(width, height, self.format);
        let row = self.width as usize * self.format.bytes_per_pixel();
        let padded_row = width as usize * self.format.bytes_per_pixel();
        for y in 0..self.height as usize {
            padded.pixels[y * padded_row..y * padded_row + row]
                .copy_from_slice(&self.pixels[y * row..(y + 1) * row]);
        }
        padded
    }
}

// ===== LOADERS =====

/// Decoder for one image container format
pub trait ImageLoader: Send + Sync {
    /// Decode `source`. Returns None if the data is not in this loader's format.
    fn load_image(&self, source: &[u8]) -> Option<Image>;
}

/// PNG decoder backed by the `image` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct PngImageLoader;

impl ImageLoader for PngImageLoader {
    fn load_image(&self, source: &[u8]) -> Option<Image> {
        let decoded = ::image::load_from_memory_with_format(source, ::image::ImageFormat::Png).ok()?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Image::new(width, height, PixelFormat::Rgba8, rgba.into_raw()).ok()
    }
}

/// Priority-ordered set of image loaders
#[derive(Default)]
pub struct ImageLoaderRegistry {
    loaders: ModuleRegistry<Box<dyn ImageLoader>>,
}

impl ImageLoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in PNG loader
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("png", 0, 1, Box::new(PngImageLoader));
        registry
    }

    pub fn register(&mut self, name: &str, priority: i32, api_version: u32, loader: Box<dyn ImageLoader>) {
        self.loaders.register(name, priority, api_version, loader);
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.loaders.unregister(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.loaders.names()
    }

    /// Decode `source` with the first loader that accepts it
    ///
    /// # Errors
    ///
    /// Returns `InvalidResource` if no registered loader accepts the data.
    pub fn load_image(&self, source: &[u8]) -> Result<Image> {
        self.loaders
            .iter()
            .find_map(|entry: &ModuleEntry<Box<dyn ImageLoader>>| {
                let image = entry.module.load_image(source)?;
                engine_debug!("orbit::ImageLoader",
                    "'{}' decoded {}x{} image", entry.name, image.width(), image.height());
                Some(image)
            })
            .ok_or_else(|| {
                engine_warn!("orbit::ImageLoader",
                    "No loader among {:?} accepts {} bytes", self.loaders.names(), source.len());
                Error::InvalidResource("no image loader accepts the data".to_string())
            })
    }

    /// Decode `source` and pad it to power-of-two dimensions
    ///
    /// Returns the padded image and the original picture size.
    pub fn load_power_of_two_image(&self, source: &[u8]) -> Result<(Image, (u32, u32))> {
        let image = self.load_image(source)?;
        let original = (image.width(), image.height());
        Ok((image.to_power_of_two(), original))
    }
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;
