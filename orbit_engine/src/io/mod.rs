//! File system, data buffer and image collaborators

pub mod data_buffer;
pub mod file_system;
pub mod image;

pub use data_buffer::DataBuffer;
pub use file_system::{normalize_path, Directory, File, FileSystem, MemoryFileSystem};
pub use self::image::{Image, ImageLoader, ImageLoaderRegistry, PixelFormat, PngImageLoader};
