//! Integration tests for asset loading
//!
//! PNG files are read from a file system, decoded into power-of-two
//! textures and drawn through the headless driver. No GPU required.
//!
//! Run with: cargo test --test asset_integration_tests

use glam::Vec2;
use orbit_engine::orbit::device::{DriverRegistry, Screen, ScreenConfig};
use orbit_engine::orbit::io::{FileSystem, ImageLoaderRegistry, MemoryFileSystem};
use orbit_engine::orbit::resource::{Shader, ShaderDesc, Texture, VertexLayout};
use orbit_engine::orbit::scene::{Scene, SpriteNode};
use orbit_engine::orbit::Error;
use orbit_engine_driver_headless::{ContentKind, DriverEvent, EventLog};

// ============================================================================
// HELPERS
// ============================================================================

fn encode_png(width: u32, height: u32) -> Vec<u8> {
    let picture = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 128, 0, 255]));
    let mut bytes = std::io::Cursor::new(Vec::new());
    picture.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
    bytes.into_inner()
}

fn assets() -> MemoryFileSystem {
    let files = MemoryFileSystem::new();
    files.insert("sprites/ship.png", encode_png(3, 5));
    files.insert("sprites/broken.png", b"not a png".to_vec());
    files
}

fn read(files: &MemoryFileSystem, path: &str) -> Vec<u8> {
    files
        .find_file(path)
        .and_then(|file| file.load_content())
        .map(|buffer| buffer.into_vec())
        .unwrap()
}

// ============================================================================
// ASSET TESTS
// ============================================================================

#[test]
fn test_integration_png_texture_is_padded() {
    let files = assets();
    let loaders = ImageLoaderRegistry::with_defaults();

    let texture = Texture::load("ship", &read(&files, "sprites/ship.png"), &loaders).unwrap();
    assert_eq!(texture.size(), (4, 8));
    assert_eq!(texture.content_size(), (3, 5));
    assert_eq!(&texture.image().pixels()[..4], &[255, 128, 0, 255]);
}

#[test]
fn test_integration_undecodable_file_is_rejected() {
    let files = assets();
    let loaders = ImageLoaderRegistry::with_defaults();
    let result = Texture::load("broken", &read(&files, "sprites/broken.png"), &loaders);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
    assert!(files.find_file("sprites/missing.png").is_none());
}

#[test]
fn test_integration_sprite_from_file() {
    let files = assets();
    let loaders = ImageLoaderRegistry::with_defaults();
    let texture = Texture::load("ship", &read(&files, "sprites/ship.png"), &loaders)
        .unwrap()
        .into_shared();

    let sprite = SpriteNode::new(Vec2::new(30.0, 50.0), Some(texture)).unwrap().with_shader(
        Shader::new_shared(ShaderDesc::new("sprite").with_vertex_layout(VertexLayout::position_2d_textured(1))),
    );
    // Only the original picture is mapped onto the quad
    assert_eq!(sprite.quad().vertex_texture_coordinate(3, 0), Some(Vec2::new(0.75, 0.625)));

    let log = EventLog::new();
    let mut registry = DriverRegistry::new();
    orbit_engine_driver_headless::register_with_log(&mut registry, log.clone());
    let mut screen = Screen::new(ScreenConfig::default());
    screen.load_video_device(&registry).unwrap();

    let mut scene = Scene::new();
    let root = scene.root();
    let key = scene.create_node_2d("ship", Vec2::ZERO);
    scene.set_content(key, Box::new(sprite)).unwrap();
    scene.add_child(root, key).unwrap();

    let mut ctx = screen.begin_frame().unwrap();
    scene.render(&mut ctx);
    ctx.end_frame().unwrap();

    assert_eq!(log.draws().len(), 1);
    // 4x8 RGBA texels uploaded at creation
    assert_eq!(
        log.count(|event| matches!(
            event,
            DriverEvent::Uploaded { kind: ContentKind::Texture, bytes: 128, .. }
        )),
        1
    );
}
