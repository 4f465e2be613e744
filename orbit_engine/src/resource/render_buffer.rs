/// Off-screen render buffer.
///
/// A render buffer draws into an ordered, sparse list of target textures
/// over a viewport rectangle. Its content is the backend framebuffer, built
/// from the contents of the target textures.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::device::{DeviceBound, DeviceResource, RenderBufferContent, Screen, TextureContent};
use crate::math::Rect;
use crate::resource::texture::{Texture, TextureRef};
use crate::utils::lock;
use crate::engine_warn;

/// Shared handle to a render buffer
pub type RenderBufferRef = Arc<Mutex<RenderBuffer>>;

#[derive(Debug, Default)]
pub struct RenderBuffer {
    viewport: Rect,
    targets: Vec<Option<TextureRef>>,
    resource: DeviceResource<dyn RenderBufferContent>,
}

impl RenderBuffer {
    pub fn new(viewport: Rect) -> Self {
        Self {
            viewport,
            targets: Vec::new(),
            resource: DeviceResource::new(),
        }
    }

    /// Render buffer drawing into one new texture of the viewport size
    pub fn with_color_target(name: &str, viewport: Rect) -> (RenderBufferRef, TextureRef) {
        let texture = Texture::render_target(name, viewport.width as u32, viewport.height as u32).into_shared();
        let mut buffer = Self::new(viewport);
        buffer.set_target(0, Some(texture.clone()));
        (Arc::new(Mutex::new(buffer)), texture)
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Change the viewport; the framebuffer is rebuilt on next use
    pub fn set_viewport(&mut self, viewport: Rect) {
        if self.viewport != viewport {
            self.viewport = viewport;
            self.resource.unload_content();
        }
    }

    /// Attach (or detach with None) the texture at `index`, growing the list as needed
    pub fn set_target(&mut self, index: usize, texture: Option<TextureRef>) {
        if index >= self.targets.len() {
            if texture.is_none() {
                return;
            }
            self.targets.resize(index + 1, None);
        }
        self.targets[index] = texture;
        while matches!(self.targets.last(), Some(None)) {
            self.targets.pop();
        }
        self.resource.unload_content();
    }

    pub fn target(&self, index: usize) -> Option<&TextureRef> {
        self.targets.get(index).and_then(Option::as_ref)
    }

    /// Length of the target list, including empty slots
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    pub(crate) fn content(&self) -> Option<&dyn RenderBufferContent> {
        self.resource.content()
    }
}

impl DeviceBound for RenderBuffer {
    fn load_content_from(&mut self, screen: &mut Screen) -> bool {
        if self.resource.is_loaded_for(screen) {
            return true;
        }

        let mut guards: Vec<Option<MutexGuard<'_, Texture>>> = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            match target {
                Some(texture) => {
                    let mut texture = lock(texture);
                    if !texture.load_content_from(screen) {
                        engine_warn!("orbit::RenderBuffer",
                            "Target texture '{}' could not be loaded", texture.name());
                        return false;
                    }
                    guards.push(Some(texture));
                }
                None => guards.push(None),
            }
        }

        let contents: Vec<Option<&dyn TextureContent>> = guards
            .iter()
            .map(|guard| guard.as_ref().and_then(|texture| texture.content()))
            .collect();
        let viewport = self.viewport;
        self.resource.load_with(screen, "render buffer", |driver| {
            driver.create_render_buffer_content(&viewport, &contents)
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
#[path = "render_buffer_tests.rs"]
mod tests;
