/// Generic lazy-load/unload state machine for backend content.
///
/// A device resource pairs CPU-side descriptive data (owned by the concrete
/// resource type) with an optional backend content object. The content is a
/// disposable cache: it is created on demand through the screen's active
/// driver and dropped whenever the driver changes.

use crate::device::driver::VideoDeviceDriver;
use crate::device::screen::Screen;

/// Resource that can be (re)loaded against a screen
///
/// Implemented by every concrete resource (vertex/index buffers, shaders,
/// textures, constant buffers, render buffers). Screens hold weak handles to
/// tracked resources through this trait to force a reload when their driver
/// changes.
pub trait DeviceBound: Send {
    /// Create backend content from the screen's driver if not already loaded
    ///
    /// Returns false if there is no driver or the driver cannot create the
    /// content. The resource then stays unloaded.
    fn load_content_from(&mut self, screen: &mut Screen) -> bool;

    /// Drop backend content. Always succeeds, safe when already unloaded.
    fn unload_content(&mut self);

    /// True iff backend content is attached
    fn is_loaded(&self) -> bool;
}

/// Optional backend content plus the driver generation it was created for
pub struct DeviceResource<C: ?Sized> {
    content: Option<Box<C>>,
    generation: u64,
}

impl<C: ?Sized> DeviceResource<C> {
    /// Create an unloaded resource
    pub fn new() -> Self {
        Self {
            content: None,
            generation: 0,
        }
    }

    /// True iff content is attached
    pub fn is_loaded(&self) -> bool {
        self.content.is_some()
    }

    /// True iff content is attached and was created by the screen's current driver
    pub fn is_loaded_for(&self, screen: &Screen) -> bool {
        self.content.is_some() && self.generation == screen.driver_generation()
    }

    /// Attached content, if any
    pub fn content(&self) -> Option<&C> {
        self.content.as_deref()
    }

    /// Attached content, if any
    pub fn content_mut(&mut self) -> Option<&mut C> {
        self.content.as_deref_mut()
    }

    /// Load content through `create` unless already loaded for the current driver
    ///
    /// Content built by a previous driver is dropped first. On failure the
    /// resource stays unloaded and a warning is logged.
    ///
    /// # Arguments
    ///
    /// * `screen` - Logical device owning the driver
    /// * `kind` - Resource kind for log messages (e.g. "vertex buffer")
    /// * `create` - Driver factory call producing the content
    pub fn load_with<F>(&mut self, screen: &mut Screen, kind: &str, create: F) -> bool
    where
        F: FnOnce(&mut dyn VideoDeviceDriver) -> Option<Box<C>>,
    {
        if self.is_loaded_for(screen) {
            return true;
        }
        if self.content.is_some() {
            crate::engine_debug!("orbit::DeviceResource",
                "Discarding {} content created by a previous driver", kind);
            self.content = None;
        }

        let generation = screen.driver_generation();
        let driver = match screen.driver_mut() {
            Some(driver) => driver,
            None => {
                crate::engine_warn!("orbit::DeviceResource",
                    "Cannot load {}: no active video driver", kind);
                return false;
            }
        };

        match create(&mut *driver) {
            Some(content) => {
                self.content = Some(content);
                self.generation = generation;
                true
            }
            None => {
                crate::engine_warn!("orbit::DeviceResource",
                    "Video driver '{}' could not create {} content", driver.name(), kind);
                false
            }
        }
    }

    /// Drop attached content. Safe to call when already unloaded.
    pub fn unload_content(&mut self) {
        self.content = None;
    }
}

impl<C: ?Sized> Default for DeviceResource<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized> std::fmt::Debug for DeviceResource<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceResource")
            .field("loaded", &self.content.is_some())
            .field("generation", &self.generation)
            .finish()
    }
}
