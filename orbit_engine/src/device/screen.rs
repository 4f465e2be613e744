/// Screen - the logical device every resource is loaded against.
///
/// A screen owns the active video driver and tracks shared resources that
/// were loaded through it. Switching or dropping the driver force-unloads
/// every tracked resource; switching reloads them against the new driver.
/// Untracked resources notice the switch lazily through the driver
/// generation counter the next time they are used.

use std::sync::{Arc, Mutex, Weak};
use glam::{Vec2, Vec4};
use winit::dpi::PhysicalSize;

use crate::device::device_resource::DeviceBound;
use crate::device::driver::{DriverRegistry, VideoDeviceDriver};
use crate::error::{Error, Result};
use crate::render::RenderContext;
use crate::utils::lock;
use crate::{engine_error, engine_info, engine_warn};

/// Screen configuration, handed to the driver on initialization
#[derive(Debug, Clone)]
pub struct ScreenConfig {
    /// Window / surface title
    pub title: String,
    /// Requested output resolution in pixels
    pub resolution: PhysicalSize<u32>,
    /// Wait for vertical sync when presenting
    pub vsync: bool,
    /// Color the screen is cleared to at the start of each frame
    pub clear_color: Vec4,
    /// Upper bound on texture units used by a single draw
    pub max_texture_layers: usize,
    /// Enable backend validation/debug layers
    pub enable_validation: bool,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            title: "Orbit Application".to_string(),
            resolution: PhysicalSize::new(800, 600),
            vsync: true,
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            max_texture_layers: 8,
            enable_validation: cfg!(debug_assertions),
        }
    }
}

/// Logical output device
pub struct Screen {
    config: ScreenConfig,
    driver: Option<Box<dyn VideoDeviceDriver>>,
    /// Bumped every time the driver changes; content is valid only for the
    /// generation it was created in
    generation: u64,
    resolution: PhysicalSize<u32>,
    tracked: Vec<Weak<Mutex<dyn DeviceBound>>>,
}

impl Screen {
    /// Create a screen without a driver
    pub fn new(config: ScreenConfig) -> Self {
        let resolution = config.resolution;
        Self {
            config,
            driver: None,
            generation: 0,
            resolution,
            tracked: Vec::new(),
        }
    }

    /// Screen configuration
    pub fn config(&self) -> &ScreenConfig {
        &self.config
    }

    // ===== DRIVER MANAGEMENT =====

    /// Load the first driver of the registry (in priority order) that initializes
    ///
    /// # Errors
    ///
    /// Returns `InitializationFailed` if no registered driver could be initialized.
    pub fn load_video_device(&mut self, registry: &DriverRegistry) -> Result<()> {
        for entry in registry.iter() {
            let driver = (entry.module)();
            match self.set_driver(driver) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    engine_warn!("orbit::Screen",
                        "Video driver '{}' unusable, trying next: {}", entry.name, err);
                }
            }
        }
        let message = format!("No usable video driver among {} registered", registry.len());
        engine_error!("orbit::Screen", "{}", message);
        Err(Error::InitializationFailed(message))
    }

    /// Load a driver by registry name
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the name is not registered, or the driver's
    /// initialization error.
    pub fn load_video_device_named(&mut self, registry: &DriverRegistry, name: &str) -> Result<()> {
        let factory = registry
            .find(name)
            .ok_or_else(|| Error::NotFound(format!("video driver '{}'", name)))?;
        self.set_driver(factory())
    }

    /// Install a driver, replacing the current one
    ///
    /// Every tracked resource is unloaded, then reloaded against the new
    /// driver. If the new driver fails to initialize the current driver
    /// stays in place.
    ///
    /// # Errors
    ///
    /// Returns `InitializationFailed` if the driver's `init` fails.
    pub fn set_driver(&mut self, mut driver: Box<dyn VideoDeviceDriver>) -> Result<()> {
        if let Err(err) = driver.init(&self.config) {
            let message = format!("Video driver '{}' failed to initialize: {}", driver.name(), err);
            engine_error!("orbit::Screen", "{}", message);
            return Err(Error::InitializationFailed(message));
        }

        self.unload_tracked();
        self.resolution = driver.resolution();
        engine_info!("orbit::Screen", "Video driver '{}' active ({}x{})",
            driver.name(), self.resolution.width, self.resolution.height);
        self.driver = Some(driver);
        self.generation += 1;

        let (reloaded, failed) = self.reload_tracked();
        if reloaded + failed > 0 {
            engine_info!("orbit::Screen", "Reloaded {} resources ({} failed)", reloaded, failed);
        }
        Ok(())
    }

    /// Remove the current driver, unloading every tracked resource
    pub fn unload_driver(&mut self) -> Option<Box<dyn VideoDeviceDriver>> {
        self.unload_tracked();
        let driver = self.driver.take();
        if driver.is_some() {
            self.generation += 1;
        }
        driver
    }

    /// True if a driver is installed
    pub fn has_driver(&self) -> bool {
        self.driver.is_some()
    }

    /// Active driver
    pub fn driver(&self) -> Option<&(dyn VideoDeviceDriver + 'static)> {
        self.driver.as_deref()
    }

    /// Active driver
    pub fn driver_mut(&mut self) -> Option<&mut (dyn VideoDeviceDriver + 'static)> {
        self.driver.as_deref_mut()
    }

    /// Counter identifying the current driver installation
    pub fn driver_generation(&self) -> u64 {
        self.generation
    }

    // ===== RESOLUTION =====

    /// Output resolution in pixels
    pub fn resolution(&self) -> PhysicalSize<u32> {
        self.resolution
    }

    /// Output surface was resized
    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.resolution = size;
        if let Some(driver) = self.driver.as_mut() {
            driver.resize(size);
        }
    }

    /// Convert screen pixels to normalized device coordinates through the driver
    ///
    /// Returns None without a driver.
    pub fn convert_screen_to_world(&self, point: Vec2) -> Option<Vec2> {
        self.driver.as_ref().map(|driver| driver.convert_screen_to_world(point))
    }

    // ===== RESOURCE TRACKING =====

    /// Track a shared resource so driver changes unload and reload it
    ///
    /// Tracking the same handle twice is a no-op. Only a weak handle is kept.
    pub fn track<R: DeviceBound + 'static>(&mut self, resource: &Arc<Mutex<R>>) {
        let handle: Arc<Mutex<dyn DeviceBound>> = resource.clone();
        let weak = Arc::downgrade(&handle);
        self.tracked.retain(|existing| existing.strong_count() > 0);
        if !self.tracked.iter().any(|existing| Weak::ptr_eq(existing, &weak)) {
            self.tracked.push(weak);
        }
    }

    /// Number of live tracked resources
    pub fn tracked_count(&self) -> usize {
        self.tracked.iter().filter(|weak| weak.strong_count() > 0).count()
    }

    fn unload_tracked(&mut self) {
        self.tracked.retain(|weak| weak.strong_count() > 0);
        for weak in &self.tracked {
            if let Some(resource) = weak.upgrade() {
                lock(&resource).unload_content();
            }
        }
    }

    fn reload_tracked(&mut self) -> (usize, usize) {
        let tracked = std::mem::take(&mut self.tracked);
        let mut reloaded = 0;
        let mut failed = 0;
        for weak in &tracked {
            if let Some(resource) = weak.upgrade() {
                if lock(&resource).load_content_from(self) {
                    reloaded += 1;
                } else {
                    failed += 1;
                }
            }
        }
        // Resources tracked during the reload (render buffer targets) are kept too
        let mut added = std::mem::replace(&mut self.tracked, tracked);
        added.retain(|weak| !self.tracked.iter().any(|existing| Weak::ptr_eq(existing, weak)));
        self.tracked.extend(added);
        (reloaded, failed)
    }

    // ===== FRAMES =====

    /// Start a frame and return its render context
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` without a driver, or the driver's `pre_render` error.
    pub fn begin_frame(&mut self) -> Result<RenderContext<'_>> {
        match self.driver.as_mut() {
            Some(driver) => driver.pre_render()?,
            None => crate::engine_bail_state!("orbit::Screen", "begin_frame called without a video driver"),
        }
        Ok(RenderContext::new(self))
    }
}

#[cfg(test)]
#[path = "screen_tests.rs"]
mod tests;
