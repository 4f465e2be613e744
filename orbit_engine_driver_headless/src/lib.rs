/*!
# Orbit Engine - Headless Driver

Video driver for the Orbit engine that renders nothing. Every call the engine
makes is validated and recorded in an `EventLog`, which makes this backend the
reference for tests and for tools running the scene graph without a window.

Enable the `trace-events` feature to also trace every recorded event through
the engine logger.
*/

mod events;
mod headless_content;
mod headless_driver;

pub use events::{ContentKind, DrawRecord, DriverEvent, EventLog};
pub use headless_driver::{HeadlessDriver, DEFAULT_TEXTURE_UNITS};

use orbit_engine::orbit::device::{DriverRegistry, VideoDeviceDriver};

/// Registry name of the headless driver
pub const DRIVER_NAME: &str = "headless";

/// Driver interface version implemented by this crate
pub const API_VERSION: u32 = 1;

/// Register the headless driver
///
/// It registers with priority 0 so any real backend is preferred.
///
/// # Example
///
/// ```
/// use orbit_engine::orbit::device::{DriverRegistry, Screen, ScreenConfig};
///
/// let mut registry = DriverRegistry::new();
/// orbit_engine_driver_headless::register(&mut registry);
///
/// let mut screen = Screen::new(ScreenConfig::default());
/// screen.load_video_device(&registry).unwrap();
/// assert_eq!(screen.driver().unwrap().name(), "headless");
/// ```
pub fn register(registry: &mut DriverRegistry) {
    register_with_log(registry, EventLog::new());
}

/// Register the headless driver so every instance records into `log`
pub fn register_with_log(registry: &mut DriverRegistry, log: EventLog) {
    registry.register(DRIVER_NAME, 0, API_VERSION, Box::new(move || {
        Box::new(HeadlessDriver::with_log(log.clone())) as Box<dyn VideoDeviceDriver>
    }));
}
