/*!
# Orbit Engine

Core of the Orbit 2D/3D engine: a scene-graph renderer on top of a
backend-agnostic device layer.

Backends (OpenGL, Direct3D, headless, ...) implement `VideoDeviceDriver` and
are registered at startup in a `DriverRegistry`. Everything the engine draws
with is a device resource: CPU-side data that is the source of truth, plus
backend content created lazily from it and recreated after a driver switch.

## Architecture

- **Screen**: logical device owning the active driver and its configuration
- **Resources**: vertex/index buffers, shaders, textures, constant buffers, render buffers
- **RenderContext**: per-frame binding state and draw dispatch
- **Scene**: node tree with 2D transforms, viewports and drawable contents
- **LightingManager**: packs light sources into a shared constant buffer
- **io**: file systems, data buffers and image loaders
*/

// Internal modules
mod error;
mod engine;
mod math;
mod module_registry;
mod utils;
mod value_type;
pub mod log;
pub mod device;
pub mod io;
pub mod lighting;
pub mod render;
pub mod resource;
pub mod scene;

// Main orbit namespace module
pub mod orbit {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Shared helpers
    pub use crate::math::Rect;
    pub use crate::module_registry::{ModuleEntry, ModuleRegistry};
    pub use crate::value_type::{ShaderValue, ValueType};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Device sub-module (drivers, backend content, screen)
    pub mod device {
        pub use crate::device::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Render sub-module
    pub mod render {
        pub use crate::render::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }

    // Lighting sub-module
    pub mod lighting {
        pub use crate::lighting::*;
    }

    // IO sub-module
    pub mod io {
        pub use crate::io::*;
    }
}

// Re-export math library at crate root
pub use glam;
