//! Light sources and the manager sharing them with shaders

mod light_source;
mod lighting_manager;

pub use light_source::{LightSource, LightSourceRef};
pub use lighting_manager::{LightingManager, LightingManagerBuilder};
