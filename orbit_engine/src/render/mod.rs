//! Per-frame rendering: primitives and the render context

pub mod primitive;
pub mod render_context;

pub use primitive::Primitive;
pub use render_context::{FrameStats, RenderContext};
