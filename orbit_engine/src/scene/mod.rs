//! Scene graph module
//!
//! Provides the node tree, 2D and viewport transforms, and the node contents
//! that draw through a RenderContext (meshes, sprites, render buffers, lights).

mod content;
mod light_node;
mod mesh_node;
mod node;
mod node_2d;
mod render_buffer_node;
mod scene;
mod sprite_node;
mod targets;
mod viewport;

pub use content::NodeContent;
pub use light_node::LightNode;
pub use mesh_node::MeshNode;
pub use node::{Node, NodeKey, NodeKind};
pub use node_2d::Node2D;
pub use render_buffer_node::RenderBufferNode;
pub use scene::Scene;
pub use sprite_node::SpriteNode;
pub use targets::{ShaderTarget, ShaderTargetRef, TextureTarget};
pub use viewport::{fit_viewport, ScaleMode, Viewport, ViewportFit};
