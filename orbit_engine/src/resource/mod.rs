//! Device resources: CPU-side descriptive data with lazily created backend content

pub mod constant_buffer;
pub mod constant_buffer_template;
pub mod index_buffer;
pub mod render_buffer;
pub mod shader;
pub mod texture;
pub mod vertex_buffer;

pub use constant_buffer::{ShaderConstantBuffer, ShaderConstantBufferRef};
pub use constant_buffer_template::{
    ShaderConstantBufferEntry, ShaderConstantBufferTemplate, ShaderConstantBufferTemplateBuilder,
};
pub use index_buffer::{IndexBuffer, IndexData, IndexSize};
pub use render_buffer::{RenderBuffer, RenderBufferRef};
pub use shader::{ConstantBufferDecl, Shader, ShaderDesc, ShaderRef};
pub use texture::{Texture, TextureDesc, TextureFilter, TextureRef, TextureWrap};
pub use vertex_buffer::{VertexBuffer, VertexComponent, VertexData, VertexLayout};

