/// Primitive assembly modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Independent triangles, 3 vertices each
    Triangles,
    /// Each vertex after the second forms a triangle with the previous two
    TriangleStrip,
    /// Each vertex after the second forms a triangle with the previous one and the first
    TriangleFan,
}

impl Primitive {
    /// Number of triangles produced by `vertex_count` vertices
    pub fn triangle_count(&self, vertex_count: usize) -> usize {
        match self {
            Primitive::Triangles => vertex_count / 3,
            Primitive::TriangleStrip | Primitive::TriangleFan => vertex_count.saturating_sub(2),
        }
    }
}
