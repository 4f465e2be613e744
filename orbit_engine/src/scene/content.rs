/// What a node draws and how it reacts to the traversal.
///
/// Every hook has a no-op default; a content implements only what it needs.
/// `world` is always the up-to-date world transform of the owning node.

use glam::Mat4;

use crate::math::Rect;
use crate::render::RenderContext;

pub trait NodeContent: Send {
    /// Called before anything of the node's subtree is drawn
    ///
    /// Returning false skips the node and all its descendants for this frame
    /// (`end_render` is not called either).
    fn begin_render(&mut self, _ctx: &mut RenderContext<'_>, _world: &Mat4) -> bool {
        true
    }

    /// Draw the node itself; the modelview is already set to `world`
    fn draw(&mut self, _ctx: &mut RenderContext<'_>, _world: &Mat4) {}

    /// Called once the whole subtree has been drawn
    fn end_render(&mut self, _ctx: &mut RenderContext<'_>, _world: &Mat4) {}

    /// The world transform of the node was recomputed
    fn on_transform_updated(&mut self, _world: &Mat4) {}

    /// The rectangle of the owning viewport node changed
    fn on_viewport_changed(&mut self, _old: &Rect, _new: &Rect) {}
}
