/// Scene: a tree of nodes rendered through a RenderContext.
///
/// Uses a SlotMap for O(1) insert/remove with stable keys. The root is an
/// inheriting viewport covering the whole screen; nodes created detached
/// are only rendered once attached below the root.
///
/// Transforms are cached per node and recomputed lazily: marking a node
/// dirty marks its whole subtree, and reading a world transform first pulls
/// every dirty ancestor.

use glam::{Mat4, Vec2};
use slotmap::SlotMap;

use crate::error::{Error, Result};
use crate::math::Rect;
use crate::render::RenderContext;
use crate::scene::content::NodeContent;
use crate::scene::node::{Node, NodeKey, NodeKind};
use crate::scene::node_2d::Node2D;
use crate::scene::viewport::{ScaleMode, Viewport};
use crate::{engine_bail_state, engine_error};

pub struct Scene {
    nodes: SlotMap<NodeKey, Node>,
    root: NodeKey,
    /// Size of the parent viewport of the root
    screen_size: Vec2,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

fn unknown_node(key: NodeKey) -> Error {
    let message = format!("Unknown node {:?}", key);
    engine_error!("orbit::Scene", "{}", message);
    Error::NotFound(message)
}

impl Scene {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new("root", NodeKind::Viewport(Viewport::default())));
        Self {
            nodes,
            root,
            screen_size: Vec2::ZERO,
        }
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Number of nodes, attached or not, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    fn node_ref(&self, key: NodeKey) -> Result<&Node> {
        self.nodes.get(key).ok_or_else(|| unknown_node(key))
    }

    fn node_mut(&mut self, key: NodeKey) -> Result<&mut Node> {
        self.nodes.get_mut(key).ok_or_else(|| unknown_node(key))
    }

    // ===== CREATION =====

    /// Create a detached node whose local transform is set directly
    pub fn create_node(&mut self, name: &str) -> NodeKey {
        self.nodes.insert(Node::new(name, NodeKind::Plain))
    }

    /// Create a detached 2D node at `position`
    pub fn create_node_2d(&mut self, name: &str, position: Vec2) -> NodeKey {
        self.nodes.insert(Node::new(name, NodeKind::Node2D(Node2D::new(position))))
    }

    /// Create a detached viewport asking for `requested` logical units
    pub fn create_viewport(&mut self, name: &str, requested: Vec2, scale_mode: ScaleMode) -> NodeKey {
        self.nodes.insert(Node::new(name, NodeKind::Viewport(Viewport::new(requested, scale_mode))))
    }

    /// Attach `content` to a node, returning the one it replaces
    pub fn set_content(&mut self, key: NodeKey, content: Box<dyn NodeContent>) -> Result<Option<Box<dyn NodeContent>>> {
        Ok(self.node_mut(key)?.content.replace(content))
    }

    pub fn take_content(&mut self, key: NodeKey) -> Option<Box<dyn NodeContent>> {
        self.nodes.get_mut(key).and_then(|node| node.content.take())
    }

    fn content_mut(&mut self, key: NodeKey) -> Option<&mut (dyn NodeContent + 'static)> {
        self.nodes.get_mut(key).and_then(|node| node.content.as_deref_mut())
    }

    /// First node named `name`, depth first from the root
    pub fn find_node(&self, name: &str) -> Option<NodeKey> {
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            let node = self.nodes.get(key)?;
            if node.name == name {
                return Some(key);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    // ===== HIERARCHY =====

    /// Attach a parentless node below `parent`
    ///
    /// The child is placed after every sibling of lower or equal order.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown keys, `InvalidState` if the child already has
    /// a parent, is the root, or is an ancestor of `parent`.
    pub fn add_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        self.node_ref(parent)?;
        let child_node = self.node_ref(child)?;
        if child == self.root {
            engine_bail_state!("orbit::Scene", "The root node cannot become a child");
        }
        if child_node.parent.is_some() {
            engine_bail_state!("orbit::Scene", "Node '{}' already has a parent", child_node.name);
        }
        let mut ancestor = Some(parent);
        while let Some(key) = ancestor {
            if key == child {
                engine_bail_state!("orbit::Scene",
                    "Attaching '{}' would create a cycle", child_node.name);
            }
            ancestor = self.nodes.get(key).and_then(|node| node.parent);
        }

        let order = child_node.order;
        self.insert_sorted(parent, child, order);
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        self.set_transform_dirty(child);
        Ok(())
    }

    fn insert_sorted(&mut self, parent: NodeKey, child: NodeKey, order: i32) {
        let Some(mut siblings) = self.nodes.get_mut(parent).map(|node| std::mem::take(&mut node.children)) else {
            return;
        };
        let position = siblings
            .partition_point(|key| self.nodes.get(*key).is_some_and(|node| node.order <= order));
        siblings.insert(position, child);
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children = siblings;
        }
    }

    /// Detach `child` from `parent`, keeping it (and its subtree) in the scene
    pub fn detach_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        let child_node = self.node_ref(child)?;
        if child_node.parent != Some(parent) {
            engine_bail_state!("orbit::Scene", "Node '{}' is not a child of {:?}", child_node.name, parent);
        }
        self.node_mut(parent)?.children.retain(|key| *key != child);
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = None;
        }
        self.set_transform_dirty(child);
        Ok(())
    }

    /// Detach `child` from `parent` and destroy it with its subtree
    pub fn remove_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        self.detach_child(parent, child)?;
        self.destroy_subtree(child);
        Ok(())
    }

    /// Destroy a node and its subtree wherever it is
    pub fn remove_node(&mut self, key: NodeKey) -> Result<()> {
        if key == self.root {
            engine_bail_state!("orbit::Scene", "The root node cannot be removed");
        }
        if let Some(parent) = self.node_ref(key)?.parent {
            self.detach_child(parent, key)?;
        }
        self.destroy_subtree(key);
        Ok(())
    }

    fn destroy_subtree(&mut self, key: NodeKey) {
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend(node.children);
            }
        }
    }

    /// Change the draw order of a node among its siblings
    ///
    /// Negative orders are drawn before the parent itself.
    pub fn set_order(&mut self, key: NodeKey, order: i32) -> Result<()> {
        let node = self.node_mut(key)?;
        node.order = order;
        if let Some(parent) = node.parent {
            self.node_mut(parent)?.children.retain(|child| *child != key);
            self.insert_sorted(parent, key, order);
        }
        Ok(())
    }

    /// Hide or show a node and its subtree
    pub fn set_visible(&mut self, key: NodeKey, visible: bool) -> Result<()> {
        self.node_mut(key)?.visible = visible;
        Ok(())
    }

    // ===== TRANSFORM SETTERS =====

    /// Set the local transform of a plain node
    pub fn set_local_transform(&mut self, key: NodeKey, transform: Mat4) -> Result<()> {
        let node = self.node_mut(key)?;
        if node.kind != NodeKind::Plain {
            engine_bail_state!("orbit::Scene", "Node '{}' computes its own local transform", node.name);
        }
        node.local_transform = transform;
        self.set_transform_dirty(key);
        Ok(())
    }

    fn transform_2d_mut(&mut self, key: NodeKey) -> Result<&mut Node2D> {
        let node = self.node_mut(key)?;
        match &mut node.kind {
            NodeKind::Node2D(transform) => Ok(transform),
            NodeKind::Viewport(viewport) => Ok(&mut viewport.transform),
            NodeKind::Plain => engine_bail_state!("orbit::Scene", "Node '{}' has no 2D transform", node.name),
        }
    }

    fn viewport_mut(&mut self, key: NodeKey) -> Result<&mut Viewport> {
        let node = self.node_mut(key)?;
        match &mut node.kind {
            NodeKind::Viewport(viewport) => Ok(viewport),
            _ => engine_bail_state!("orbit::Scene", "Node '{}' is not a viewport", node.name),
        }
    }

    pub fn set_position(&mut self, key: NodeKey, position: Vec2) -> Result<()> {
        self.transform_2d_mut(key)?.position = position;
        self.set_transform_dirty(key);
        Ok(())
    }

    /// Rotation in radians around Z
    pub fn set_rotation(&mut self, key: NodeKey, rotation: f32) -> Result<()> {
        self.transform_2d_mut(key)?.rotation = rotation;
        self.set_transform_dirty(key);
        Ok(())
    }

    pub fn set_scale(&mut self, key: NodeKey, scale: Vec2) -> Result<()> {
        self.transform_2d_mut(key)?.scale = scale;
        self.set_transform_dirty(key);
        Ok(())
    }

    /// Requested logical size of a viewport
    pub fn set_viewport_size(&mut self, key: NodeKey, size: Vec2) -> Result<()> {
        self.viewport_mut(key)?.set_requested_size(size);
        self.set_transform_dirty(key);
        Ok(())
    }

    pub fn set_scale_mode(&mut self, key: NodeKey, mode: ScaleMode) -> Result<()> {
        self.viewport_mut(key)?.set_scale_mode(mode);
        self.set_transform_dirty(key);
        Ok(())
    }

    pub fn set_alignment(&mut self, key: NodeKey, alignment: Vec2) -> Result<()> {
        self.viewport_mut(key)?.set_alignment(alignment);
        self.set_transform_dirty(key);
        Ok(())
    }

    // ===== TRANSFORM CACHE =====

    /// Mark a node and its whole subtree dirty
    ///
    /// A dirty node always has dirty descendants, so already-dirty subtrees
    /// are not walked again.
    pub fn set_transform_dirty(&mut self, key: NodeKey) {
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get_mut(current) else {
                continue;
            };
            if node.transform_dirty && current != key {
                continue;
            }
            node.transform_dirty = true;
            stack.extend(node.children.iter().copied());
        }
    }

    pub fn is_transform_dirty(&self, key: NodeKey) -> bool {
        self.nodes.get(key).is_some_and(|node| node.transform_dirty)
    }

    /// Recompute the transforms of a node and of its dirty ancestors
    pub fn update_transform(&mut self, key: NodeKey) -> Result<()> {
        self.node_ref(key)?;
        self.refresh_transform(key);
        Ok(())
    }

    fn refresh_transform(&mut self, key: NodeKey) {
        let mut chain = Vec::new();
        let mut current = Some(key);
        while let Some(k) = current {
            match self.nodes.get(k) {
                Some(node) if node.transform_dirty => {
                    chain.push(k);
                    current = node.parent;
                }
                _ => break,
            }
        }
        for k in chain.into_iter().rev() {
            self.compute_node_transform(k);
        }
    }

    /// Recompute one node whose ancestors are all up to date
    fn compute_node_transform(&mut self, key: NodeKey) {
        let parent_world = self
            .nodes
            .get(key)
            .and_then(|node| node.parent)
            .and_then(|parent| self.nodes.get(parent))
            .map_or(Mat4::IDENTITY, |parent| parent.world_transform);
        let parent_size = self.parent_viewport_rect(key).size();

        let Some(node) = self.nodes.get_mut(key) else {
            return;
        };
        let (local, viewport_change) = match &mut node.kind {
            NodeKind::Plain => (node.local_transform, None),
            NodeKind::Node2D(transform) => (transform.local_transform(), None),
            NodeKind::Viewport(viewport) => {
                let (local, previous) = viewport.compute_local_transform(parent_size);
                (local, previous.map(|old| (old, viewport.rect())))
            }
        };
        node.local_transform = local;
        node.world_transform = parent_world * local;
        node.transform_dirty = false;

        let world = node.world_transform;
        if let Some(content) = node.content.as_deref_mut() {
            if let Some((old, new)) = viewport_change {
                content.on_viewport_changed(&old, &new);
            }
            content.on_transform_updated(&world);
        }
    }

    /// Rectangle of the nearest ancestor viewport, or the screen
    fn parent_viewport_rect(&self, key: NodeKey) -> Rect {
        let mut current = self.nodes.get(key).and_then(|node| node.parent);
        while let Some(k) = current {
            let Some(node) = self.nodes.get(k) else {
                break;
            };
            if let Some(viewport) = node.viewport() {
                return viewport.rect();
            }
            current = node.parent;
        }
        Rect::from_size(self.screen_size.x, self.screen_size.y)
    }

    /// Up-to-date rectangle the node is laid out in
    pub fn parent_viewport(&mut self, key: NodeKey) -> Result<Rect> {
        self.update_transform(key)?;
        Ok(self.parent_viewport_rect(key))
    }

    /// Up-to-date logical rectangle of a viewport node
    pub fn viewport_rect(&mut self, key: NodeKey) -> Result<Rect> {
        self.update_transform(key)?;
        let node = self.node_ref(key)?;
        match node.viewport() {
            Some(viewport) => Ok(viewport.rect()),
            None => engine_bail_state!("orbit::Scene", "Node '{}' is not a viewport", node.name),
        }
    }

    pub fn local_transform(&mut self, key: NodeKey) -> Result<Mat4> {
        self.update_transform(key)?;
        Ok(self.node_ref(key)?.local_transform)
    }

    pub fn world_transform(&mut self, key: NodeKey) -> Result<Mat4> {
        self.update_transform(key)?;
        Ok(self.node_ref(key)?.world_transform)
    }

    // ===== SCREEN =====

    pub fn screen_size(&self) -> Vec2 {
        self.screen_size
    }

    /// Set the size the root viewport inherits, re-laying out on change
    pub fn set_screen_size(&mut self, size: Vec2) {
        if self.screen_size != size {
            self.screen_size = size;
            self.set_transform_dirty(self.root);
        }
    }

    // ===== RENDER =====

    /// Render the tree below the root into the current target of `ctx`
    ///
    /// The screen size is refreshed from the screen resolution, and the
    /// projection maps pixels with the origin at the top-left corner.
    pub fn render(&mut self, ctx: &mut RenderContext<'_>) {
        let resolution = ctx.screen().resolution();
        let size = Vec2::new(resolution.width as f32, resolution.height as f32);
        self.set_screen_size(size);
        ctx.set_projection_matrix(Mat4::orthographic_rh(0.0, size.x, size.y, 0.0, -1.0, 1.0));
        self.render_node(self.root, ctx);
    }

    fn render_node(&mut self, key: NodeKey, ctx: &mut RenderContext<'_>) {
        match self.nodes.get(key) {
            Some(node) if node.visible => {}
            _ => return,
        }
        self.refresh_transform(key);
        let Some(node) = self.nodes.get(key) else {
            return;
        };
        let world = node.world_transform;
        let children = node.children.clone();
        let split = node.first_non_negative_child(&self.nodes);

        if let Some(content) = self.content_mut(key) {
            if !content.begin_render(ctx, &world) {
                return;
            }
        }
        for &child in &children[..split] {
            self.render_node(child, ctx);
        }
        if let Some(content) = self.content_mut(key) {
            ctx.set_modelview_matrix(world);
            content.draw(ctx, &world);
        }
        for &child in &children[split..] {
            self.render_node(child, ctx);
        }
        if let Some(content) = self.content_mut(key) {
            content.end_render(ctx, &world);
        }
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
