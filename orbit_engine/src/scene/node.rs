/// Scene graph node.
///
/// Nodes live in the arena of their `Scene` and are addressed by `NodeKey`.
/// The tree structure (parent, ordered children) and the transform cache
/// are maintained by the scene; a node only exposes read access to them.

use std::fmt;

use glam::Mat4;
use slotmap::new_key_type;

use crate::scene::content::NodeContent;
use crate::scene::node_2d::Node2D;
use crate::scene::viewport::Viewport;

new_key_type! {
    /// Stable key of a node within a Scene.
    ///
    /// Keys stay valid until the node is removed from the scene.
    pub struct NodeKey;
}

/// Transform behaviour of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Local transform set directly
    Plain,
    /// Local transform computed from a 2D position, rotation and scale
    Node2D(Node2D),
    /// Logical coordinate space fitted into the parent viewport
    Viewport(Viewport),
}

pub struct Node {
    pub(crate) name: String,
    pub(crate) parent: Option<NodeKey>,
    /// Sorted by ascending order, stable
    pub(crate) children: Vec<NodeKey>,
    pub(crate) order: i32,
    pub(crate) visible: bool,
    pub(crate) local_transform: Mat4,
    pub(crate) world_transform: Mat4,
    pub(crate) transform_dirty: bool,
    pub(crate) kind: NodeKind,
    pub(crate) content: Option<Box<dyn NodeContent>>,
}

impl Node {
    pub(crate) fn new(name: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            order: 0,
            visible: true,
            local_transform: Mat4::IDENTITY,
            world_transform: Mat4::IDENTITY,
            transform_dirty: true,
            kind,
            content: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Local transform as of the last update (may be stale while dirty)
    pub fn local_transform(&self) -> Mat4 {
        self.local_transform
    }

    /// World transform as of the last update (may be stale while dirty)
    pub fn world_transform(&self) -> Mat4 {
        self.world_transform
    }

    pub fn is_transform_dirty(&self) -> bool {
        self.transform_dirty
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        match &self.kind {
            NodeKind::Viewport(viewport) => Some(viewport),
            _ => None,
        }
    }

    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }

    /// Index of the first child rendered after the node itself
    pub(crate) fn first_non_negative_child(&self, nodes: &slotmap::SlotMap<NodeKey, Node>) -> usize {
        self.children
            .partition_point(|key| nodes.get(*key).is_some_and(|child| child.order < 0))
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("order", &self.order)
            .field("visible", &self.visible)
            .field("transform_dirty", &self.transform_dirty)
            .field("kind", &self.kind)
            .field("has_content", &self.content.is_some())
            .finish()
    }
}
