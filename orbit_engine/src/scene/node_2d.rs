/// 2D transform of a scene node: translation, rotation around Z, scale.

use glam::{Mat4, Quat, Vec2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node2D {
    pub position: Vec2,
    /// Radians, counter-clockwise
    pub rotation: f32,
    pub scale: Vec2,
}

impl Default for Node2D {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
        }
    }
}

impl Node2D {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Scale first, then rotate, then translate
    pub fn local_transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale.extend(1.0),
            Quat::from_rotation_z(self.rotation),
            self.position.extend(0.0),
        )
    }
}
