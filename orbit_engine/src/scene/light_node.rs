/// Node content placing a light source at the node's world position.

use glam::{Mat4, Vec3};

use crate::lighting::LightSourceRef;
use crate::scene::content::NodeContent;
use crate::utils::lock;

#[derive(Debug, Clone)]
pub struct LightNode {
    light: LightSourceRef,
}

impl LightNode {
    pub fn new(light: LightSourceRef) -> Self {
        Self { light }
    }

    pub fn light(&self) -> &LightSourceRef {
        &self.light
    }
}

impl NodeContent for LightNode {
    fn on_transform_updated(&mut self, world: &Mat4) {
        lock(&self.light).set_position(world.transform_point3(Vec3::ZERO));
    }
}
