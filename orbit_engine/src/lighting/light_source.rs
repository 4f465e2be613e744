/// Point light parameters fed to shaders by the lighting manager.

use std::sync::{Arc, Mutex};

use glam::{Vec3, Vec4};

/// Shared handle to a light source
pub type LightSourceRef = Arc<Mutex<LightSource>>;

#[derive(Debug, Clone, PartialEq)]
pub struct LightSource {
    enabled: bool,
    position: Vec3,
    ambient: Vec4,
    diffuse: Vec4,
    specular: Vec4,
    strength: f32,
}

impl Default for LightSource {
    fn default() -> Self {
        Self {
            enabled: true,
            position: Vec3::ZERO,
            ambient: Vec4::new(0.0, 0.0, 0.0, 1.0),
            diffuse: Vec4::ONE,
            specular: Vec4::ONE,
            strength: 1.0,
        }
    }
}

impl LightSource {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn new_shared(position: Vec3) -> LightSourceRef {
        Arc::new(Mutex::new(Self::new(position)))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabled lights are skipped without taking a slot
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn ambient(&self) -> Vec4 {
        self.ambient
    }

    pub fn set_ambient(&mut self, color: Vec4) {
        self.ambient = color;
    }

    pub fn diffuse(&self) -> Vec4 {
        self.diffuse
    }

    pub fn set_diffuse(&mut self, color: Vec4) {
        self.diffuse = color;
    }

    pub fn specular(&self) -> Vec4 {
        self.specular
    }

    pub fn set_specular(&mut self, color: Vec4) {
        self.specular = color;
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    pub fn set_strength(&mut self, strength: f32) {
        self.strength = strength;
    }
}
