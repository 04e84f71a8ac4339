//! Directional lighting.

use glam::Vec3;

use crate::{
    abs::{Shader, UniformSlot},
    error::ResourceError,
};

/// A directional light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    /// Unit vector the light travels along.
    pub direction: Vec3,
    pub color: Vec3,
}

impl Light {
    /// Creates a light, normalizing `direction`. A zero direction stays zero.
    pub fn new(direction: Vec3, color: Vec3) -> Self {
        Self {
            direction: direction.normalize_or_zero(),
            color,
        }
    }
}

/// The lighting uniforms of a shader: `u_ambient`, `u_light_color` and `u_light_direction`.
#[derive(Debug, Clone)]
pub struct LightUniforms {
    ambient: UniformSlot,
    color: UniformSlot,
    direction: UniformSlot,
}

impl LightUniforms {
    pub fn resolve(shader: &Shader) -> Result<Self, ResourceError> {
        Ok(Self {
            ambient: shader.uniform("u_ambient")?,
            color: shader.uniform("u_light_color")?,
            direction: shader.uniform("u_light_direction")?,
        })
    }

    pub fn apply(&self, shader: &Shader, light: &Light, ambient: Vec3) {
        shader.set(&self.ambient, ambient);
        shader.set(&self.color, light.color);
        shader.set(&self.direction, light.direction);
    }
}
