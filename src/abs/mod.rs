//! This module contains the thin layer over OpenGL used by the renderer: context setup,
//! geometry, textures and shaders.

pub mod app;
pub mod mesh;
pub mod shader;
pub mod texture;

pub use app::*;
pub use mesh::*;
pub use shader::*;
pub use texture::*;
