//! Geometry management module.
//!
//! This module defines the [`Geometry`] struct for managing mesh data on the GPU side and the
//! fixed [`Vertex`] layout every geometry uses.

use std::{mem::offset_of, path::Path, sync::Arc};

use glow::HasContext;

use crate::{
    abs::Shader,
    error::{ResourceError, allocation},
    obj::{MeshData, ObjModel},
};

/// Describes one vertex attribute: shader slot, float component count and byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub slot: u32,
    pub components: i32,
    pub offset: usize,
}

/// The vertex record uploaded for every geometry: 14 tightly packed floats.
///
/// Plain arrays rather than `glam` vectors, since `Vec4` is 16-byte aligned and would leave
/// padding after `uv` that ends up in the uploaded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct Vertex {
    pub position: [f32; 4],
    pub color: [f32; 4],
    pub uv: [f32; 2],
    pub normal: [f32; 4],
}

impl Vertex {
    /// Attribute slots 0-3: position, color, uv, normal.
    pub const ATTRIBUTES: [VertexAttribute; 4] = [
        VertexAttribute {
            slot: 0,
            components: 4,
            offset: offset_of!(Vertex, position),
        },
        VertexAttribute {
            slot: 1,
            components: 4,
            offset: offset_of!(Vertex, color),
        },
        VertexAttribute {
            slot: 2,
            components: 2,
            offset: offset_of!(Vertex, uv),
        },
        VertexAttribute {
            slot: 3,
            components: 4,
            offset: offset_of!(Vertex, normal),
        },
    ];

    /// Sets up the vertex attribute pointers for the currently bound vertex array.
    fn vertex_attribs(gl: &glow::Context) {
        let stride = std::mem::size_of::<Vertex>() as i32;
        unsafe {
            for attribute in Self::ATTRIBUTES {
                gl.enable_vertex_attrib_array(attribute.slot);
                gl.vertex_attrib_pointer_f32(
                    attribute.slot,
                    attribute.components,
                    glow::FLOAT,
                    false,
                    stride,
                    attribute.offset as i32,
                );
            }
        }
    }
}

/// Represents a mesh stored on the GPU side.
///
/// The handles are `None` once the geometry has been freed.
pub struct Geometry {
    gl: Arc<glow::Context>,
    vao: Option<glow::VertexArray>,
    vbo: Option<glow::Buffer>,
    ibo: Option<glow::Buffer>,
    index_count: usize,
}

impl Geometry {
    /// Uploads the given vertex and index data. Indices are not validated.
    pub fn new(
        gl: &Arc<glow::Context>,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> Result<Self, ResourceError> {
        unsafe {
            let vao = gl.create_vertex_array().map_err(allocation("vertex array"))?;
            let vbo = match gl.create_buffer() {
                Ok(vbo) => vbo,
                Err(e) => {
                    gl.delete_vertex_array(vao);
                    return Err(allocation("vertex buffer")(e));
                }
            };
            let ibo = match gl.create_buffer() {
                Ok(ibo) => ibo,
                Err(e) => {
                    gl.delete_buffer(vbo);
                    gl.delete_vertex_array(vao);
                    return Err(allocation("index buffer")(e));
                }
            };

            gl.bind_vertex_array(Some(vao));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                std::slice::from_raw_parts(
                    vertices.as_ptr() as *const u8,
                    std::mem::size_of_val(vertices),
                ),
                glow::STATIC_DRAW,
            );

            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                std::slice::from_raw_parts(
                    indices.as_ptr() as *const u8,
                    std::mem::size_of_val(indices),
                ),
                glow::STATIC_DRAW,
            );

            Vertex::vertex_attribs(gl);

            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);

            Ok(Self {
                gl: Arc::clone(gl),
                vao: Some(vao),
                vbo: Some(vbo),
                ibo: Some(ibo),
                index_count: indices.len(),
            })
        }
    }

    /// Uploads CPU-side mesh data.
    pub fn from_mesh(gl: &Arc<glow::Context>, mesh: &MeshData) -> Result<Self, ResourceError> {
        Self::new(gl, &mesh.vertices, &mesh.indices)
    }

    /// Loads a triangulated Wavefront OBJ file.
    pub fn load(gl: &Arc<glow::Context>, path: impl AsRef<Path>) -> Result<Self, ResourceError> {
        let path = path.as_ref();
        let source =
            std::fs::read_to_string(path).map_err(|e| ResourceError::not_found(path, e))?;
        let model: ObjModel = source.parse().map_err(|e| match e {
            ResourceError::ParseFailure { context, message } => ResourceError::ParseFailure {
                context: format!("{} {}", path.display(), context),
                message,
            },
            other => other,
        })?;
        let mesh = MeshData::from_obj(&model)?;

        log::debug!(
            "Loaded {} ({} triangles)",
            path.display(),
            mesh.indices.len() / 3
        );
        Self::from_mesh(gl, &mesh)
    }

    /// Draws the geometry as an indexed triangle list with the given shader.
    pub fn draw(&self, shader: &Shader) {
        let (Some(vao), Some(program)) = (self.vao, shader.program()) else {
            log::warn!("Skipping draw of a freed geometry or shader");
            return;
        };
        unsafe {
            self.gl.use_program(Some(program));
            self.gl.bind_vertex_array(Some(vao));
            self.gl.draw_elements(
                glow::TRIANGLES,
                self.index_count as i32,
                glow::UNSIGNED_INT,
                0,
            );
            self.gl.bind_vertex_array(None);
        }
    }

    /// Returns the amount of indices used in the geometry.
    pub fn index_count(&self) -> usize {
        self.index_count
    }

    /// Returns `true` until the geometry is freed.
    pub fn is_live(&self) -> bool {
        self.vao.is_some() && self.vbo.is_some() && self.ibo.is_some()
    }

    /// Releases the GPU objects. Calling this again does nothing.
    pub fn free(&mut self) {
        unsafe {
            if let Some(vbo) = self.vbo.take() {
                self.gl.delete_buffer(vbo);
            }
            if let Some(ibo) = self.ibo.take() {
                self.gl.delete_buffer(ibo);
            }
            if let Some(vao) = self.vao.take() {
                self.gl.delete_vertex_array(vao);
            }
        }
        self.index_count = 0;
    }
}

impl Drop for Geometry {
    fn drop(&mut self) {
        self.free();
    }
}
