//! OpenGL Shaders
//!
//! This module defines the [`Shader`] struct, a linked vertex + fragment program. Active
//! uniforms are looked up once when the program is linked, and [`Shader::uniform`] hands
//! out [`UniformSlot`]s from that table. Values are written through the [`Uniform`] trait.

use std::{fmt, path::Path, sync::Arc};

use fxhash::FxHashMap;
use glam::{Mat4, Vec3};
use glow::HasContext;

use crate::{
    abs::Sampler,
    error::{ResourceError, allocation},
};

/// Compiles a single stage. The caller owns (and must delete) the returned object.
fn compile_stage(
    gl: &glow::Context,
    stage: u32,
    name: &'static str,
    source: &str,
) -> Result<glow::Shader, ResourceError> {
    unsafe {
        let shader = gl.create_shader(stage).map_err(allocation("shader stage"))?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);

        if !gl.get_shader_compile_status(shader) {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            log::error!("{} shader failed to compile:\n{}", name, log);
            return Err(ResourceError::CompileFailure { stage: name, log });
        }

        Ok(shader)
    }
}

/// Strips the `[0]` suffix drivers report for array uniforms.
fn uniform_base_name(name: &str) -> &str {
    name.strip_suffix("[0]").unwrap_or(name)
}

/// A uniform's location, resolved from a [`Shader`]'s reflection table.
#[derive(Clone)]
pub struct UniformSlot {
    program: glow::Program,
    location: glow::UniformLocation,
    gl_type: u32,
}

impl UniformSlot {
    /// The GL type enum of the uniform, e.g. `glow::FLOAT_MAT4`.
    pub fn gl_type(&self) -> u32 {
        self.gl_type
    }
}

impl fmt::Debug for UniformSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniformSlot")
            .field("program", &self.program.0)
            .field("location", &self.location.0)
            .field("gl_type", &self.gl_type)
            .finish()
    }
}

/// Represents a value that can be written to a uniform.
///
/// The owning program is bound before [`Uniform::set_uniform`] is called.
pub trait Uniform {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation);
}

impl Uniform for f32 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe {
            gl.uniform_1_f32(Some(location), *self);
        }
    }
}

impl Uniform for i32 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe {
            gl.uniform_1_i32(Some(location), *self);
        }
    }
}

impl Uniform for Vec3 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe {
            gl.uniform_3_f32(Some(location), self.x, self.y, self.z);
        }
    }
}

impl Uniform for Mat4 {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        unsafe {
            gl.uniform_matrix_4_f32_slice(Some(location), false, self.as_ref());
        }
    }
}

impl Uniform for Sampler<'_> {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        self.texture.bind(self.unit);
        (self.unit as i32).set_uniform(gl, location);
    }
}

impl<T: Uniform> Uniform for &T {
    fn set_uniform(&self, gl: &glow::Context, location: &glow::UniformLocation) {
        (*self).set_uniform(gl, location);
    }
}

/// Represents a linked OpenGL shader program.
pub struct Shader {
    gl: Arc<glow::Context>,
    id: Option<glow::Program>,
    uniforms: FxHashMap<String, UniformSlot>,
}

impl Shader {
    /// Compiles both stages and links them into a program.
    pub fn new(
        gl: &Arc<glow::Context>,
        vert_source: &str,
        frag_source: &str,
    ) -> Result<Self, ResourceError> {
        let vert = compile_stage(gl, glow::VERTEX_SHADER, "Vertex", vert_source)?;
        let frag = match compile_stage(gl, glow::FRAGMENT_SHADER, "Fragment", frag_source) {
            Ok(frag) => frag,
            Err(e) => {
                unsafe { gl.delete_shader(vert) };
                return Err(e);
            }
        };

        unsafe {
            let program = match gl.create_program() {
                Ok(program) => program,
                Err(e) => {
                    gl.delete_shader(vert);
                    gl.delete_shader(frag);
                    return Err(allocation("shader program")(e));
                }
            };

            gl.attach_shader(program, vert);
            gl.attach_shader(program, frag);
            gl.link_program(program);
            gl.detach_shader(program, vert);
            gl.detach_shader(program, frag);
            gl.delete_shader(vert);
            gl.delete_shader(frag);

            if !gl.get_program_link_status(program) {
                let log = gl.get_program_info_log(program);
                gl.delete_program(program);
                log::error!("Shader program failed to link:\n{}", log);
                return Err(ResourceError::LinkFailure(log));
            }

            let uniforms = Self::reflect_uniforms(gl, program);
            log::debug!("Linked shader program with {} active uniforms", uniforms.len());

            Ok(Self {
                gl: Arc::clone(gl),
                id: Some(program),
                uniforms,
            })
        }
    }

    /// Reads both stage sources from disk and builds the program.
    pub fn load(
        gl: &Arc<glow::Context>,
        vert_path: impl AsRef<Path>,
        frag_path: impl AsRef<Path>,
    ) -> Result<Self, ResourceError> {
        let read = |path: &Path| {
            std::fs::read_to_string(path).map_err(|e| ResourceError::not_found(path, e))
        };
        let vert_source = read(vert_path.as_ref())?;
        let frag_source = read(frag_path.as_ref())?;
        Self::new(gl, &vert_source, &frag_source)
    }

    fn reflect_uniforms(gl: &glow::Context, program: glow::Program) -> FxHashMap<String, UniformSlot> {
        let mut uniforms = FxHashMap::default();
        unsafe {
            for index in 0..gl.get_active_uniforms(program) {
                let Some(active) = gl.get_active_uniform(program, index) else {
                    continue;
                };
                let name = uniform_base_name(&active.name);
                // uniforms inside blocks have no location
                if let Some(location) = gl.get_uniform_location(program, name) {
                    uniforms.insert(
                        name.to_string(),
                        UniformSlot {
                            program,
                            location,
                            gl_type: active.utype,
                        },
                    );
                }
            }
        }
        uniforms
    }

    /// Looks up an active uniform by name.
    pub fn uniform(&self, name: &str) -> Result<UniformSlot, ResourceError> {
        self.uniforms
            .get(name)
            .cloned()
            .ok_or_else(|| ResourceError::UnknownUniform(name.to_string()))
    }

    /// Names of all active uniforms.
    pub fn uniform_names(&self) -> impl Iterator<Item = &str> {
        self.uniforms.keys().map(String::as_str)
    }

    /// Binds the program and writes `value` to the uniform at `slot`.
    pub fn set<T: Uniform>(&self, slot: &UniformSlot, value: T) {
        let Some(program) = self.id else {
            log::warn!("Ignoring uniform write to a freed shader");
            return;
        };
        if slot.program != program {
            log::warn!("Ignoring uniform slot that belongs to another program");
            return;
        }
        unsafe {
            self.gl.use_program(Some(program));
        }
        value.set_uniform(&self.gl, &slot.location);
    }

    /// Looks up `name` and writes `value` to it.
    pub fn set_uniform<T: Uniform>(&self, name: &str, value: T) -> Result<(), ResourceError> {
        let slot = self.uniform(name)?;
        self.set(&slot, value);
        Ok(())
    }

    pub(crate) fn program(&self) -> Option<glow::Program> {
        self.id
    }

    pub fn is_live(&self) -> bool {
        self.id.is_some()
    }

    /// Deletes the program. Calling this again does nothing.
    pub fn free(&mut self) {
        if let Some(program) = self.id.take() {
            unsafe {
                self.gl.delete_program(program);
            }
        }
        self.uniforms.clear();
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        self.free();
    }
}
