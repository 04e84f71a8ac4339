//! Error types.
//!
//! [`ResourceError`] covers everything that can go wrong while creating GPU resources
//! (geometry, textures, shaders). [`ContextError`] covers window and GL context setup, and
//! [`ConfigError`] covers reading the demo configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while creating or using GPU resources.
#[derive(Error, Debug)]
pub enum ResourceError {
    /// A file could not be opened or read.
    #[error("{}: {source}", .path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input data (mesh text, image bytes) could not be parsed.
    #[error("parse failure in {context}: {message}")]
    ParseFailure { context: String, message: String },

    /// A shader stage failed to compile. `log` holds the driver's info log.
    #[error("{stage} shader failed to compile:\n{log}")]
    CompileFailure { stage: &'static str, log: String },

    /// A shader program failed to link. Holds the driver's info log.
    #[error("shader program failed to link:\n{0}")]
    LinkFailure(String),

    /// Data is well formed but not something this renderer handles
    /// (channel counts outside 1-4, non-triangular faces, ...).
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The driver refused to create an object.
    #[error("failed to allocate {kind}: {message}")]
    Allocation { kind: &'static str, message: String },

    /// The shader has no active uniform with this name.
    #[error("no active uniform named `{0}`")]
    UnknownUniform(String),
}

impl ResourceError {
    pub(crate) fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseFailure {
            context: context.into(),
            message: message.into(),
        }
    }

    pub(crate) fn not_found(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::NotFound {
            path: path.into(),
            source,
        }
    }
}

/// Builds the error for a failed `create_*` call, for use with `map_err`.
pub(crate) fn allocation(kind: &'static str) -> impl FnOnce(String) -> ResourceError {
    move |message| ResourceError::Allocation { kind, message }
}

/// Errors produced while setting up the window and GL context.
#[derive(Error, Debug)]
pub enum ContextError {
    /// SDL or one of its subsystems failed to initialize.
    #[error("SDL error: {0}")]
    Sdl(String),

    /// The window could not be created.
    #[error("failed to build window: {0}")]
    Window(#[from] sdl2::video::WindowBuildError),

    /// The OpenGL context could not be created or made current.
    #[error("OpenGL context error: {0}")]
    GlContext(String),
}

/// Errors produced while loading the demo configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}
