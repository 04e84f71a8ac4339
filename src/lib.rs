//! A small OpenGL renderer: an SDL2 window with a GL context, and explicitly owned
//! geometry, texture and shader objects built on `glow`.
//!
//! Resources hold an `Arc<glow::Context>` and are released by `free` (or on drop). They must
//! all be gone before [`abs::Context::term`].

pub mod abs;
pub mod config;
pub mod error;
pub mod input;
pub mod light;
pub mod logging;
pub mod obj;
