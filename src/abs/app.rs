//! SDL2 and OpenGL context management.
//!
//! This module defines the [`Context`] struct which encapsulates the SDL2 window, the OpenGL
//! context, the keyboard state and the frame clock.

use std::{sync::Arc, time::Instant};

use glam::Vec3;
use glow::HasContext;
use sdl2::event::{Event, WindowEvent};

use crate::{error::ContextError, input::KeyboardState};

/// Seconds since creation or since the last [`FrameClock::reset`].
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    start: Instant,
    offset: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: 0.0,
        }
    }

    pub fn time(&self) -> f32 {
        self.time_at(Instant::now())
    }

    fn time_at(&self, now: Instant) -> f32 {
        self.offset + now.saturating_duration_since(self.start).as_secs_f32()
    }

    /// Makes the clock read `value` now and keep counting from there.
    pub fn reset(&mut self, value: f32) {
        self.start = Instant::now();
        self.offset = value;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

fn on_debug_message(_source: u32, _kind: u32, id: u32, severity: u32, message: &str) {
    match severity {
        glow::DEBUG_SEVERITY_HIGH => log::error!(target: "gl", "[{}] {}", id, message),
        glow::DEBUG_SEVERITY_MEDIUM => log::warn!(target: "gl", "[{}] {}", id, message),
        glow::DEBUG_SEVERITY_LOW => log::info!(target: "gl", "[{}] {}", id, message),
        _ => log::debug!(target: "gl", "[{}] {}", id, message),
    }
}

/// The [`Context`] struct encapsulates the SDL2 window and OpenGL context.
///
/// GPU resources created from [`Context::gl`] must be freed before [`Context::term`].
pub struct Context {
    pub sdl: sdl2::Sdl,
    pub video_subsystem: sdl2::VideoSubsystem,
    pub window: sdl2::video::Window,
    pub gl_context: sdl2::video::GLContext,
    pub gl: Arc<glow::Context>,
    pub event_pump: sdl2::EventPump,
    keyboard: KeyboardState,
    clock: FrameClock,
    should_close: bool,
}

impl Context {
    /// Opens a window with an OpenGL 3.3 core context and sets the default pipeline state:
    /// back-face culling with counter-clockwise front faces, depth testing, and a dark gray
    /// clear color.
    ///
    /// Depth testing is on so closed meshes draw correctly; [`Context::clear`] resets the
    /// depth buffer along with the color buffer each frame.
    pub fn init(title: &str, width: u32, height: u32) -> Result<Self, ContextError> {
        Self::build(title, width, height, false)
    }

    /// Same as [`Context::init`] but the window is never shown.
    pub fn init_hidden(title: &str, width: u32, height: u32) -> Result<Self, ContextError> {
        Self::build(title, width, height, true)
    }

    fn build(title: &str, width: u32, height: u32, hidden: bool) -> Result<Self, ContextError> {
        let sdl = sdl2::init().map_err(ContextError::Sdl)?;
        let video_subsystem = sdl.video().map_err(ContextError::Sdl)?;
        let gl_attr = video_subsystem.gl_attr();
        gl_attr.set_context_profile(sdl2::video::GLProfile::Core);
        gl_attr.set_context_version(3, 3);
        gl_attr.set_context_flags().debug().set();

        let mut builder = video_subsystem.window(title, width, height);
        builder.opengl().resizable();
        if hidden {
            builder.hidden();
        }
        let window = builder.build()?;

        let gl_context = window
            .gl_create_context()
            .map_err(ContextError::GlContext)?;
        window
            .gl_make_current(&gl_context)
            .map_err(ContextError::GlContext)?;
        let mut gl = unsafe {
            glow::Context::from_loader_function(|s| {
                video_subsystem.gl_get_proc_address(s) as *const _
            })
        };
        let event_pump = sdl.event_pump().map_err(ContextError::Sdl)?;

        unsafe {
            log::info!("OpenGL Version: {}", gl.get_parameter_string(glow::VERSION));
            log::info!("Renderer: {}", gl.get_parameter_string(glow::RENDERER));
            log::info!("Vendor: {}", gl.get_parameter_string(glow::VENDOR));
            log::info!(
                "GLSL: {}",
                gl.get_parameter_string(glow::SHADING_LANGUAGE_VERSION)
            );

            if gl.supports_debug() {
                gl.enable(glow::DEBUG_OUTPUT);
                gl.enable(glow::DEBUG_OUTPUT_SYNCHRONOUS);
                gl.debug_message_callback(on_debug_message);
                gl.debug_message_control(
                    glow::DONT_CARE,
                    glow::DONT_CARE,
                    glow::DEBUG_SEVERITY_NOTIFICATION,
                    &[],
                    false,
                );
            } else {
                log::warn!("Driver has no debug output support; GL errors will not be logged");
            }

            gl.enable(glow::CULL_FACE);
            gl.cull_face(glow::BACK);
            gl.front_face(glow::CCW);
            gl.enable(glow::DEPTH_TEST);
            gl.clear_color(0.25, 0.25, 0.25, 1.0);
        }

        Ok(Self {
            sdl,
            video_subsystem,
            window,
            gl_context,
            gl: Arc::new(gl),
            event_pump,
            keyboard: KeyboardState::default(),
            clock: FrameClock::new(),
            should_close: false,
        })
    }

    /// Advances one frame: processes pending events, presents the previous frame, and
    /// requests closure while Escape or Enter is held.
    pub fn tick(&mut self) {
        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => self.should_close = true,
                Event::Window {
                    win_event: WindowEvent::Resized(width, height),
                    ..
                } => unsafe {
                    self.gl.viewport(0, 0, width, height);
                },
                Event::KeyDown {
                    keycode: Some(keycode),
                    ..
                } => self.keyboard.press(keycode),
                Event::KeyUp {
                    keycode: Some(keycode),
                    ..
                } => self.keyboard.release(keycode),
                _ => {}
            }
        }

        self.window.gl_swap_window();

        if self.keyboard.wants_close() {
            self.should_close = true;
        }
    }

    /// Clears the color and depth buffers.
    pub fn clear(&self) {
        unsafe {
            self.gl
                .clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    pub fn should_close(&self) -> bool {
        self.should_close
    }

    pub fn request_close(&mut self) {
        self.should_close = true;
    }

    /// Seconds since init or the last [`Context::reset_time`].
    pub fn time(&self) -> f32 {
        self.clock.time()
    }

    pub fn reset_time(&mut self, value: f32) {
        self.clock.reset(value);
    }

    pub fn keyboard(&self) -> &KeyboardState {
        &self.keyboard
    }

    /// See [`KeyboardState::input_direction`].
    pub fn input_direction(&self) -> Vec3 {
        self.keyboard.input_direction()
    }

    /// See [`KeyboardState::rotate_axis`].
    pub fn rotate_axis(&self) -> Vec3 {
        self.keyboard.rotate_axis()
    }

    /// Destroys the window and shuts SDL down. Consuming `self` rules out a second call.
    pub fn term(self) {
        log::info!("Closing window after {:.1}s", self.time());
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn clock_counts_from_reset_value() {
        let mut clock = FrameClock::new();
        clock.reset(10.0);
        let later = clock.start + Duration::from_millis(1500);
        assert!((clock.time_at(later) - 11.5).abs() < 1e-4);
        assert!(clock.time() >= 10.0);
    }

    #[test]
    fn clock_starts_near_zero() {
        let clock = FrameClock::new();
        assert_eq!(clock.time_at(clock.start), 0.0);
        assert!(clock.time() < 1.0);
    }
}
