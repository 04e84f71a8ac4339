//! Keyboard state and the demo's key bindings.

use std::collections::HashSet;

use glam::Vec3;
use sdl2::keyboard::Keycode;

/// Distance moved per frame while a movement key is held.
pub const MOVE_STEP: f32 = 0.001;

/// The keys currently held down.
#[derive(Default, Debug, Clone)]
pub struct KeyboardState {
    pub down: HashSet<Keycode>,
}

impl KeyboardState {
    /// Marks a key as held.
    pub fn press(&mut self, key: Keycode) {
        self.down.insert(key);
    }

    /// Marks a key as released.
    pub fn release(&mut self, key: Keycode) {
        self.down.remove(&key);
    }

    /// Returns `true` while the key is held.
    pub fn is_down(&self, key: Keycode) -> bool {
        self.down.contains(&key)
    }

    /// Escape and Enter both close the window.
    pub fn wants_close(&self) -> bool {
        self.is_down(Keycode::Escape) || self.is_down(Keycode::Return)
    }

    /// Movement from WASD. Only one key counts, checked in the order W, S, A, D.
    pub fn input_direction(&self) -> Vec3 {
        if self.is_down(Keycode::W) {
            Vec3::new(0.0, MOVE_STEP, 0.0)
        } else if self.is_down(Keycode::S) {
            Vec3::new(0.0, -MOVE_STEP, 0.0)
        } else if self.is_down(Keycode::A) {
            Vec3::new(-MOVE_STEP, 0.0, 0.0)
        } else if self.is_down(Keycode::D) {
            Vec3::new(MOVE_STEP, 0.0, 0.0)
        } else {
            Vec3::ZERO
        }
    }

    /// Rotation axis from the arrow keys, checked in the order Up, Down, Left, Right.
    ///
    /// With no arrow held this returns `(0, MOVE_STEP, 0)`, so the model keeps spinning
    /// slowly around +Y.
    pub fn rotate_axis(&self) -> Vec3 {
        if self.is_down(Keycode::Up) {
            Vec3::X
        } else if self.is_down(Keycode::Down) {
            Vec3::NEG_X
        } else if self.is_down(Keycode::Left) {
            Vec3::NEG_Y
        } else if self.is_down(Keycode::Right) {
            Vec3::Y
        } else {
            Vec3::new(0.0, MOVE_STEP, 0.0)
        }
    }
}
