//! Orbit camera looking at the origin.

use glam::{Mat4, Vec3};
use winit::event::MouseButton;

use crate::input::Input;

/// A camera that orbits the origin, driven by mouse drag and scroll.
///
/// Angles are in degrees. Pitch is clamped short of the poles to avoid a
/// degenerate view basis, and zoom is clamped to [1, 1000].
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    /// Horizontal angle in degrees.
    pub yaw: f32,
    /// Vertical angle in degrees, clamped to [-89, 89].
    pub pitch: f32,
    /// Distance from the origin, clamped to [1, 1000].
    pub zoom: f32,
    /// Degrees of rotation per pixel of mouse drag.
    pub sensitivity: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            yaw: 90.0,
            pitch: 0.0,
            zoom: 5.0,
            sensitivity: 0.3,
        }
    }
}

impl OrbitCamera {
    pub const MIN_PITCH: f32 = -89.0;
    pub const MAX_PITCH: f32 = 89.0;
    pub const MIN_ZOOM: f32 = 1.0;
    pub const MAX_ZOOM: f32 = 1000.0;

    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pitch, clamped to the valid range.
    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(Self::MIN_PITCH, Self::MAX_PITCH);
    }

    /// Set the zoom distance, clamped to the valid range.
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
    }

    /// Update from input: left-drag rotates, scroll zooms.
    ///
    /// Drag is ignored while the pointer is captured by an overlay (UI on
    /// top of the viewport); zooming stays live either way.
    pub fn update(&mut self, input: &Input) {
        if input.mouse_down(MouseButton::Left) && !input.pointer_captured() {
            let delta = input.mouse_delta();
            self.yaw += delta.x * self.sensitivity;
            self.set_pitch(self.pitch - delta.y * self.sensitivity);
        }

        let scroll = input.scroll_delta();
        if scroll.y != 0.0 {
            self.set_zoom(self.zoom - scroll.y);
        }
    }

    /// Camera position from the spherical coordinates.
    pub fn position(&self) -> Vec3 {
        let yaw = self.yaw.to_radians();
        let pitch = self.pitch.to_radians();
        Vec3::new(
            self.zoom * pitch.cos() * yaw.cos(),
            self.zoom * pitch.sin(),
            self.zoom * pitch.cos() * yaw.sin(),
        )
    }

    /// View matrix looking at the origin with +Y up.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), Vec3::ZERO, Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_position_on_z_axis() {
        // yaw 90, pitch 0: the camera sits on +Z at the zoom distance.
        let cam = OrbitCamera::new();
        let pos = cam.position();
        assert!(pos.x.abs() < 1e-4);
        assert!(pos.y.abs() < 1e-4);
        assert!((pos.z - cam.zoom).abs() < 1e-4);
    }

    #[test]
    fn zero_yaw_position_on_x_axis() {
        let mut cam = OrbitCamera::new();
        cam.yaw = 0.0;
        cam.set_zoom(5.0);
        let pos = cam.position();
        assert!((pos - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn position_radius_matches_zoom() {
        let mut cam = OrbitCamera::new();
        cam.yaw = 37.0;
        cam.set_pitch(25.0);
        cam.set_zoom(12.0);
        assert!((cam.position().length() - 12.0).abs() < 1e-3);
    }

    #[test]
    fn pitch_clamps_at_poles() {
        let mut cam = OrbitCamera::new();
        cam.set_pitch(120.0);
        assert_eq!(cam.pitch, OrbitCamera::MAX_PITCH);
        cam.set_pitch(-120.0);
        assert_eq!(cam.pitch, OrbitCamera::MIN_PITCH);
    }

    #[test]
    fn zoom_clamps_to_range() {
        let mut cam = OrbitCamera::new();
        cam.set_zoom(0.25);
        assert_eq!(cam.zoom, OrbitCamera::MIN_ZOOM);
        cam.set_zoom(5000.0);
        assert_eq!(cam.zoom, OrbitCamera::MAX_ZOOM);
    }

    #[test]
    fn top_pitch_looks_mostly_down() {
        let mut cam = OrbitCamera::new();
        cam.set_pitch(89.0);
        let pos = cam.position();
        assert!(pos.y > 0.99 * cam.zoom);
    }
}
