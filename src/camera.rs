use glam::{DMat4, DVec3};
use std::f64::consts::{FRAC_PI_4, PI};

const FOV_Y: f64 = 60.0 * PI / 180.0;
const DRAG_SENSITIVITY: f64 = 0.05;
const ZOOM_STEP: f64 = 0.5;
const MIN_DISTANCE: f64 = 2.0;
const MAX_DISTANCE: f64 = 30.0;
// Keeps the polar angle away from the poles so the view never flips.
const POLAR_MARGIN: f64 = 0.05;

/// Orbit camera around the scene origin: azimuth around the vertical axis,
/// polar angle from the vertical axis, and eye distance.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    azimuth: f64,
    polar: f64,
    distance: f64,
    target: DVec3,
}

impl OrbitCamera {
    /// Starts at the equivalent of eye position (5, 5, 5) looking at the
    /// origin.
    pub fn new() -> Self {
        let distance = 75.0_f64.sqrt();
        Self {
            azimuth: FRAC_PI_4,
            polar: (5.0 / distance).acos(),
            distance,
            target: DVec3::ZERO,
        }
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn azimuth(&self) -> f64 {
        self.azimuth
    }

    pub fn polar(&self) -> f64 {
        self.polar
    }

    /// Apply a pointer drag delta (in terminal cells).
    pub fn orbit(&mut self, dx: f64, dy: f64) {
        self.azimuth -= dx * DRAG_SENSITIVITY;
        self.polar = (self.polar - dy * DRAG_SENSITIVITY)
            .clamp(POLAR_MARGIN, PI - POLAR_MARGIN);
    }

    /// Apply scroll steps; positive steps move the eye closer.
    pub fn zoom(&mut self, steps: f64) {
        self.distance = (self.distance - steps * ZOOM_STEP).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    pub fn eye(&self) -> DVec3 {
        self.target
            + self.distance
                * DVec3::new(
                    self.polar.sin() * self.azimuth.sin(),
                    self.polar.cos(),
                    self.polar.sin() * self.azimuth.cos(),
                )
    }

    pub fn view_projection(&self, aspect: f64) -> DMat4 {
        let projection = DMat4::perspective_rh(FOV_Y, aspect.max(1e-6), 0.1, 100.0);
        let view = DMat4::look_at_rh(self.eye(), self.target, DVec3::Y);
        projection * view
    }

    /// Project a world point to normalized device coordinates, returning
    /// (x, y, depth). Points at or behind the eye plane are culled.
    pub fn project(view_projection: &DMat4, point: DVec3) -> Option<(f64, f64, f64)> {
        let clip = *view_projection * point.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        Some((clip.x / clip.w, clip.y / clip.w, clip.w))
    }

    /// Apparent NDC radius of a sphere of radius `r` at view depth `depth`.
    pub fn apparent_radius(r: f64, depth: f64) -> f64 {
        r / ((FOV_Y / 2.0).tan() * depth)
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_eye_matches_reference_position() {
        let eye = OrbitCamera::new().eye();
        assert!((eye - DVec3::new(5.0, 5.0, 5.0)).length() < 1e-9);
    }

    #[test]
    fn polar_angle_never_reaches_the_poles() {
        let mut camera = OrbitCamera::new();
        camera.orbit(0.0, 10_000.0);
        assert!(camera.polar() >= POLAR_MARGIN);
        camera.orbit(0.0, -10_000.0);
        assert!(camera.polar() <= PI - POLAR_MARGIN);
    }

    #[test]
    fn zoom_distance_is_clamped() {
        let mut camera = OrbitCamera::new();
        camera.zoom(1_000.0);
        assert_eq!(camera.distance(), MIN_DISTANCE);
        camera.zoom(-1_000.0);
        assert_eq!(camera.distance(), MAX_DISTANCE);
    }

    #[test]
    fn target_projects_to_screen_center() {
        let camera = OrbitCamera::new();
        let vp = camera.view_projection(1.0);
        let (x, y, depth) = OrbitCamera::project(&vp, DVec3::ZERO).unwrap();
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-9);
        assert!((depth - camera.distance()).abs() < 1e-6);
    }

    #[test]
    fn points_behind_the_eye_are_culled() {
        let camera = OrbitCamera::new();
        let vp = camera.view_projection(1.0);
        let behind = camera.eye() * 2.0;
        assert!(OrbitCamera::project(&vp, behind).is_none());
    }

    #[test]
    fn dragging_right_changes_azimuth_only() {
        let mut camera = OrbitCamera::new();
        let polar = camera.polar();
        camera.orbit(3.0, 0.0);
        assert_ne!(camera.azimuth(), FRAC_PI_4);
        assert_eq!(camera.polar(), polar);
    }
}
