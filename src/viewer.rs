use std::time::Instant;

use crate::camera::OrbitCamera;
use crate::scene::{self, MoleculeVariant, SceneDescription};

/// Interactive state of the 3D panel: the active structure, the orbit
/// camera, and pointer input accumulated between frame ticks.
///
/// Independent of the chat session; switching structures touches no
/// conversation state.
pub struct Viewer {
    variant: MoleculeVariant,
    scene: SceneDescription,
    pub camera: OrbitCamera,
    mounted_at: Instant,
    drag_anchor: Option<(u16, u16)>,
    pending_drag: (f64, f64),
    pending_scroll: f64,
}

impl Viewer {
    pub fn new() -> Self {
        let variant = MoleculeVariant::default();
        Self {
            variant,
            scene: scene::build(variant),
            camera: OrbitCamera::new(),
            mounted_at: Instant::now(),
            drag_anchor: None,
            pending_drag: (0.0, 0.0),
            pending_scroll: 0.0,
        }
    }

    pub fn variant(&self) -> MoleculeVariant {
        self.variant
    }

    pub fn scene(&self) -> &SceneDescription {
        &self.scene
    }

    /// Seconds since the current structure was mounted.
    pub fn elapsed(&self) -> f64 {
        self.mounted_at.elapsed().as_secs_f64()
    }

    /// Replace the active structure. The animation clock restarts; the
    /// camera keeps its user-driven orbit.
    pub fn select(&mut self, variant: MoleculeVariant) {
        if variant == self.variant {
            return;
        }
        self.variant = variant;
        self.scene = scene::build(variant);
        self.mounted_at = Instant::now();
    }

    pub fn select_next(&mut self) {
        let all = MoleculeVariant::all();
        let idx = all.iter().position(|v| *v == self.variant).unwrap_or(0);
        self.select(all[(idx + 1) % all.len()]);
    }

    pub fn select_prev(&mut self) {
        let all = MoleculeVariant::all();
        let idx = all.iter().position(|v| *v == self.variant).unwrap_or(0);
        self.select(all[(idx + all.len() - 1) % all.len()]);
    }

    // Pointer input. Deltas accumulate here and are applied to the camera
    // on the next tick.

    pub fn pointer_down(&mut self, column: u16, row: u16) {
        self.drag_anchor = Some((column, row));
    }

    pub fn pointer_drag(&mut self, column: u16, row: u16) {
        if let Some((ax, ay)) = self.drag_anchor {
            self.pending_drag.0 += column as f64 - ax as f64;
            self.pending_drag.1 += row as f64 - ay as f64;
        }
        self.drag_anchor = Some((column, row));
    }

    pub fn pointer_up(&mut self) {
        self.drag_anchor = None;
    }

    pub fn pointer_scroll(&mut self, steps: f64) {
        self.pending_scroll += steps;
    }

    /// Per-frame update: fold accumulated pointer input into the camera.
    /// Rotation angles are not advanced here; they are derived from
    /// `elapsed()` at render time.
    pub fn tick(&mut self) {
        let (dx, dy) = self.pending_drag;
        if dx != 0.0 || dy != 0.0 {
            self.camera.orbit(dx, dy);
            self.pending_drag = (0.0, 0.0);
        }
        if self.pending_scroll != 0.0 {
            self.camera.zoom(self.pending_scroll);
            self.pending_scroll = 0.0;
        }
    }
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_dna() {
        let viewer = Viewer::new();
        assert_eq!(viewer.variant(), MoleculeVariant::Dna);
        assert_eq!(viewer.scene(), &scene::build(MoleculeVariant::Dna));
    }

    #[test]
    fn selecting_protein_then_cell_leaves_only_cell_primitives() {
        let mut viewer = Viewer::new();
        viewer.select(MoleculeVariant::Protein);
        viewer.select(MoleculeVariant::Cell);
        assert_eq!(viewer.variant(), MoleculeVariant::Cell);
        assert_eq!(viewer.scene(), &scene::build(MoleculeVariant::Cell));
    }

    #[test]
    fn selection_cycles_through_all_variants() {
        let mut viewer = Viewer::new();
        viewer.select_next();
        assert_eq!(viewer.variant(), MoleculeVariant::Protein);
        viewer.select_next();
        assert_eq!(viewer.variant(), MoleculeVariant::Cell);
        viewer.select_next();
        assert_eq!(viewer.variant(), MoleculeVariant::Dna);
        viewer.select_prev();
        assert_eq!(viewer.variant(), MoleculeVariant::Cell);
    }

    #[test]
    fn drag_deltas_apply_on_tick_and_reset() {
        let mut viewer = Viewer::new();
        let azimuth = viewer.camera.azimuth();

        viewer.pointer_down(10, 10);
        viewer.pointer_drag(14, 10);
        assert_eq!(viewer.camera.azimuth(), azimuth);

        viewer.tick();
        let turned = viewer.camera.azimuth();
        assert_ne!(turned, azimuth);

        // Nothing left to apply.
        viewer.tick();
        assert_eq!(viewer.camera.azimuth(), turned);
    }

    #[test]
    fn scroll_zooms_on_tick() {
        let mut viewer = Viewer::new();
        let distance = viewer.camera.distance();
        viewer.pointer_scroll(2.0);
        viewer.tick();
        assert!(viewer.camera.distance() < distance);
    }

    #[test]
    fn drag_without_press_is_still_tracked_from_first_position() {
        let mut viewer = Viewer::new();
        viewer.pointer_drag(5, 5);
        viewer.pointer_drag(8, 5);
        viewer.tick();
        assert_ne!(viewer.camera.azimuth(), OrbitCamera::new().azimuth());
    }
}
