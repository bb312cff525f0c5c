//! Scene state: the audio-reactive objects and the clickable targets.

pub mod mesh;

use glam::{Mat4, Quat, Vec3};

use crate::interaction::{build_targets, InteractiveTarget};
use crate::params::{ReactiveMapping, SceneLayout};

/// Continuous rotation accumulator for the wireframe cube. The step is per
/// frame, not per second; the loop is otherwise memoryless.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spinner {
    pub rotation_x: f32,
    pub rotation_y: f32,
}

impl Spinner {
    pub fn advance(&mut self, step: f32) {
        self.rotation_x += step;
        self.rotation_y += step;
    }
}

/// All mutable visual state the frame loop derives each frame
pub struct SceneState {
    pub layout: SceneLayout,
    pub mapping: ReactiveMapping,

    /// Uniform x/y scale of the reactive cube and cube-line
    pub reactive_scale: f32,

    /// Spin state of the wireframe cube
    pub line_spin: Spinner,

    /// The clickable sphere and torus
    pub targets: [InteractiveTarget; 2],
}

impl SceneState {
    pub fn new(layout: SceneLayout, mapping: ReactiveMapping) -> Self {
        let targets = build_targets(&layout);
        Self {
            layout,
            mapping,
            reactive_scale: 0.0,
            line_spin: Spinner::default(),
            targets,
        }
    }

    /// Per-frame derivation: recompute the reactive scale from the live
    /// audio inputs (no smoothing, abrupt changes expected) and advance the
    /// wireframe spin by its fixed step.
    pub fn update(&mut self, avg_frequency: f32, volume: f32) {
        self.reactive_scale = self.mapping.reactive_scale(avg_frequency, volume);
        self.line_spin.advance(self.mapping.rotation_step);
    }

    /// Model matrix for the solid reactive cube (scale on x/y only)
    pub fn cube_model(&self) -> Mat4 {
        Mat4::from_translation(Vec3::from_array(self.layout.cube_position))
            * Mat4::from_scale(Vec3::new(self.reactive_scale, self.reactive_scale, 1.0))
    }

    /// Model matrix for the spinning wireframe cube
    pub fn line_model(&self) -> Mat4 {
        let rotation = Quat::from_rotation_x(self.line_spin.rotation_x)
            * Quat::from_rotation_y(self.line_spin.rotation_y);
        Mat4::from_translation(Vec3::from_array(self.layout.line_position))
            * Mat4::from_quat(rotation)
            * Mat4::from_scale(Vec3::new(self.reactive_scale, self.reactive_scale, 1.0))
    }

    /// Model matrices for the clickable targets (translation only)
    pub fn target_model(&self, index: usize) -> Mat4 {
        Mat4::from_translation(self.targets[index].center)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> SceneState {
        SceneState::new(SceneLayout::default(), ReactiveMapping::default())
    }

    #[test]
    fn test_scale_tracks_inputs_without_smoothing() {
        let mut scene = scene();

        scene.update(128.0, 1.0);
        assert_eq!(scene.reactive_scale, 5.0);

        // Abrupt drop is reflected immediately
        scene.update(0.0, 1.0);
        assert_eq!(scene.reactive_scale, 0.0);

        scene.update(255.0, 20.0);
        assert!((scene.reactive_scale - 255.0 / 128.0 * 20.0 * 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_rotation_accumulates_per_frame() {
        let mut scene = scene();

        for _ in 0..100 {
            scene.update(0.0, 0.0);
        }

        // Fixed +0.01 per frame regardless of elapsed wall time
        assert!((scene.line_spin.rotation_x - 1.0).abs() < 1e-4);
        assert!((scene.line_spin.rotation_y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_cube_model_scales_xy_only() {
        let mut scene = scene();
        scene.update(128.0, 1.0); // scale 5

        let model = scene.cube_model();
        let x = model.transform_vector3(Vec3::X);
        let y = model.transform_vector3(Vec3::Y);
        let z = model.transform_vector3(Vec3::Z);

        assert!((x.length() - 5.0).abs() < 1e-4);
        assert!((y.length() - 5.0).abs() < 1e-4);
        assert!((z.length() - 1.0).abs() < 1e-4);

        // Translation part matches the layout
        let origin = model.transform_point3(Vec3::ZERO);
        assert_eq!(origin, Vec3::new(2.5, 5.0, -5.0));
    }

    #[test]
    fn test_targets_sit_at_layout_positions() {
        let scene = scene();
        let sphere = scene.target_model(0).transform_point3(Vec3::ZERO);
        let torus = scene.target_model(1).transform_point3(Vec3::ZERO);

        assert_eq!(sphere, Vec3::new(-2.0, 1.5, 0.0));
        assert_eq!(torus, Vec3::new(2.0, 1.5, 0.0));
    }
}
