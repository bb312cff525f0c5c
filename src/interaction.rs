//! Click interaction: ray picking against the clickable targets and the
//! volume/illumination side effects.
//!
//! Both targets mutate the single global playback volume (the sphere
//! raises it, the torus lowers it). That shared coupling is intentional
//! and mirrored exactly from the product behavior.

use glam::Vec3;
use rand::Rng;

use crate::audio::AudioControl;
use crate::params::SceneLayout;

/// The closed set of clickable objects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Sphere,
    Torus,
}

/// One clickable object: a bounding-sphere collider plus mutable visual
/// state. Created at scene setup, never destroyed.
#[derive(Debug, Clone)]
pub struct InteractiveTarget {
    pub kind: TargetKind,
    pub center: Vec3,
    pub pick_radius: f32,
    pub illuminated: bool,
    pub color: [f32; 3],
}

impl InteractiveTarget {
    /// Emissive term: full white while illuminated, full black otherwise
    pub fn emissive(&self) -> [f32; 3] {
        if self.illuminated {
            [1.0, 1.0, 1.0]
        } else {
            [0.0, 0.0, 0.0]
        }
    }
}

/// Build the two clickable targets from the scene layout
pub fn build_targets(layout: &SceneLayout) -> [InteractiveTarget; 2] {
    [
        InteractiveTarget {
            kind: TargetKind::Sphere,
            center: Vec3::from_array(layout.sphere_target_center),
            pick_radius: layout.sphere_target_radius,
            illuminated: false,
            color: [1.0, 1.0, 1.0],
        },
        InteractiveTarget {
            kind: TargetKind::Torus,
            center: Vec3::from_array(layout.torus_target_center),
            pick_radius: layout.torus_pick_radius(),
            illuminated: false,
            color: [0.0, 0.0, 1.0],
        },
    ]
}

/// Resolve a click: nearest-hit intersection, then toggle illumination,
/// recolor, and nudge the shared volume. A miss leaves every piece of
/// state untouched.
///
/// Returns the kind of the target hit, if any.
pub fn handle_click(
    ray_origin: Vec3,
    ray_dir: Vec3,
    targets: &mut [InteractiveTarget],
    audio: &mut AudioControl,
    rng: &mut impl Rng,
) -> Option<TargetKind> {
    let hit = nearest_hit(ray_origin, ray_dir, targets)?;
    let target = &mut targets[hit];

    target.illuminated = !target.illuminated;

    match target.kind {
        TargetKind::Sphere => {
            target.color = random_full_color(rng);
            audio.raise_volume();
        }
        TargetKind::Torus => {
            target.color = random_red_biased_color(rng);
            audio.lower_volume();
        }
    }

    Some(target.kind)
}

/// Index of the closest intersected target along the ray, if any
fn nearest_hit(origin: Vec3, dir: Vec3, targets: &[InteractiveTarget]) -> Option<usize> {
    targets
        .iter()
        .enumerate()
        .filter_map(|(i, t)| ray_sphere(origin, dir, t.center, t.pick_radius).map(|d| (i, d)))
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| i)
}

/// Ray/sphere intersection: distance to the nearest intersection in front
/// of the origin, or None.
pub fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let a = dir.dot(dir);
    let half_b = oc.dot(dir);
    let c = oc.dot(oc) - radius * radius;

    let discriminant = half_b * half_b - a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    let near = (-half_b - sqrt_d) / a;
    if near > 0.0 {
        return Some(near);
    }
    let far = (-half_b + sqrt_d) / a;
    (far > 0.0).then_some(far)
}

/// Uniform color from the full 24-bit space (sphere identity)
pub fn random_full_color(rng: &mut impl Rng) -> [f32; 3] {
    rgb_from_u32(rng.gen_range(0..0x100_0000))
}

/// Color from the red-biased subrange below 0xFF0000 (torus identity):
/// red channel never saturates, greens and blues stay incidental.
pub fn random_red_biased_color(rng: &mut impl Rng) -> [f32; 3] {
    rgb_from_u32(rng.gen_range(0..0xFF_0000))
}

/// Unpack a 0xRRGGBB integer into normalized RGB
pub fn rgb_from_u32(packed: u32) -> [f32; 3] {
    [
        ((packed >> 16) & 0xFF) as f32 / 255.0,
        ((packed >> 8) & 0xFF) as f32 / 255.0,
        (packed & 0xFF) as f32 / 255.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::VolumePolicy;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup() -> ([InteractiveTarget; 2], AudioControl, StdRng) {
        (
            build_targets(&SceneLayout::default()),
            AudioControl::new(VolumePolicy::default()),
            StdRng::seed_from_u64(7),
        )
    }

    /// Ray from the camera position straight at a target center
    fn ray_at(center: Vec3) -> (Vec3, Vec3) {
        let origin = Vec3::new(0.0, 1.5, 4.0);
        (origin, (center - origin).normalize())
    }

    #[test]
    fn test_sphere_click_toggles_and_raises_volume() {
        let (mut targets, mut audio, mut rng) = setup();
        let (origin, dir) = ray_at(targets[0].center);

        let hit = handle_click(origin, dir, &mut targets, &mut audio, &mut rng);
        assert_eq!(hit, Some(TargetKind::Sphere));
        assert!(targets[0].illuminated);
        assert_eq!(targets[0].emissive(), [1.0, 1.0, 1.0]);
        assert_eq!(audio.volume(), 2.5);

        // Second click toggles illumination back off
        let hit = handle_click(origin, dir, &mut targets, &mut audio, &mut rng);
        assert_eq!(hit, Some(TargetKind::Sphere));
        assert!(!targets[0].illuminated);
        assert_eq!(targets[0].emissive(), [0.0, 0.0, 0.0]);
        assert_eq!(audio.volume(), 4.0);
    }

    #[test]
    fn test_volume_clamps_at_upper_bound() {
        let (mut targets, mut audio, mut rng) = setup();
        let (origin, dir) = ray_at(targets[0].center);

        for _ in 0..30 {
            handle_click(origin, dir, &mut targets, &mut audio, &mut rng);
        }
        assert_eq!(audio.volume(), 20.0);
    }

    #[test]
    fn test_torus_click_lowers_volume_clamped_at_zero() {
        let (mut targets, mut audio, mut rng) = setup();
        let (origin, dir) = ray_at(targets[1].center);

        let hit = handle_click(origin, dir, &mut targets, &mut audio, &mut rng);
        assert_eq!(hit, Some(TargetKind::Torus));
        assert!(targets[1].illuminated);
        assert_eq!(audio.volume(), 0.0); // 1.0 - 1.5, clamped

        for _ in 0..10 {
            handle_click(origin, dir, &mut targets, &mut audio, &mut rng);
        }
        assert_eq!(audio.volume(), 0.0);
    }

    #[test]
    fn test_miss_leaves_all_state_unchanged() {
        let (mut targets, mut audio, mut rng) = setup();
        let before = targets.clone();

        // Straight up from the camera: hits nothing
        let hit = handle_click(
            Vec3::new(0.0, 1.5, 4.0),
            Vec3::Y,
            &mut targets,
            &mut audio,
            &mut rng,
        );
        assert_eq!(hit, None);
        assert_eq!(audio.volume(), 1.0);
        for (t, b) in targets.iter().zip(before.iter()) {
            assert_eq!(t.illuminated, b.illuminated);
            assert_eq!(t.color, b.color);
        }
    }

    #[test]
    fn test_nearest_hit_wins() {
        let (_, mut audio, mut rng) = setup();

        // Two spheres stacked along the same ray: the closer one takes the hit
        let mut targets = [
            InteractiveTarget {
                kind: TargetKind::Torus,
                center: Vec3::new(0.0, 0.0, -10.0),
                pick_radius: 1.0,
                illuminated: false,
                color: [0.0, 0.0, 1.0],
            },
            InteractiveTarget {
                kind: TargetKind::Sphere,
                center: Vec3::new(0.0, 0.0, -3.0),
                pick_radius: 1.0,
                illuminated: false,
                color: [1.0, 1.0, 1.0],
            },
        ];

        let hit = handle_click(Vec3::ZERO, Vec3::NEG_Z, &mut targets, &mut audio, &mut rng);
        assert_eq!(hit, Some(TargetKind::Sphere));
        assert!(targets[1].illuminated);
        assert!(!targets[0].illuminated);
    }

    #[test]
    fn test_ray_sphere_geometry() {
        // Dead-center hit at distance 4 (radius 1 sphere at z=-5)
        let t = ray_sphere(Vec3::ZERO, Vec3::NEG_Z, Vec3::new(0.0, 0.0, -5.0), 1.0);
        assert!((t.unwrap() - 4.0).abs() < 1e-5);

        // Sphere behind the origin is not hit
        assert!(ray_sphere(Vec3::ZERO, Vec3::NEG_Z, Vec3::new(0.0, 0.0, 5.0), 1.0).is_none());

        // Origin inside the sphere still reports the exit point
        let t = ray_sphere(Vec3::ZERO, Vec3::NEG_Z, Vec3::ZERO, 1.0);
        assert!((t.unwrap() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_torus_colors_stay_red_biased() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let c = random_red_biased_color(&mut rng);
            // Packed value < 0xFF0000 means the red byte never reaches 255
            assert!(c[0] < 1.0);
        }
    }

    #[test]
    fn test_rgb_unpacking() {
        assert_eq!(rgb_from_u32(0xFF_0000), [1.0, 0.0, 0.0]);
        assert_eq!(rgb_from_u32(0x00_FF00), [0.0, 1.0, 0.0]);
        assert_eq!(rgb_from_u32(0x0000_FF), [0.0, 0.0, 1.0]);
        assert_eq!(rgb_from_u32(0), [0.0, 0.0, 0.0]);
    }
}
