use glam::Vec3;
use rand::Rng;

pub const PARTICLE_COUNT: usize = 10_000;

pub const SPHERE_RADIUS: f32 = 0.7;
pub const HELIX_RADIUS: f32 = 0.5;
pub const HELIX_TURNS: f32 = 8.0;
pub const HELIX_HEIGHT: f32 = 2.0;

/// Sphere formation targets: golden-angle spiral for even angular
/// distribution. Computed once at startup, immutable thereafter.
pub fn sphere_targets(count: usize) -> Vec<Vec3> {
    let golden_angle = std::f32::consts::PI * (1.0 + 5.0f32.sqrt());

    (0..count)
        .map(|i| {
            let idx = i as f32 + 0.5;
            let phi = (1.0 - 2.0 * idx / count as f32).acos();
            let theta = golden_angle * idx;

            Vec3::new(
                SPHERE_RADIUS * phi.sin() * theta.cos(),
                SPHERE_RADIUS * phi.sin() * theta.sin(),
                SPHERE_RADIUS * phi.cos(),
            )
        })
        .collect()
}

/// Helix formation targets wound around the Y axis.
pub fn helix_targets(count: usize) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let t = i as f32 / count as f32;
            let angle = HELIX_TURNS * std::f32::consts::TAU * t;

            Vec3::new(
                HELIX_RADIUS * angle.cos(),
                HELIX_HEIGHT * (t - 0.5),
                HELIX_RADIUS * angle.sin(),
            )
        })
        .collect()
}

/// Initial particle positions: uniform scatter inside the [-1,1] cube.
pub fn scatter_positions<R: Rng>(count: usize, rng: &mut R) -> Vec<Vec3> {
    (0..count)
        .map(|_| {
            Vec3::new(
                (rng.random::<f32>() - 0.5) * 2.0,
                (rng.random::<f32>() - 0.5) * 2.0,
                (rng.random::<f32>() - 0.5) * 2.0,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn sphere_targets_sit_on_the_sphere() {
        let targets = sphere_targets(4);
        assert_eq!(targets.len(), 4);

        let mean_radius: f32 = targets.iter().map(|p| p.length()).sum::<f32>() / 4.0;
        assert!((mean_radius - SPHERE_RADIUS).abs() < 1e-4);
    }

    #[test]
    fn sphere_targets_are_angularly_distinct() {
        let targets = sphere_targets(4);

        for i in 0..targets.len() {
            for j in (i + 1)..targets.len() {
                assert!(
                    targets[i].distance(targets[j]) > 1e-3,
                    "targets {} and {} coincide",
                    i,
                    j
                );
            }
        }
    }

    #[test]
    fn helix_spans_its_height_at_fixed_radius() {
        let count = 64;
        let targets = helix_targets(count);

        assert!((targets[0].y - (-HELIX_HEIGHT / 2.0)).abs() < 1e-5);
        assert!(targets[count - 1].y < HELIX_HEIGHT / 2.0);

        for p in &targets {
            let radial = (p.x * p.x + p.z * p.z).sqrt();
            assert!((radial - HELIX_RADIUS).abs() < 1e-4);
        }
    }

    #[test]
    fn scatter_stays_inside_the_cube() {
        let mut rng = StdRng::seed_from_u64(7);
        let positions = scatter_positions(256, &mut rng);

        assert_eq!(positions.len(), 256);
        for p in positions {
            for c in [p.x, p.y, p.z] {
                assert!((-1.0..=1.0).contains(&c));
            }
        }
    }
}
