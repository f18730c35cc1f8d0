//! Spawn placement and cosmetic assignment.

use crate::levels::LevelGeometry;
use log::{debug, warn};
use rand::Rng;
use shared::{ColorScheme, Vec3, EYE_HEIGHT, MAX_SPAWN_ATTEMPTS, PALETTE, PLAYER_RADIUS};

fn is_clear(geometry: &LevelGeometry, x: f32, z: f32) -> bool {
    !geometry
        .obstacles
        .iter()
        .any(|obstacle| obstacle.blocks(x, z, PLAYER_RADIUS))
}

/// Draws a random eye-height position inside the level's spawn bounds that
/// does not overlap any obstacle.
///
/// Placement is best-effort: after `MAX_SPAWN_ATTEMPTS` blocked draws the last
/// candidate is returned anyway. Bounds that cannot be sampled (inverted or
/// non-finite) yield their center.
pub fn spawn_position<R: Rng + ?Sized>(geometry: &LevelGeometry, rng: &mut R) -> Vec3 {
    let bounds = geometry.spawn_bounds;
    if !bounds.is_samplable() {
        let (x, z) = bounds.center();
        warn!("Unusable spawn bounds {:?}, spawning at center", bounds);
        return Vec3::new(x, EYE_HEIGHT, z);
    }

    let mut candidate = Vec3::new(0.0, EYE_HEIGHT, 0.0);

    for _ in 0..MAX_SPAWN_ATTEMPTS {
        candidate.x = rng.gen_range(bounds.min_x..=bounds.max_x);
        candidate.z = rng.gen_range(bounds.min_z..=bounds.max_z);

        if is_clear(geometry, candidate.x, candidate.z) {
            return candidate;
        }
    }

    debug!(
        "No clear spawn after {} attempts, using ({:.1}, {:.1})",
        MAX_SPAWN_ATTEMPTS, candidate.x, candidate.z
    );
    candidate
}

/// Round-robin palette entry for the given join counter.
pub fn color_scheme(player_count: u32) -> ColorScheme {
    PALETTE[player_count as usize % PALETTE.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::{CollisionRect, SpawnBounds};
    use assert_approx_eq::assert_approx_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn single_block_level() -> LevelGeometry {
        LevelGeometry {
            obstacles: vec![CollisionRect::new(0.0, 0.0, 5.0, 5.0)],
            spawn_bounds: SpawnBounds {
                min_x: -40.0,
                max_x: 40.0,
                min_z: -40.0,
                max_z: 40.0,
            },
        }
    }

    #[test]
    fn test_spawn_never_inside_obstacle() {
        let level = single_block_level();
        let mut rng = StdRng::seed_from_u64(0xA12E_4A);

        for _ in 0..5000 {
            let pos = spawn_position(&level, &mut rng);
            assert!(
                !(pos.x.abs() < 5.5 && pos.z.abs() < 5.5),
                "spawned inside obstacle at ({}, {})",
                pos.x,
                pos.z
            );
        }
    }

    #[test]
    fn test_spawn_stays_in_bounds_at_eye_height() {
        let level = single_block_level();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..1000 {
            let pos = spawn_position(&level, &mut rng);
            assert!((-40.0..=40.0).contains(&pos.x));
            assert!((-40.0..=40.0).contains(&pos.z));
            assert_approx_eq!(pos.y, EYE_HEIGHT);
        }
    }

    #[test]
    fn test_spawn_gives_up_when_fully_blocked() {
        let level = LevelGeometry {
            obstacles: vec![CollisionRect::new(0.0, 0.0, 100.0, 100.0)],
            spawn_bounds: SpawnBounds {
                min_x: -10.0,
                max_x: 10.0,
                min_z: -10.0,
                max_z: 10.0,
            },
        };
        let mut rng = StdRng::seed_from_u64(1);

        let pos = spawn_position(&level, &mut rng);
        assert!((-10.0..=10.0).contains(&pos.x));
        assert!((-10.0..=10.0).contains(&pos.z));
    }

    #[test]
    fn test_spawn_survives_degenerate_bounds() {
        let mut rng = StdRng::seed_from_u64(3);

        let inverted = LevelGeometry {
            obstacles: Vec::new(),
            spawn_bounds: SpawnBounds {
                min_x: 10.0,
                max_x: -10.0,
                min_z: 4.0,
                max_z: 2.0,
            },
        };
        let pos = spawn_position(&inverted, &mut rng);
        assert_approx_eq!(pos.x, 0.0);
        assert_approx_eq!(pos.z, 3.0);
        assert_approx_eq!(pos.y, EYE_HEIGHT);

        let not_a_number = LevelGeometry {
            obstacles: Vec::new(),
            spawn_bounds: SpawnBounds {
                min_x: f32::NAN,
                max_x: 10.0,
                min_z: -2.0,
                max_z: 2.0,
            },
        };
        let pos = spawn_position(&not_a_number, &mut rng);
        assert_approx_eq!(pos.x, 0.0);
        assert_approx_eq!(pos.z, 0.0);
    }

    #[test]
    fn test_color_scheme_round_robin() {
        assert_eq!(color_scheme(0), PALETTE[0]);
        assert_eq!(color_scheme(1), PALETTE[1]);
        assert_eq!(color_scheme(PALETTE.len() as u32), PALETTE[0]);
        assert_eq!(color_scheme(PALETTE.len() as u32 + 3), PALETTE[3]);
    }
}
