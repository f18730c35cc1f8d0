//! Read-only level geometry used for spawn placement.
//!
//! The server never depends on how levels are authored; it only asks a
//! [`LevelCatalog`] for the collision footprint and spawn region of a level id.

/// Axis-aligned obstacle footprint on the ground plane, centered at (`x`, `z`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionRect {
    pub x: f32,
    pub z: f32,
    pub half_width: f32,
    pub half_depth: f32,
}

impl CollisionRect {
    pub const fn new(x: f32, z: f32, half_width: f32, half_depth: f32) -> Self {
        Self {
            x,
            z,
            half_width,
            half_depth,
        }
    }

    /// True if a circle of `radius` at (`x`, `z`) overlaps the footprint.
    pub fn blocks(&self, x: f32, z: f32, radius: f32) -> bool {
        (x - self.x).abs() < self.half_width + radius && (z - self.z).abs() < self.half_depth + radius
    }
}

/// Rectangle in which spawn candidates are drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl SpawnBounds {
    /// Finite and non-inverted on both axes, so a range can be sampled.
    pub fn is_samplable(&self) -> bool {
        let finite = [self.min_x, self.max_x, self.min_z, self.max_z]
            .iter()
            .all(|v| v.is_finite());
        finite && self.min_x <= self.max_x && self.min_z <= self.max_z
    }

    /// Midpoint of the rectangle; non-finite axes collapse to the origin.
    pub fn center(&self) -> (f32, f32) {
        let mid = |a: f32, b: f32| {
            let m = (a + b) / 2.0;
            if m.is_finite() {
                m
            } else {
                0.0
            }
        };
        (mid(self.min_x, self.max_x), mid(self.min_z, self.max_z))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelGeometry {
    pub obstacles: Vec<CollisionRect>,
    pub spawn_bounds: SpawnBounds,
}

/// Source of level geometry keyed by level id.
pub trait LevelCatalog: Send + Sync {
    fn geometry_for(&self, level: &str) -> Option<&LevelGeometry>;

    /// Level ids in presentation order.
    fn level_names(&self) -> Vec<String>;

    fn contains(&self, level: &str) -> bool {
        self.geometry_for(level).is_some()
    }
}

/// The arenas shipped with the server.
pub struct BuiltinLevels {
    levels: Vec<(String, LevelGeometry)>,
}

impl BuiltinLevels {
    pub const DEFAULT_LEVEL: &'static str = "arena";

    pub fn new() -> Self {
        let arena = LevelGeometry {
            obstacles: vec![
                CollisionRect::new(0.0, 0.0, 4.0, 4.0),
                CollisionRect::new(-20.0, -20.0, 3.0, 6.0),
                CollisionRect::new(20.0, 20.0, 3.0, 6.0),
                CollisionRect::new(20.0, -20.0, 6.0, 3.0),
                CollisionRect::new(-20.0, 20.0, 6.0, 3.0),
                // Perimeter walls
                CollisionRect::new(0.0, -50.0, 50.0, 1.0),
                CollisionRect::new(0.0, 50.0, 50.0, 1.0),
                CollisionRect::new(-50.0, 0.0, 1.0, 50.0),
                CollisionRect::new(50.0, 0.0, 1.0, 50.0),
            ],
            spawn_bounds: SpawnBounds {
                min_x: -45.0,
                max_x: 45.0,
                min_z: -45.0,
                max_z: 45.0,
            },
        };

        let warehouse = LevelGeometry {
            obstacles: (0..5)
                .flat_map(|row| {
                    (0..3).map(move |col| {
                        CollisionRect::new(-24.0 + col as f32 * 24.0, -24.0 + row as f32 * 12.0, 6.0, 2.0)
                    })
                })
                .chain([
                    CollisionRect::new(0.0, -40.0, 40.0, 1.0),
                    CollisionRect::new(0.0, 40.0, 40.0, 1.0),
                    CollisionRect::new(-40.0, 0.0, 1.0, 40.0),
                    CollisionRect::new(40.0, 0.0, 1.0, 40.0),
                ])
                .collect(),
            spawn_bounds: SpawnBounds {
                min_x: -36.0,
                max_x: 36.0,
                min_z: -36.0,
                max_z: 36.0,
            },
        };

        let courtyard = LevelGeometry {
            obstacles: vec![
                CollisionRect::new(0.0, 0.0, 8.0, 8.0),
                CollisionRect::new(-15.0, 0.0, 1.0, 10.0),
                CollisionRect::new(15.0, 0.0, 1.0, 10.0),
                CollisionRect::new(0.0, -30.0, 30.0, 1.0),
                CollisionRect::new(0.0, 30.0, 30.0, 1.0),
                CollisionRect::new(-30.0, 0.0, 1.0, 30.0),
                CollisionRect::new(30.0, 0.0, 1.0, 30.0),
            ],
            spawn_bounds: SpawnBounds {
                min_x: -27.0,
                max_x: 27.0,
                min_z: -27.0,
                max_z: 27.0,
            },
        };

        Self {
            levels: vec![
                ("arena".to_string(), arena),
                ("warehouse".to_string(), warehouse),
                ("courtyard".to_string(), courtyard),
            ],
        }
    }
}

impl Default for BuiltinLevels {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelCatalog for BuiltinLevels {
    fn geometry_for(&self, level: &str) -> Option<&LevelGeometry> {
        self.levels
            .iter()
            .find(|(name, _)| name == level)
            .map(|(_, geometry)| geometry)
    }

    fn level_names(&self) -> Vec<String> {
        self.levels.iter().map(|(name, _)| name.clone()).collect()
    }
}
