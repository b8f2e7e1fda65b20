//! Scene provider: deterministic, queryable static geometry.
//!
//! Scenes are identified by (scene_id, seed). The provider only guarantees
//! what the sensors need: ray queries against static geometry and a
//! deterministic spawn pose. Scene *content* stays intentionally minimal.

use contracts::{EnvError, Pose, Quaternion, Vector3};
use nalgebra as na;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Minimum horizontal clearance between spawn and any obstacle (meters)
const SPAWN_CLEARANCE: f64 = 0.75;

/// Spawn sampling attempts before giving up on clearance
const SPAWN_ATTEMPTS: usize = 32;

/// Axis-aligned box obstacle
#[derive(Debug, Clone)]
struct Aabb {
    min: na::Point3<f64>,
    max: na::Point3<f64>,
}

impl Aabb {
    /// Slab-method ray intersection; returns the entry distance if the ray
    /// hits the box in front of the origin.
    fn ray_entry(&self, origin: &na::Point3<f64>, dir: &na::Vector3<f64>) -> Option<f64> {
        let mut t_min = 0.0f64;
        let mut t_max = f64::INFINITY;

        for axis in 0..3 {
            let o = origin[axis];
            let d = dir[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if d.abs() < 1e-12 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let (t0, t1) = if inv >= 0.0 {
                ((lo - o) * inv, (hi - o) * inv)
            } else {
                ((hi - o) * inv, (lo - o) * inv)
            };
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }

        (t_min > 0.0).then_some(t_min)
    }

    fn horizontal_distance(&self, x: f64, y: f64) -> f64 {
        let dx = (self.min.x - x).max(0.0).max(x - self.max.x);
        let dy = (self.min.y - y).max(0.0).max(y - self.max.y);
        (dx * dx + dy * dy).sqrt()
    }
}

/// Loaded, navigable scene with queryable static geometry
#[derive(Debug, Clone)]
pub struct SceneHandle {
    scene_id: String,
    seed: u64,
    ground_z: f64,
    obstacles: Vec<Aabb>,
    spawn: Pose,
}

impl SceneHandle {
    /// Scene family this handle was loaded from
    pub fn scene_id(&self) -> &str {
        &self.scene_id
    }

    /// Generation seed
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Deterministic episode spawn pose
    pub fn spawn_pose(&self) -> Pose {
        self.spawn
    }

    /// Distance from `origin` along `dir` to the nearest static surface,
    /// or None when the ray escapes the scene.
    pub fn ray_distance(
        &self,
        origin: &na::Point3<f64>,
        dir: &na::Unit<na::Vector3<f64>>,
    ) -> Option<f64> {
        let mut nearest: Option<f64> = None;

        // Ground plane
        if dir.z < -1e-12 {
            let t = (self.ground_z - origin.z) / dir.z;
            if t > 0.0 {
                nearest = Some(t);
            }
        }

        for obstacle in &self.obstacles {
            if let Some(t) = obstacle.ray_entry(origin, dir) {
                nearest = Some(nearest.map_or(t, |n: f64| n.min(t)));
            }
        }

        nearest
    }

    /// Number of obstacles (diagnostics)
    pub fn obstacle_count(&self) -> usize {
        self.obstacles.len()
    }
}

/// Scene source abstraction
///
/// Given `(scene_id, seed)`, returns a loaded, navigable scene handle or
/// fails; the core only requires queryable static geometry.
pub trait SceneProvider: Send + Sync {
    /// Load or regenerate a scene
    ///
    /// # Errors
    /// `SceneNotFound` for unknown ids, `SceneInvalid` for degenerate
    /// generation parameters.
    fn load(&self, scene_id: &str, seed: u64) -> Result<SceneHandle, EnvError>;
}

/// Per-family generation parameters
#[derive(Debug, Clone, Copy)]
struct FamilyParams {
    obstacle_count: usize,
    half_extent: f64,
    size_range: (f64, f64),
    height_range: (f64, f64),
}

/// Deterministic procedural scene provider.
///
/// Known families: `office`, `warehouse`, `forest`. Equal (scene_id, seed)
/// pairs always produce identical geometry and spawn poses.
#[derive(Debug, Default, Clone)]
pub struct ProceduralSceneProvider;

impl ProceduralSceneProvider {
    pub fn new() -> Self {
        Self
    }

    fn family_params(scene_id: &str) -> Option<FamilyParams> {
        match scene_id {
            "office" => Some(FamilyParams {
                obstacle_count: 6,
                half_extent: 10.0,
                size_range: (0.5, 2.0),
                height_range: (0.8, 2.2),
            }),
            "warehouse" => Some(FamilyParams {
                obstacle_count: 10,
                half_extent: 25.0,
                size_range: (1.0, 4.0),
                height_range: (2.0, 6.0),
            }),
            "forest" => Some(FamilyParams {
                obstacle_count: 24,
                half_extent: 30.0,
                size_range: (0.2, 0.6),
                height_range: (4.0, 12.0),
            }),
            _ => None,
        }
    }
}

impl SceneProvider for ProceduralSceneProvider {
    fn load(&self, scene_id: &str, seed: u64) -> Result<SceneHandle, EnvError> {
        let params = Self::family_params(scene_id).ok_or_else(|| EnvError::SceneNotFound {
            scene_id: scene_id.to_string(),
        })?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed ^ fnv1a(scene_id));

        let mut obstacles = Vec::with_capacity(params.obstacle_count);
        for _ in 0..params.obstacle_count {
            let cx = rng.random_range(-params.half_extent..params.half_extent);
            let cy = rng.random_range(-params.half_extent..params.half_extent);
            let half = rng.random_range(params.size_range.0..params.size_range.1) / 2.0;
            let height = rng.random_range(params.height_range.0..params.height_range.1);
            obstacles.push(Aabb {
                min: na::Point3::new(cx - half, cy - half, 0.0),
                max: na::Point3::new(cx + half, cy + half, height),
            });
        }

        let spawn = sample_spawn(&mut rng, &obstacles).ok_or_else(|| {
            EnvError::scene_invalid(scene_id, "no clear spawn pose after bounded attempts")
        })?;

        debug!(
            scene_id,
            seed,
            obstacles = obstacles.len(),
            "scene generated"
        );

        Ok(SceneHandle {
            scene_id: scene_id.to_string(),
            seed,
            ground_z: 0.0,
            obstacles,
            spawn,
        })
    }
}

/// Sample a spawn pose with horizontal clearance from every obstacle.
fn sample_spawn(rng: &mut ChaCha8Rng, obstacles: &[Aabb]) -> Option<Pose> {
    for _ in 0..SPAWN_ATTEMPTS {
        let x = rng.random_range(-2.0..2.0);
        let y = rng.random_range(-2.0..2.0);
        let z = rng.random_range(1.0..3.0);
        let yaw = rng.random_range(-std::f64::consts::PI..std::f64::consts::PI);

        let clear = obstacles
            .iter()
            .all(|o| o.horizontal_distance(x, y) >= SPAWN_CLEARANCE);
        if clear {
            return Some(Pose {
                translation: Vector3::new(x, y, z),
                rotation: Quaternion::from_yaw(yaw),
            });
        }
    }
    None
}

fn fnv1a(s: &str) -> u64 {
    let mut hash = 0xcbf29ce484222325u64;
    for byte in s.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_family_is_not_found() {
        let provider = ProceduralSceneProvider::new();
        let result = provider.load("underwater", 1);
        assert!(matches!(result, Err(EnvError::SceneNotFound { .. })));
    }

    #[test]
    fn equal_inputs_give_identical_scenes() {
        let provider = ProceduralSceneProvider::new();
        let a = provider.load("office", 7).unwrap();
        let b = provider.load("office", 7).unwrap();
        assert_eq!(a.spawn_pose(), b.spawn_pose());
        assert_eq!(a.obstacle_count(), b.obstacle_count());
    }

    #[test]
    fn different_seeds_differ() {
        let provider = ProceduralSceneProvider::new();
        let a = provider.load("office", 7).unwrap();
        let b = provider.load("office", 8).unwrap();
        assert_ne!(a.spawn_pose(), b.spawn_pose());
    }

    #[test]
    fn downward_ray_hits_ground() {
        let provider = ProceduralSceneProvider::new();
        let scene = provider.load("office", 3).unwrap();
        let origin = na::Point3::new(0.0, 0.0, 2.0);
        let down = na::Unit::new_normalize(na::Vector3::new(0.0, 0.0, -1.0));
        let dist = scene.ray_distance(&origin, &down);
        assert!(dist.is_some());
        assert!(dist.unwrap() <= 2.0 + 1e-9);
    }

    #[test]
    fn upward_ray_escapes() {
        let provider = ProceduralSceneProvider::new();
        let scene = provider.load("office", 3).unwrap();
        let origin = na::Point3::new(0.0, 0.0, 50.0);
        let up = na::Unit::new_normalize(na::Vector3::new(0.0, 0.0, 1.0));
        assert!(scene.ray_distance(&origin, &up).is_none());
    }

    #[test]
    fn spawn_is_above_ground_and_in_bounds() {
        let provider = ProceduralSceneProvider::new();
        for seed in 0..20 {
            let scene = provider.load("forest", seed).unwrap();
            let spawn = scene.spawn_pose().translation;
            assert!(spawn.z >= 1.0 && spawn.z <= 3.0);
            assert!(spawn.x.abs() <= 2.0 && spawn.y.abs() <= 2.0);
        }
    }
}
