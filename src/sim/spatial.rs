//! Spatial queries against actors and static geometry
//!
//! The simulation never does broad-phase work itself: everything that needs
//! "who is near" or "what does this ray cross" goes through [`SpatialQuery`].
//! [`BruteForceIndex`] is the default backend and is rebuilt once per decision
//! tick, while actor positions are frozen.

use std::ops::BitOr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Stable enemy identifier (allocated in ascending order)
pub type EnemyId = u32;

/// Something a query can resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorHandle {
    Enemy(EnemyId),
    Player,
}

/// Collision category bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryMask(pub u32);

impl CategoryMask {
    pub const NONE: CategoryMask = CategoryMask(0);
    pub const ENEMY: CategoryMask = CategoryMask(1);
    pub const PLAYER: CategoryMask = CategoryMask(1 << 1);
    pub const WALL: CategoryMask = CategoryMask(1 << 2);

    #[inline]
    pub fn intersects(self, other: CategoryMask) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for CategoryMask {
    type Output = CategoryMask;

    fn bitor(self, rhs: CategoryMask) -> CategoryMask {
        CategoryMask(self.0 | rhs.0)
    }
}

/// Result of an overlap query. Static geometry has no owner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub owner: Option<ActorHandle>,
    /// Actor foot position, or the closest point on a wall
    pub position: Vec3,
}

/// A single ray intersection. Static geometry has no owner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub owner: Option<ActorHandle>,
    pub point: Vec3,
    pub distance: f32,
}

/// Overlap and ray queries against the current world
pub trait SpatialQuery {
    /// Everything in `mask` touching the sphere at `center`
    fn overlap(&self, center: Vec3, radius: f32, mask: CategoryMask) -> Vec<Contact>;

    /// Everything in `mask` crossed by the ray, sorted by ascending distance
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: CategoryMask,
    ) -> Vec<RayHit>;
}

/// Upright cylinder standing on `base`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub handle: ActorHandle,
    pub category: CategoryMask,
    pub base: Vec3,
    pub radius: f32,
    pub height: f32,
}

impl Collider {
    /// Sphere/cylinder overlap via the closest point on the cylinder
    pub fn overlaps_sphere(&self, center: Vec3, radius: f32) -> bool {
        let planar = Vec3::new(center.x - self.base.x, 0.0, center.z - self.base.z).length();
        let dp = (planar - self.radius).max(0.0);
        let dy = center.y.clamp(self.base.y, self.base.y + self.height) - center.y;
        dp * dp + dy * dy <= radius * radius
    }

    /// Entry distance of a unit ray, if it crosses the cylinder within `max`
    pub fn ray_entry(&self, origin: Vec3, dir: Vec3, max: f32) -> Option<f32> {
        // Planar circle interval
        let ox = origin.x - self.base.x;
        let oz = origin.z - self.base.z;
        let a = dir.x * dir.x + dir.z * dir.z;
        let c = ox * ox + oz * oz - self.radius * self.radius;
        let (p0, p1) = if a < 1e-8 {
            if c > 0.0 {
                return None;
            }
            (f32::NEG_INFINITY, f32::INFINITY)
        } else {
            let b = ox * dir.x + oz * dir.z;
            let disc = b * b - a * c;
            if disc < 0.0 {
                return None;
            }
            let root = disc.sqrt();
            ((-b - root) / a, (-b + root) / a)
        };

        let (y0, y1) = slab(origin.y, dir.y, self.base.y, self.base.y + self.height)?;
        enter_interval(p0.max(y0), p1.min(y1), max)
    }
}

/// Static axis-aligned box (walls, pillars)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub min: Vec3,
    pub max: Vec3,
}

impl Wall {
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        p.clamp(self.min, self.max)
    }

    pub fn overlaps_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.closest_point(center).distance_squared(center) <= radius * radius
    }

    /// Entry distance of a unit ray (slab test)
    pub fn ray_entry(&self, origin: Vec3, dir: Vec3, max: f32) -> Option<f32> {
        let (x0, x1) = slab(origin.x, dir.x, self.min.x, self.max.x)?;
        let (y0, y1) = slab(origin.y, dir.y, self.min.y, self.max.y)?;
        let (z0, z1) = slab(origin.z, dir.z, self.min.z, self.max.z)?;
        enter_interval(x0.max(y0).max(z0), x1.min(y1).min(z1), max)
    }
}

/// Parametric interval where `o + t*d` lies in `[lo, hi]` on one axis
fn slab(o: f32, d: f32, lo: f32, hi: f32) -> Option<(f32, f32)> {
    if d.abs() < 1e-8 {
        if o < lo || o > hi {
            return None;
        }
        return Some((f32::NEG_INFINITY, f32::INFINITY));
    }
    let t0 = (lo - o) / d;
    let t1 = (hi - o) / d;
    Some((t0.min(t1), t0.max(t1)))
}

fn enter_interval(t_enter: f32, t_exit: f32, max: f32) -> Option<f32> {
    if t_enter > t_exit || t_exit < 0.0 {
        return None;
    }
    let t = t_enter.max(0.0);
    (t <= max).then_some(t)
}

/// Linear-scan backend, adequate for a few hundred actors
#[derive(Debug, Clone, Default)]
pub struct BruteForceIndex {
    colliders: Vec<Collider>,
    walls: Vec<Wall>,
}

impl BruteForceIndex {
    pub fn new(walls: Vec<Wall>) -> Self {
        Self {
            colliders: Vec::new(),
            walls,
        }
    }

    /// Replace the actor set (walls are static)
    pub fn rebuild(&mut self, colliders: impl IntoIterator<Item = Collider>) {
        self.colliders.clear();
        self.colliders.extend(colliders);
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }
}

impl SpatialQuery for BruteForceIndex {
    fn overlap(&self, center: Vec3, radius: f32, mask: CategoryMask) -> Vec<Contact> {
        let mut out: Vec<Contact> = self
            .colliders
            .iter()
            .filter(|c| mask.intersects(c.category) && c.overlaps_sphere(center, radius))
            .map(|c| Contact {
                owner: Some(c.handle),
                position: c.base,
            })
            .collect();

        if mask.intersects(CategoryMask::WALL) {
            out.extend(
                self.walls
                    .iter()
                    .filter(|w| w.overlaps_sphere(center, radius))
                    .map(|w| Contact {
                        owner: None,
                        position: w.closest_point(center),
                    }),
            );
        }
        out
    }

    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: CategoryMask,
    ) -> Vec<RayHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO || max_distance <= 0.0 {
            return Vec::new();
        }

        let mut hits: Vec<RayHit> = self
            .colliders
            .iter()
            .filter(|c| mask.intersects(c.category))
            .filter_map(|c| {
                c.ray_entry(origin, dir, max_distance).map(|t| RayHit {
                    owner: Some(c.handle),
                    point: origin + dir * t,
                    distance: t,
                })
            })
            .collect();

        if mask.intersects(CategoryMask::WALL) {
            hits.extend(self.walls.iter().filter_map(|w| {
                w.ray_entry(origin, dir, max_distance).map(|t| RayHit {
                    owner: None,
                    point: origin + dir * t,
                    distance: t,
                })
            }));
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enemy_at(id: EnemyId, x: f32, z: f32) -> Collider {
        Collider {
            handle: ActorHandle::Enemy(id),
            category: CategoryMask::ENEMY,
            base: Vec3::new(x, 0.0, z),
            radius: 0.5,
            height: 2.0,
        }
    }

    #[test]
    fn test_overlap_filters_by_category() {
        let mut index = BruteForceIndex::default();
        index.rebuild([
            enemy_at(1, 1.0, 0.0),
            Collider {
                handle: ActorHandle::Player,
                category: CategoryMask::PLAYER,
                base: Vec3::new(-1.0, 0.0, 0.0),
                radius: 0.5,
                height: 2.0,
            },
        ]);

        let enemies = index.overlap(Vec3::ZERO, 1.0, CategoryMask::ENEMY);
        assert_eq!(enemies.len(), 1);
        assert_eq!(enemies[0].owner, Some(ActorHandle::Enemy(1)));

        let both = index.overlap(Vec3::ZERO, 1.0, CategoryMask::ENEMY | CategoryMask::PLAYER);
        assert_eq!(both.len(), 2);
    }

    #[test]
    fn test_overlap_respects_height() {
        let mut index = BruteForceIndex::default();
        index.rebuild([enemy_at(1, 0.0, 0.0)]);

        // Sphere well above the cylinder top
        assert!(index.overlap(Vec3::new(0.0, 5.0, 0.0), 1.0, CategoryMask::ENEMY).is_empty());
        // Sphere grazing the top
        assert_eq!(index.overlap(Vec3::new(0.0, 2.5, 0.0), 1.0, CategoryMask::ENEMY).len(), 1);
    }

    #[test]
    fn test_raycast_sorted_by_distance() {
        let mut index = BruteForceIndex::new(vec![Wall::new(
            Vec3::new(4.0, 0.0, -2.0),
            Vec3::new(5.0, 3.0, 2.0),
        )]);
        index.rebuild([enemy_at(2, 8.0, 0.0), enemy_at(1, 2.0, 0.0)]);

        let hits = index.raycast(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::X,
            20.0,
            CategoryMask::ENEMY | CategoryMask::WALL,
        );
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].owner, Some(ActorHandle::Enemy(1)));
        assert!((hits[0].distance - 1.5).abs() < 1e-4);
        assert_eq!(hits[1].owner, None);
        assert!((hits[1].distance - 4.0).abs() < 1e-4);
        assert_eq!(hits[2].owner, Some(ActorHandle::Enemy(2)));
    }

    #[test]
    fn test_raycast_respects_max_distance() {
        let mut index = BruteForceIndex::default();
        index.rebuild([enemy_at(1, 10.0, 0.0)]);

        let hits = index.raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::X, 5.0, CategoryMask::ENEMY);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_ray_starting_inside_hits_at_zero() {
        let collider = enemy_at(1, 0.0, 0.0);
        let t = collider.ray_entry(Vec3::new(0.0, 1.0, 0.0), Vec3::X, 10.0);
        assert_eq!(t, Some(0.0));
    }

    #[test]
    fn test_ray_passing_over_cylinder_misses() {
        let collider = enemy_at(1, 3.0, 0.0);
        assert!(collider.ray_entry(Vec3::new(0.0, 3.0, 0.0), Vec3::X, 10.0).is_none());
    }
}
