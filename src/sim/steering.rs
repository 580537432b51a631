//! Local steering: separation between same-category actors

use glam::Vec3;

use super::spatial::{ActorHandle, CategoryMask, Contact, SpatialQuery};
use crate::consts::{SEPARATION_EPSILON_SQ, STEER_EPSILON_SQ};
use crate::flat;

/// Anti-overlap push for an actor at `origin` given the contacts around it.
///
/// Each neighbour contributes `normalize(d) / |d|²` where `d` is the planar
/// offset away from it; the sum is averaged and scaled by `strength`.
/// Fewer than two contacts (self included) means nobody to avoid.
pub fn separation(origin: Vec3, me: ActorHandle, contacts: &[Contact], strength: f32) -> Vec3 {
    if contacts.len() <= 1 {
        return Vec3::ZERO;
    }

    let mut push = Vec3::ZERO;
    let mut n = 0u32;
    for contact in contacts {
        if contact.owner == Some(me) {
            continue;
        }
        let away = flat(origin - contact.position);
        let d2 = away.length_squared();
        if d2 < SEPARATION_EPSILON_SQ {
            continue;
        }
        push += away.normalize() / d2;
        n += 1;
    }

    if n == 0 {
        return Vec3::ZERO;
    }
    push / n as f32 * strength
}

/// Query neighbours and compute separation in one step
pub fn compute_separation(
    query: &dyn SpatialQuery,
    origin: Vec3,
    me: ActorHandle,
    radius: f32,
    strength: f32,
    mask: CategoryMask,
) -> Vec3 {
    if radius <= 0.0 {
        return Vec3::ZERO;
    }
    let contacts = query.overlap(origin, radius, mask);
    separation(origin, me, &contacts, strength)
}

/// Combine a seek direction with separation into a velocity of `speed`.
///
/// Returns zero when the two cancel out.
pub fn steer(seek: Vec3, separation: Vec3, speed: f32) -> Vec3 {
    let dir = seek + separation;
    if dir.length_squared() > STEER_EPSILON_SQ {
        dir.normalize() * speed
    } else {
        Vec3::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(id: u32, x: f32, z: f32) -> Contact {
        Contact {
            owner: Some(ActorHandle::Enemy(id)),
            position: Vec3::new(x, 0.0, z),
        }
    }

    #[test]
    fn test_alone_has_no_separation() {
        let me = ActorHandle::Enemy(1);
        let sep = separation(Vec3::ZERO, me, &[contact(1, 0.0, 0.0)], 2.0);
        assert_eq!(sep, Vec3::ZERO);
    }

    #[test]
    fn test_pushes_away_with_inverse_square() {
        let me = ActorHandle::Enemy(1);
        let contacts = [contact(1, 0.0, 0.0), contact(2, 0.5, 0.0)];
        let sep = separation(Vec3::ZERO, me, &contacts, 1.0);
        // away = (-0.5, 0, 0), normalized / 0.25 = (-4, 0, 0)
        assert!((sep - Vec3::new(-4.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_averages_over_neighbours_and_ignores_height() {
        let me = ActorHandle::Enemy(1);
        let mut above = contact(3, -1.0, 0.0);
        above.position.y = 5.0;
        let contacts = [contact(1, 0.0, 0.0), contact(2, 1.0, 0.0), above];
        let sep = separation(Vec3::ZERO, me, &contacts, 2.2);
        // Symmetric neighbours cancel out
        assert!(sep.length() < 1e-5);
    }

    #[test]
    fn test_coincident_neighbour_is_skipped() {
        let me = ActorHandle::Enemy(1);
        let contacts = [contact(1, 0.0, 0.0), contact(2, 0.0, 0.0)];
        assert_eq!(separation(Vec3::ZERO, me, &contacts, 1.0), Vec3::ZERO);
    }

    #[test]
    fn test_steer_cancels_to_zero() {
        let v = steer(Vec3::X, -Vec3::X, 3.0);
        assert_eq!(v, Vec3::ZERO);
        let v = steer(Vec3::X, Vec3::ZERO, 3.0);
        assert!((v - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-6);
    }
}
