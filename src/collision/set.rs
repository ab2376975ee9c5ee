use glam::Vec3;

use super::collider::{BoxCollider, Collider, SphereCollider};
use super::raycast::{Ray, RayHit};

/// Surfaces the locomotion probes are tested against. Built once when the
/// scene is assembled; only extended when collidable models finish loading.
#[derive(Default, Clone)]
pub struct ColliderSet {
    colliders: Vec<Box<dyn Collider>>,
}

impl ColliderSet {
    pub fn new() -> Self {
        Self {
            colliders: Vec::new(),
        }
    }

    pub fn add<T: Collider + 'static>(&mut self, collider: T) {
        self.colliders.push(Box::new(collider));
    }

    pub fn add_sphere(&mut self, center: Vec3, radius: f32) {
        self.add(SphereCollider::new(center, radius));
    }

    pub fn add_box(&mut self, center: Vec3, half_extents: Vec3) {
        self.add(BoxCollider::from_center_half_extents(center, half_extents));
    }

    pub fn colliders(&self) -> &[Box<dyn Collider>] {
        &self.colliders
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Nearest hit across every collider, with the index of the collider hit.
    pub fn raycast(&self, ray: &Ray) -> Option<(usize, RayHit)> {
        self.colliders
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.ray_intersect(ray).map(|hit| (i, hit)))
            .min_by(|a, b| a.1.distance.total_cmp(&b.1.distance))
    }

    /// Distance to the nearest surface along `direction`, if anything is hit.
    pub fn nearest_distance(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        if direction.length_squared() == 0.0 {
            return None;
        }
        self.raycast(&Ray::new(origin, direction))
            .map(|(_, hit)| hit.distance)
    }
}

impl std::fmt::Debug for ColliderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColliderSet")
            .field("collider_count", &self.colliders.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raycast_picks_the_nearest_collider() {
        let mut set = ColliderSet::new();
        set.add_box(Vec3::new(0.0, 1.0, -10.0), Vec3::new(5.0, 1.0, 0.1));
        set.add_box(Vec3::new(0.0, 1.0, -4.0), Vec3::new(5.0, 1.0, 0.1));

        let (index, hit) = set.raycast(&Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Z)).unwrap();
        assert_eq!(index, 1);
        assert!((hit.distance - 3.9).abs() < 1e-4);
    }

    #[test]
    fn empty_set_never_hits() {
        let set = ColliderSet::new();
        assert!(set.is_empty());
        assert!(set.nearest_distance(Vec3::ZERO, Vec3::X).is_none());
    }
}
