use glam::{Mat4, Vec3};
use std::fmt::Debug;
use std::sync::Arc;

use super::raycast::{Ray, RayHit};

/// Drawable outline of a collider, used by the debug renderer.
#[derive(Debug, Clone, Copy)]
pub enum ColliderShape {
    Sphere { center: Vec3, radius: f32 },
    Box { center: Vec3, half_extents: Vec3 },
}

pub trait Collider: Send + Sync + Debug {
    /// Nearest intersection of `ray` with the surface, if any.
    fn ray_intersect(&self, ray: &Ray) -> Option<RayHit>;
    fn bounds(&self) -> BoxCollider;
    fn render_shape(&self) -> ColliderShape;
    fn clone_box(&self) -> Box<dyn Collider>;
}

impl Clone for Box<dyn Collider> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SphereCollider {
    pub center: Vec3,
    pub radius: f32,
}

impl SphereCollider {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

impl Collider for SphereCollider {
    fn ray_intersect(&self, ray: &Ray) -> Option<RayHit> {
        let oc = ray.origin - self.center;
        let a = ray.direction.dot(ray.direction);
        let b = 2.0 * oc.dot(ray.direction);
        let c = oc.dot(oc) - self.radius * self.radius;
        let discriminant = b * b - 4.0 * a * c;

        if discriminant < 0.0 {
            return None;
        }

        let sqrt_d = discriminant.sqrt();
        [(-b - sqrt_d) / (2.0 * a), (-b + sqrt_d) / (2.0 * a)]
            .into_iter()
            .find(|&t| ray.accepts(t))
            .map(|t| {
                let point = ray.at(t);
                RayHit {
                    distance: t,
                    point,
                    normal: (point - self.center).normalize_or_zero(),
                }
            })
    }

    fn bounds(&self) -> BoxCollider {
        BoxCollider::from_center_half_extents(self.center, Vec3::splat(self.radius))
    }

    fn render_shape(&self) -> ColliderShape {
        ColliderShape::Sphere {
            center: self.center,
            radius: self.radius,
        }
    }

    fn clone_box(&self) -> Box<dyn Collider> {
        Box::new(*self)
    }
}

/// Axis-aligned box; walls of the room are typically thin boxes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxCollider {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoxCollider {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Smallest box holding every point, or `None` for an empty slice.
    pub fn enclosing(points: &[Vec3]) -> Option<Self> {
        let first = *points.first()?;
        let (min, max) = points
            .iter()
            .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p)));
        Some(Self { min, max })
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    fn surface_normal(&self, point: Vec3) -> Vec3 {
        let p = (point - self.center()) / self.half_extents().max(Vec3::splat(0.0001));

        let abs_p = p.abs();
        if abs_p.x > abs_p.y && abs_p.x > abs_p.z {
            Vec3::X * p.x.signum()
        } else if abs_p.y > abs_p.z {
            Vec3::Y * p.y.signum()
        } else {
            Vec3::Z * p.z.signum()
        }
    }
}

impl Collider for BoxCollider {
    fn ray_intersect(&self, ray: &Ray) -> Option<RayHit> {
        let inv = |d: f32| if d.abs() > 0.0001 { 1.0 / d } else { f32::MAX };
        let inv_dir = Vec3::new(inv(ray.direction.x), inv(ray.direction.y), inv(ray.direction.z));

        let t1 = (self.min - ray.origin) * inv_dir;
        let t2 = (self.max - ray.origin) * inv_dir;

        let t_min_v = t1.min(t2);
        let t_max_v = t1.max(t2);

        let t_near = t_min_v.max_element();
        let t_far = t_max_v.min_element();

        if t_near > t_far || t_far < ray.t_min {
            return None;
        }

        let t = if t_near >= ray.t_min { t_near } else { t_far };
        if t > ray.t_max {
            return None;
        }

        let point = ray.at(t);
        Some(RayHit {
            distance: t,
            point,
            normal: self.surface_normal(point),
        })
    }

    fn bounds(&self) -> BoxCollider {
        *self
    }

    fn render_shape(&self) -> ColliderShape {
        ColliderShape::Box {
            center: self.center(),
            half_extents: self.half_extents(),
        }
    }

    fn clone_box(&self) -> Box<dyn Collider> {
        Box::new(*self)
    }
}

/// Triangle soup in world space, built from a loaded model.
#[derive(Debug, Clone)]
pub struct MeshCollider {
    triangles: Arc<[[Vec3; 3]]>,
    bounds: BoxCollider,
}

impl MeshCollider {
    /// Bakes `transform` into the vertices. Returns `None` when no triangle
    /// survives (empty or out-of-range indices).
    pub fn from_indexed(positions: &[Vec3], indices: &[u32], transform: Mat4) -> Option<Self> {
        let world: Vec<Vec3> = positions.iter().map(|&p| transform.transform_point3(p)).collect();
        let triangles: Vec<[Vec3; 3]> = indices
            .chunks_exact(3)
            .filter_map(|tri| {
                Some([
                    *world.get(tri[0] as usize)?,
                    *world.get(tri[1] as usize)?,
                    *world.get(tri[2] as usize)?,
                ])
            })
            .collect();

        let corners: Vec<Vec3> = triangles.iter().flatten().copied().collect();
        let bounds = BoxCollider::enclosing(&corners)?;
        Some(Self {
            triangles: triangles.into(),
            bounds,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Möller–Trumbore, double sided.
    fn intersect_triangle(ray: &Ray, [a, b, c]: [Vec3; 3]) -> Option<(f32, Vec3)> {
        let edge1 = b - a;
        let edge2 = c - a;
        let p = ray.direction.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() < 1e-8 {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = ray.origin - a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = ray.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(q) * inv_det;
        ray.accepts(t).then(|| (t, edge1.cross(edge2).normalize_or_zero()))
    }
}

impl Collider for MeshCollider {
    fn ray_intersect(&self, ray: &Ray) -> Option<RayHit> {
        self.bounds.ray_intersect(ray)?;

        self.triangles
            .iter()
            .filter_map(|&tri| Self::intersect_triangle(ray, tri))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(t, normal)| RayHit {
                distance: t,
                point: ray.at(t),
                normal: if normal.dot(ray.direction) > 0.0 { -normal } else { normal },
            })
    }

    fn bounds(&self) -> BoxCollider {
        self.bounds
    }

    fn render_shape(&self) -> ColliderShape {
        self.bounds.render_shape()
    }

    fn clone_box(&self) -> Box<dyn Collider> {
        Box::new(self.clone())
    }
}
