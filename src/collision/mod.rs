mod collider;
mod raycast;
mod set;

pub use collider::{BoxCollider, Collider, ColliderShape, MeshCollider, SphereCollider};
pub use raycast::{Ray, RayHit};
pub use set::ColliderSet;
