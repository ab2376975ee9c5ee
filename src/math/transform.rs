use glam::{Mat4, Quat, Vec3};

/// Local pose of a scene node.
///
/// Directions follow the right-handed, -Z forward convention: a node "looks"
/// down its local -Z axis, and [`Transform::world_direction`] reports the +Z
/// axis the way scene-graph libraries conventionally do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            scale: Vec3::ONE,
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// The rotated +Z axis.
    pub fn world_direction(&self) -> Vec3 {
        (self.rotation * Vec3::Z).normalize_or_zero()
    }

    /// Moves along the node's own X axis.
    pub fn translate_x(&mut self, distance: f32) {
        self.position += self.rotation * Vec3::new(distance, 0.0, 0.0);
    }

    /// Moves along the node's own Z axis.
    pub fn translate_z(&mut self, distance: f32) {
        self.position += self.rotation * Vec3::new(0.0, 0.0, distance);
    }

    /// Rotates a local direction into the parent frame; translation is ignored.
    pub fn transform_direction(&self, direction: Vec3) -> Vec3 {
        (self.rotation * direction).normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn identity_looks_down_negative_z() {
        let t = Transform::IDENTITY;
        assert_eq!(-t.world_direction(), Vec3::NEG_Z);
    }

    #[test]
    fn translate_z_follows_rotation() {
        let mut t = Transform::from_position_rotation(Vec3::ZERO, Quat::from_rotation_y(FRAC_PI_2));
        t.translate_z(-1.0);
        // Yawed 90° left, -Z maps to -X.
        assert!((t.position - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn direction_transform_ignores_position() {
        let t = Transform::from_position_rotation(Vec3::new(10.0, 0.0, -4.0), Quat::IDENTITY);
        assert_eq!(t.transform_direction(Vec3::NEG_X), Vec3::NEG_X);
    }

    #[test]
    fn matrix_places_points() {
        let t = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_rotation_y(FRAC_PI_2),
            scale: Vec3::splat(2.0),
        };
        let p = t.to_matrix().transform_point3(Vec3::new(0.0, 0.0, -1.0));
        assert!((p - Vec3::new(-1.0, 2.0, 3.0)).length() < 1e-5);
    }
}
