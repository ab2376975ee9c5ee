use glam::Mat4;

/// Perspective projection; the view comes from the owning node's world
/// transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            fov: 50.0_f32.to_radians(),
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl PerspectiveCamera {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov: fov_degrees.to_radians(),
            aspect,
            near,
            far,
        }
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    /// `world` is the camera node's world matrix.
    pub fn view_projection(&self, world: Mat4) -> Mat4 {
        self.projection_matrix() * world.inverse()
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};

    #[test]
    fn point_ahead_projects_to_screen_center() {
        let camera = PerspectiveCamera::new(50.0, 16.0 / 9.0, 0.1, 100.0);
        let world = Mat4::from_translation(Vec3::new(0.0, 1.6, 3.0));
        let clip = camera.view_projection(world) * Vec4::new(0.0, 1.6, -5.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn degenerate_aspect_is_ignored() {
        let mut camera = PerspectiveCamera::default();
        camera.set_aspect(0.0);
        assert_eq!(camera.aspect, 1.0);
    }
}
