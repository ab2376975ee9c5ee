//! Controller-driven walking with ray-cast wall avoidance.
//!
//! While select is held the dolly walks toward where the head is looking.
//! One ray probes ahead and blocks the step when a wall is within the wall
//! limit; two rays probe sideways and push the dolly back out to the limit.
//! Only the position survives a step: the dolly is turned to the head pose to
//! derive directions and turned back before returning, and its height is
//! pinned to the ground level.
//!
//! Both side corrections apply independently, so in a corridor narrower than
//! twice the wall limit the pushes add up and can overshoot.

use glam::Vec3;

use crate::collision::ColliderSet;
use crate::config::LocomotionConfig;
use crate::math::Transform;
use crate::scene::{DollyRig, Scene};

/// What one step did, for logging and the HUD.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepReport {
    pub moved_forward: bool,
    /// Nearest hit ahead of the raised probe, if any.
    pub forward_distance: Option<f32>,
    /// Signed translation applied along the dolly's X axis by the left probe.
    pub left_correction: f32,
    /// Signed translation applied along the dolly's X axis by the right probe.
    pub right_correction: f32,
}

impl StepReport {
    pub fn corrected(&self) -> bool {
        self.left_correction != 0.0 || self.right_correction != 0.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Locomotion {
    config: LocomotionConfig,
}

impl Locomotion {
    pub fn new(config: LocomotionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    /// Advances the dolly for one frame.
    ///
    /// Does nothing and returns `None` when select is not held, when there is
    /// no collider set, or when the rig's nodes are missing from `scene`.
    pub fn step(
        &self,
        scene: &mut Scene,
        rig: &DollyRig,
        colliders: Option<&ColliderSet>,
        select_pressed: bool,
        dt: f32,
    ) -> Option<StepReport> {
        if !select_pressed {
            return None;
        }
        let colliders = colliders?;
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let limit = self.config.wall_limit;

        // Read before the dolly is turned: the head pose includes the dolly's
        // own rotation.
        let head = rig.head_orientation(scene)?;
        let dolly = scene.local_mut(rig.dolly)?;
        let saved_rotation = dolly.rotation;
        let probe = dolly.position + Vec3::Y * self.config.eye_height;
        dolly.rotation = head;

        let facing = Transform::from_position_rotation(Vec3::ZERO, scene.world_rotation(rig.dolly)?);
        let forward = -facing.world_direction();

        let mut report = StepReport {
            forward_distance: colliders.nearest_distance(probe, forward),
            ..StepReport::default()
        };
        let blocked = report.forward_distance.is_some_and(|d| d < limit);

        if !blocked {
            scene.local_mut(rig.dolly)?.translate_z(-dt * self.config.speed);
            report.moved_forward = true;
        }

        let probe = scene.world_position(rig.dolly)?;
        let left = facing.transform_direction(Vec3::NEG_X);
        let right = facing.transform_direction(Vec3::X);

        if let Some(d) = colliders.nearest_distance(probe, left).filter(|&d| d < limit) {
            report.left_correction = limit - d;
        }
        if let Some(d) = colliders.nearest_distance(probe, right).filter(|&d| d < limit) {
            report.right_correction = d - limit;
        }

        let dolly = scene.local_mut(rig.dolly)?;
        dolly.translate_x(report.left_correction);
        dolly.translate_x(report.right_correction);
        dolly.position.y = self.config.ground_level;
        dolly.rotation = saved_rotation;

        log::debug!(
            "locomotion: forward {} (hit {:?}), side {:+.3}/{:+.3}, at {:?}",
            if blocked { "blocked" } else { "moved" },
            report.forward_distance,
            report.left_correction,
            report.right_correction,
            dolly.position
        );

        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Color, PerspectiveCamera};
    use glam::Quat;

    fn rig_at(position: Vec3) -> (Scene, DollyRig) {
        let mut scene = Scene::new(Color::BLACK);
        let rig = DollyRig::attach(&mut scene, position, Vec3::new(0.0, 1.6, 0.0), PerspectiveCamera::default());
        (scene, rig)
    }

    #[test]
    fn missing_collider_set_is_a_no_op() {
        let (mut scene, rig) = rig_at(Vec3::new(0.0, 0.4, 0.0));
        let before = *scene.local(rig.dolly).unwrap();

        assert!(Locomotion::default().step(&mut scene, &rig, None, true, 0.5).is_none());
        assert_eq!(*scene.local(rig.dolly).unwrap(), before);
    }

    #[test]
    fn walks_where_the_head_looks() {
        let (mut scene, rig) = rig_at(Vec3::ZERO);
        rig.set_head_rotation(&mut scene, Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));

        let report = Locomotion::default()
            .step(&mut scene, &rig, Some(&ColliderSet::new()), true, 0.5)
            .unwrap();

        assert!(report.moved_forward);
        let position = scene.local(rig.dolly).unwrap().position;
        // Head turned 90° left: forward is -X; 2 u/s for 0.5 s.
        assert!((position - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-5);
        assert_eq!(scene.local(rig.dolly).unwrap().rotation, Quat::IDENTITY);
    }

    #[test]
    fn nan_delta_does_not_move() {
        let (mut scene, rig) = rig_at(Vec3::ZERO);
        Locomotion::default().step(&mut scene, &rig, Some(&ColliderSet::new()), true, f32::NAN);
        assert_eq!(scene.local(rig.dolly).unwrap().position, Vec3::ZERO);
    }
}
