use glam::{Quat, Vec3};

use super::camera::PerspectiveCamera;
use super::graph::{Node, NodeContent, NodeId, Scene};

/// The user's body in the scene: a dolly carrying the camera, with a head
/// proxy under the camera for reading the headset's world orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DollyRig {
    pub dolly: NodeId,
    pub camera: NodeId,
    pub head_proxy: NodeId,
}

impl DollyRig {
    pub fn attach(
        scene: &mut Scene,
        dolly_position: Vec3,
        camera_offset: Vec3,
        camera: PerspectiveCamera,
    ) -> Self {
        let dolly = scene.add(Node::empty("dolly").at(dolly_position));
        let camera = scene.add_child(
            dolly,
            Node::new("camera", NodeContent::Camera(camera)).at(camera_offset),
        );
        let head_proxy = scene.add_child(camera, Node::empty("head-proxy"));
        Self {
            dolly,
            camera,
            head_proxy,
        }
    }

    pub fn head_orientation(&self, scene: &Scene) -> Option<Quat> {
        scene.world_rotation(self.head_proxy)
    }

    /// Sets the tracked head rotation (camera relative to the dolly).
    pub fn set_head_rotation(&self, scene: &mut Scene, rotation: Quat) {
        if let Some(local) = scene.local_mut(self.camera) {
            local.rotation = rotation.normalize();
        }
    }

    pub fn perspective<'a>(&self, scene: &'a Scene) -> Option<&'a PerspectiveCamera> {
        match &scene.get(self.camera)?.content {
            NodeContent::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    pub fn set_aspect(&self, scene: &mut Scene, aspect: f32) {
        if let Some(NodeContent::Camera(camera)) = scene.get_mut(self.camera).map(|n| &mut n.content) {
            camera.set_aspect(aspect);
        }
    }
}
