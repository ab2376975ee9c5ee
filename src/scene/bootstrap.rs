use std::sync::Arc;

use glam::{Quat, Vec3};

use super::camera::PerspectiveCamera;
use super::geometry::{Color, Geometry, Material, Mesh};
use super::graph::{Node, NodeContent, NodeId, Scene};
use super::rig::DollyRig;
use crate::assets::ModelData;
use crate::collision::{ColliderSet, MeshCollider};
use crate::config::{AppConfig, ColliderConfig, ModelPlacement};
use crate::math::Transform;

/// Everything the frame loop needs from scene setup.
#[derive(Debug, Clone)]
pub struct Stage {
    pub scene: Scene,
    pub rig: DollyRig,
    pub colliders: ColliderSet,
    pub video_screen: NodeId,
}

impl Stage {
    /// Lights, camera rig, video screen and static colliders. Models are
    /// placed later, once loaded.
    pub fn build(config: &AppConfig, aspect: f32) -> Self {
        let mut scene = Scene::new(Color::from_hex(config.scene.background));

        scene.add(Node::new(
            "hemisphere-light",
            NodeContent::HemisphereLight {
                sky: Color::from_hex(config.scene.hemisphere_sky),
                ground: Color::from_hex(config.scene.hemisphere_ground),
            },
        ));
        scene.add(
            Node::new(
                "directional-light",
                NodeContent::DirectionalLight {
                    color: Color::from_hex(config.scene.directional_color),
                },
            )
            .at(config.scene.directional_position),
        );

        let camera = PerspectiveCamera::new(
            config.camera.fov_degrees,
            aspect,
            config.camera.near,
            config.camera.far,
        );
        let rig = DollyRig::attach(&mut scene, config.dolly.position, config.camera.position, camera);

        let video = &config.video;
        let video_screen = scene.add(
            Node::new(
                "video-screen",
                NodeContent::Mesh(Mesh {
                    geometry: Geometry::circle(video.radius, video.segments),
                    material: Material {
                        color: Color::from_hex(video.color),
                        ..Material::default()
                    },
                }),
            )
            .at(video.position),
        );

        let mut colliders = ColliderSet::new();
        for collider in &config.colliders {
            match *collider {
                ColliderConfig::Box { center, half_extents } => colliders.add_box(center, half_extents),
                ColliderConfig::Sphere { center, radius } => colliders.add_sphere(center, radius),
            }
        }

        log::info!(
            "stage ready: {} nodes, {} static colliders",
            scene.len(),
            colliders.len()
        );

        Self {
            scene,
            rig,
            colliders,
            video_screen,
        }
    }

    /// Adds a loaded model at its configured position; collidable models
    /// also join the collider set.
    pub fn place_model(&mut self, placement: &ModelPlacement, model: Arc<ModelData>) -> NodeId {
        let transform = Transform::from_position_rotation(placement.position, Quat::IDENTITY);

        if placement.collidable {
            match MeshCollider::from_indexed(&model.positions, &model.indices, transform.to_matrix()) {
                Some(collider) => {
                    log::info!(
                        "{} adds {} collider triangles",
                        placement.file,
                        collider.triangle_count()
                    );
                    self.colliders.add(collider);
                }
                None => log::warn!("{} has no usable triangles to collide with", placement.file),
            }
        }

        self.scene.add(
            Node::new(placement.file.clone(), NodeContent::Model(model)).with_transform(transform),
        )
    }

    pub fn dolly_position(&self) -> Vec3 {
        self.scene
            .local(self.rig.dolly)
            .map(|t| t.position)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::BoxCollider;

    fn cube_model() -> Arc<ModelData> {
        let positions = vec![
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(1.0, 2.0, -1.0),
            Vec3::new(-1.0, 2.0, -1.0),
        ];
        Arc::new(ModelData {
            name: "wall.glb".into(),
            indices: vec![0, 1, 2, 0, 2, 3],
            bounds: BoxCollider::enclosing(&positions).unwrap(),
            positions,
        })
    }

    #[test]
    fn build_places_rig_and_screen_from_config() {
        let stage = Stage::build(&AppConfig::default(), 1.5);

        assert_eq!(stage.dolly_position(), Vec3::new(0.0, 0.0, -2.0));
        let camera_world = stage.scene.world_position(stage.rig.camera).unwrap();
        assert!((camera_world - Vec3::new(0.0, 1.6, 1.0)).length() < 1e-5);
        assert_eq!(stage.rig.perspective(&stage.scene).unwrap().aspect, 1.5);
        assert_eq!(
            stage.scene.world_position(stage.video_screen),
            Some(Vec3::new(-3.5, 12.25, -50.0))
        );
        assert!(stage.colliders.is_empty());
    }

    #[test]
    fn collidable_models_extend_the_collider_set() {
        let mut stage = Stage::build(&AppConfig::default(), 1.0);
        let wall = ModelPlacement::new("wall.glb", Vec3::new(0.0, 0.0, -3.0)).collidable();
        let prop = ModelPlacement::new("egg.glb", Vec3::new(-3.5, 0.0, -25.0));

        stage.place_model(&wall, cube_model());
        stage.place_model(&prop, cube_model());

        assert_eq!(stage.colliders.len(), 1);
        let distance = stage
            .colliders
            .nearest_distance(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Z)
            .unwrap();
        assert!((distance - 4.0).abs() < 1e-5);
        assert!(stage.scene.find("egg.glb").is_some());
    }
}
