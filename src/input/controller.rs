use glam::Vec3;

use super::command::{InputCommand, InputQueue, TargetRayMode};
use crate::scene::{Color, Geometry, Material, Mesh, Node, NodeContent, NodeId, Scene};

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    pub mode: TargetRayMode,
    pub select_pressed: bool,
    /// Indicator attached to the controller node, if the mode has one.
    pub indicator: Option<NodeId>,
}

/// Visual for a pointer mode: a ray for tracked pointers, a small ring one
/// unit ahead for gaze. Other modes get nothing.
pub fn build_indicator(mode: &TargetRayMode) -> Option<Mesh> {
    match mode {
        TargetRayMode::TrackedPointer => Some(Mesh {
            geometry: Geometry::pointer_line(),
            material: Material {
                vertex_colors: true,
                additive: true,
                ..Material::default()
            },
        }),
        TargetRayMode::Gaze => Some(Mesh {
            geometry: Geometry::ring(0.02, 0.04, 32).translated(Vec3::new(0.0, 0.0, -1.0)),
            material: Material {
                color: Color::WHITE,
                opacity: 0.5,
                transparent: true,
                ..Material::default()
            },
        }),
        TargetRayMode::Other(_) => None,
    }
}

/// Turns controller commands into controller state and indicator nodes.
#[derive(Debug, Clone)]
pub struct InputBridge {
    controller_node: NodeId,
    state: Option<ControllerState>,
}

impl InputBridge {
    /// Creates the controller's target-ray node under `parent`.
    pub fn new(scene: &mut Scene, parent: NodeId, offset: Vec3) -> Self {
        let controller_node = scene.add_child(parent, Node::new("controller", NodeContent::Controller).at(offset));
        Self {
            controller_node,
            state: None,
        }
    }

    pub fn controller_node(&self) -> NodeId {
        self.controller_node
    }

    pub fn controller(&self) -> Option<&ControllerState> {
        self.state.as_ref()
    }

    pub fn select_pressed(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.select_pressed)
    }

    /// Applies every queued command in order. Returns how many were applied.
    pub fn drain(&mut self, scene: &mut Scene, queue: &mut InputQueue) -> usize {
        let mut applied = 0;
        for command in queue.drain() {
            self.apply(scene, command);
            applied += 1;
        }
        applied
    }

    pub fn apply(&mut self, scene: &mut Scene, command: InputCommand) {
        match command {
            InputCommand::Connect(mode) => self.connect(scene, mode),
            InputCommand::Disconnect => self.disconnect(scene),
            InputCommand::SelectStart | InputCommand::SelectEnd => {
                let pressed = command == InputCommand::SelectStart;
                match self.state.as_mut() {
                    Some(state) => state.select_pressed = pressed,
                    None => log::debug!("{command:?} with no controller connected"),
                }
            }
        }
    }

    fn connect(&mut self, scene: &mut Scene, mode: TargetRayMode) {
        if self.state.is_some() {
            self.disconnect(scene);
        }

        let indicator = build_indicator(&mode).map(|mesh| {
            let mut node = Node::new("controller-indicator", NodeContent::Mesh(mesh));
            if mode == TargetRayMode::TrackedPointer {
                // The ray starts collapsed.
                node.local.scale.z = 0.0;
            }
            scene.add_child(self.controller_node, node)
        });

        log::info!(
            "controller connected ({mode}){}",
            if indicator.is_none() { ", no indicator" } else { "" }
        );
        self.state = Some(ControllerState {
            mode,
            select_pressed: false,
            indicator,
        });
    }

    fn disconnect(&mut self, scene: &mut Scene) {
        if let Some(state) = self.state.take() {
            if let Some(indicator) = state.indicator {
                scene.remove(indicator);
            }
            log::info!("controller disconnected ({})", state.mode);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Topology;

    fn bridge() -> (Scene, InputBridge) {
        let mut scene = Scene::new(Color::BLACK);
        let dolly = scene.add(Node::empty("dolly"));
        let bridge = InputBridge::new(&mut scene, dolly, Vec3::new(0.25, 1.2, 0.0));
        (scene, bridge)
    }

    #[test]
    fn tracked_pointer_gets_a_collapsed_line() {
        let (mut scene, mut bridge) = bridge();
        bridge.apply(&mut scene, InputCommand::Connect(TargetRayMode::TrackedPointer));

        let indicator = bridge.controller().unwrap().indicator.unwrap();
        let node = scene.get(indicator).unwrap();
        assert_eq!(node.parent(), Some(bridge.controller_node()));
        assert_eq!(node.local.scale.z, 0.0);
        match &node.content {
            NodeContent::Mesh(mesh) => {
                assert_eq!(mesh.geometry.topology, Topology::Lines);
                assert!(mesh.material.additive);
            }
            other => panic!("unexpected content {other:?}"),
        }
    }

    #[test]
    fn gaze_gets_a_translucent_ring() {
        let mesh = build_indicator(&TargetRayMode::Gaze).unwrap();
        assert_eq!(mesh.material.opacity, 0.5);
        assert!(mesh.material.transparent);
        assert_eq!(mesh.geometry.topology, Topology::Triangles);
    }

    #[test]
    fn unknown_mode_connects_without_indicator() {
        let (mut scene, mut bridge) = bridge();
        let nodes = scene.len();
        bridge.apply(&mut scene, InputCommand::Connect(TargetRayMode::from("screen")));

        assert!(bridge.controller().is_some());
        assert!(bridge.controller().unwrap().indicator.is_none());
        assert_eq!(scene.len(), nodes);
    }

    #[test]
    fn select_toggles_pressed_state() {
        let (mut scene, mut bridge) = bridge();
        let mut queue = InputQueue::new();
        queue.push(InputCommand::Connect(TargetRayMode::Gaze));
        queue.push(InputCommand::SelectStart);
        assert_eq!(bridge.drain(&mut scene, &mut queue), 2);
        assert!(bridge.select_pressed());

        queue.push(InputCommand::SelectEnd);
        bridge.drain(&mut scene, &mut queue);
        assert!(!bridge.select_pressed());
    }

    #[test]
    fn disconnect_detaches_indicator_and_clears_state() {
        let (mut scene, mut bridge) = bridge();
        bridge.apply(&mut scene, InputCommand::Connect(TargetRayMode::TrackedPointer));
        bridge.apply(&mut scene, InputCommand::SelectStart);
        let indicator = bridge.controller().unwrap().indicator.unwrap();

        bridge.apply(&mut scene, InputCommand::Disconnect);
        assert!(bridge.controller().is_none());
        assert!(!bridge.select_pressed());
        assert!(!scene.contains(indicator));
        assert!(scene.get(bridge.controller_node()).unwrap().children().is_empty());
    }

    #[test]
    fn press_without_controller_is_ignored() {
        let (mut scene, mut bridge) = bridge();
        bridge.apply(&mut scene, InputCommand::SelectStart);
        assert!(bridge.controller().is_none());
        assert!(!bridge.select_pressed());
    }

    #[test]
    fn reconnect_replaces_previous_indicator() {
        let (mut scene, mut bridge) = bridge();
        bridge.apply(&mut scene, InputCommand::Connect(TargetRayMode::TrackedPointer));
        let first = bridge.controller().unwrap().indicator.unwrap();
        bridge.apply(&mut scene, InputCommand::Connect(TargetRayMode::Gaze));

        assert!(!scene.contains(first));
        assert_eq!(bridge.controller().unwrap().mode, TargetRayMode::Gaze);
        assert_eq!(scene.get(bridge.controller_node()).unwrap().children().len(), 1);
    }
}
