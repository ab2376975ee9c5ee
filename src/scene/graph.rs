use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};

use super::camera::PerspectiveCamera;
use super::geometry::{Color, Mesh};
use crate::assets::ModelData;
use crate::math::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub enum NodeContent {
    /// Pure transform, e.g. the dolly or the head proxy.
    Empty,
    Camera(PerspectiveCamera),
    HemisphereLight { sky: Color, ground: Color },
    DirectionalLight { color: Color },
    Mesh(Mesh),
    Model(Arc<ModelData>),
    /// Target-ray space of a hand controller.
    Controller,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub local: Transform,
    pub content: NodeContent,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: impl Into<String>, content: NodeContent) -> Self {
        Self {
            name: name.into(),
            local: Transform::IDENTITY,
            content,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, NodeContent::Empty)
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.local.position = position;
        self
    }

    pub fn with_transform(mut self, local: Transform) -> Self {
        self.local = local;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Arena-backed scene graph. Removed nodes leave an empty slot so ids held
/// elsewhere never alias a different node.
#[derive(Debug, Clone)]
pub struct Scene {
    pub background: Color,
    nodes: Vec<Option<Node>>,
}

impl Scene {
    pub fn new(background: Color) -> Self {
        Self {
            background,
            nodes: Vec::new(),
        }
    }

    /// Adds a top-level node.
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node {
            parent: None,
            children: Vec::new(),
            ..node
        }));
        id
    }

    /// Adds `node` under `parent`. A missing parent makes it top-level.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = self.add(node);
        self.attach(id, parent);
        id
    }

    /// Re-parents `child` under `parent`, keeping its local transform.
    pub fn attach(&mut self, child: NodeId, parent: NodeId) {
        if child == parent || !self.contains(parent) || self.is_ancestor(child, parent) {
            return;
        }
        self.detach(child);
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        } else {
            return;
        }
        if let Some(p) = self.get_mut(parent) {
            p.children.push(child);
        }
    }

    /// Unlinks `id` from its parent; it stays in the scene as a top-level node.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.get(id).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.get_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        if let Some(node) = self.get_mut(id) {
            node.parent = None;
        }
    }

    /// Removes `id` and its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        self.detach(id);
        let node = self.nodes.get_mut(id.0)?.take()?;
        for &child in &node.children {
            self.remove_subtree(child);
        }
        Some(node)
    }

    fn remove_subtree(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id.0).and_then(Option::take) {
            for child in node.children {
                self.remove_subtree(child);
            }
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn local(&self, id: NodeId) -> Option<&Transform> {
        self.get(id).map(|n| &n.local)
    }

    pub fn local_mut(&mut self, id: NodeId) -> Option<&mut Transform> {
        self.get_mut(id).map(|n| &mut n.local)
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.iter().find(|(_, n)| n.name == name).map(|(id, _)| id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|n| (NodeId(i), n)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.get(id).and_then(|n| n.parent);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.get(p).and_then(|n| n.parent);
        }
        false
    }

    /// Composes parent * local up the chain.
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let node = self.get(id)?;
        let local = node.local.to_matrix();
        Some(match node.parent.and_then(|p| self.world_matrix(p)) {
            Some(parent) => parent * local,
            None => local,
        })
    }

    pub fn world_position(&self, id: NodeId) -> Option<Vec3> {
        self.world_matrix(id).map(|m| m.w_axis.truncate())
    }

    /// Product of the rotations along the parent chain.
    pub fn world_rotation(&self, id: NodeId) -> Option<Quat> {
        let node = self.get(id)?;
        Some(match node.parent.and_then(|p| self.world_rotation(p)) {
            Some(parent) => parent * node.local.rotation,
            None => node.local.rotation,
        })
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(Color::BLACK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn world_matrix_composes_parents() {
        let mut scene = Scene::default();
        let dolly = scene.add(Node::empty("dolly").at(Vec3::new(0.0, 0.0, -2.0)));
        let camera = scene.add_child(dolly, Node::empty("camera").at(Vec3::new(0.0, 1.6, 3.0)));

        let world = scene.world_position(camera).unwrap();
        assert!((world - Vec3::new(0.0, 1.6, 1.0)).length() < 1e-5);
    }

    #[test]
    fn world_rotation_multiplies_chain() {
        let mut scene = Scene::default();
        let yaw = Quat::from_rotation_y(FRAC_PI_2);
        let pitch = Quat::from_rotation_x(0.2);
        let dolly = scene.add(Node::empty("dolly").with_transform(Transform::from_position_rotation(Vec3::ZERO, yaw)));
        let head = scene.add_child(dolly, Node::empty("head").with_transform(Transform::from_position_rotation(Vec3::ZERO, pitch)));

        assert!(scene.world_rotation(head).unwrap().abs_diff_eq(yaw * pitch, 1e-6));
    }

    #[test]
    fn remove_drops_subtree_and_unlinks_parent() {
        let mut scene = Scene::default();
        let controller = scene.add(Node::new("controller", NodeContent::Controller));
        let indicator = scene.add_child(controller, Node::empty("indicator"));
        let tip = scene.add_child(indicator, Node::empty("tip"));

        scene.remove(indicator);
        assert!(scene.get(controller).unwrap().children().is_empty());
        assert!(!scene.contains(indicator));
        assert!(!scene.contains(tip));
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn attach_refuses_cycles() {
        let mut scene = Scene::default();
        let a = scene.add(Node::empty("a"));
        let b = scene.add_child(a, Node::empty("b"));

        scene.attach(a, b);
        assert_eq!(scene.get(a).unwrap().parent(), None);
        assert_eq!(scene.get(b).unwrap().parent(), Some(a));
        assert_eq!(scene.find("b"), Some(b));
    }
}
