use std::fmt;

use cgmath::{Matrix4, SquareMatrix, Vector3};
use slotmap::{new_key_type, SlotMap};

use crate::scene::SharedMaterial;
use crate::scene_log;
use crate::util;

new_key_type! {
    pub struct NodeId;
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneError {
    NodeNotFound(NodeId),
    /// The target parent's world matrix cannot be inverted (zero scale somewhere up the chain).
    NonInvertibleParent(NodeId),
    CannotMoveRoot,
    /// The new parent lives inside the subtree being moved.
    Cycle { node: NodeId, new_parent: NodeId },
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::NodeNotFound(node) => write!(f, "scene node {:?} not found", node),
            SceneError::NonInvertibleParent(node) => {
                write!(f, "world matrix of parent {:?} is not invertible", node)
            }
            SceneError::CannotMoveRoot => write!(f, "the scene root cannot be moved or removed"),
            SceneError::Cycle { node, new_parent } => write!(
                f,
                "cannot parent {:?} under its own descendant {:?}",
                node, new_parent
            ),
        }
    }
}

impl std::error::Error for SceneError {}

pub struct Node {
    pub name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    local_transform: Matrix4<f32>,
    world_matrix: Matrix4<f32>,
    pub material: Option<SharedMaterial>,
    pub visible: bool,
    /// Transient pointer-hover flag, reset by whoever set it.
    pub hovered: bool,
}

impl Node {
    fn new(name: String, parent: Option<NodeId>, local_transform: Matrix4<f32>) -> Self {
        Self {
            name,
            parent,
            children: Vec::new(),
            local_transform,
            world_matrix: local_transform,
            material: None,
            visible: true,
            hovered: false,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn local_transform(&self) -> Matrix4<f32> {
        self.local_transform
    }

    /// Cached world matrix as of the last `update_world_matrix` touching this node.
    pub fn world_matrix(&self) -> Matrix4<f32> {
        self.world_matrix
    }
}

/// Node hierarchy with local transforms and cached world matrices.
///
/// Cached world matrices are refreshed explicitly (`update_world_matrix` /
/// `update_world_matrices`), mirroring a renderer that recomputes them once per frame.
/// `compute_world_matrix` always walks the parent chain and is never stale.
pub struct SceneGraph {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
}

impl SceneGraph {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::new("scene".to_string(), None, Matrix4::identity()));
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        // The root always exists.
        false
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    pub fn node(&self, node: NodeId) -> Option<&Node> {
        self.nodes.get(node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    pub fn add_node(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        local_transform: Matrix4<f32>,
    ) -> Result<NodeId, SceneError> {
        let parent_world = self
            .nodes
            .get(parent)
            .map(|p| p.world_matrix)
            .ok_or(SceneError::NodeNotFound(parent))?;

        let mut node = Node::new(name.into(), Some(parent), local_transform);
        node.world_matrix = parent_world * local_transform;
        let id = self.nodes.insert(node);
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(id);
        }
        Ok(id)
    }

    pub fn set_local_transform(
        &mut self,
        node: NodeId,
        transform: Matrix4<f32>,
    ) -> Result<(), SceneError> {
        let n = self.nodes.get_mut(node).ok_or(SceneError::NodeNotFound(node))?;
        n.local_transform = transform;
        Ok(())
    }

    /// Replace the scale of a node's local transform, keeping translation and rotation.
    pub fn set_local_scale(&mut self, node: NodeId, scale: Vector3<f32>) -> Result<(), SceneError> {
        let n = self.nodes.get_mut(node).ok_or(SceneError::NodeNotFound(node))?;
        let (position, rotation, _) = util::decompose(&n.local_transform);
        n.local_transform = util::compose(position, rotation, scale);
        Ok(())
    }

    pub fn world_matrix(&self, node: NodeId) -> Option<Matrix4<f32>> {
        self.nodes.get(node).map(|n| n.world_matrix)
    }

    pub fn world_position(&self, node: NodeId) -> Option<Vector3<f32>> {
        self.world_matrix(node)
            .map(|m| util::get_position_from_matrix(&m))
    }

    /// World matrix from the current local transforms of the node and all its ancestors.
    pub fn compute_world_matrix(&self, node: NodeId) -> Result<Matrix4<f32>, SceneError> {
        let mut current = self.nodes.get(node).ok_or(SceneError::NodeNotFound(node))?;
        let mut world = current.local_transform;
        while let Some(parent) = current.parent {
            current = self
                .nodes
                .get(parent)
                .ok_or(SceneError::NodeNotFound(parent))?;
            world = current.local_transform * world;
        }
        Ok(world)
    }

    /// Recompute cached world matrices for `node` and its whole subtree.
    pub fn update_world_matrix(&mut self, node: NodeId) -> Result<(), SceneError> {
        let world = self.compute_world_matrix(node)?;
        let mut pending = vec![(node, world)];

        while let Some((id, world)) = pending.pop() {
            let Some(n) = self.nodes.get_mut(id) else {
                continue;
            };
            n.world_matrix = world;
            let children = n.children.clone();
            for child in children {
                if let Some(c) = self.nodes.get(child) {
                    pending.push((child, world * c.local_transform));
                }
            }
        }
        Ok(())
    }

    pub fn update_world_matrices(&mut self) {
        let root = self.root;
        // The root always exists, so this cannot fail.
        let _ = self.update_world_matrix(root);
    }

    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Move `node` under `new_parent` without changing where it is in the world.
    ///
    /// The node's world matrix is decomposed against the parent's inverse world
    /// matrix, so the new local transform places it exactly at its previous pose.
    pub fn reparent(&mut self, node: NodeId, new_parent: NodeId) -> Result<(), SceneError> {
        if node == self.root {
            return Err(SceneError::CannotMoveRoot);
        }
        if !self.contains(new_parent) {
            return Err(SceneError::NodeNotFound(new_parent));
        }
        if node == new_parent || self.is_ancestor(node, new_parent) {
            return Err(SceneError::Cycle { node, new_parent });
        }

        let world = self.compute_world_matrix(node)?;
        let parent_world = self.compute_world_matrix(new_parent)?;
        let inverse_parent = parent_world
            .invert()
            .ok_or(SceneError::NonInvertibleParent(new_parent))?;
        let local = inverse_parent * world;

        let old_parent = self.parent(node);
        if let Some(old_parent) = old_parent.and_then(|p| self.nodes.get_mut(p)) {
            old_parent.children.retain(|c| *c != node);
        }
        if let Some(parent) = self.nodes.get_mut(new_parent) {
            parent.children.push(node);
        }
        if let Some(n) = self.nodes.get_mut(node) {
            n.parent = Some(new_parent);
            n.local_transform = local;
        }

        scene_log!(
            TRACE,
            "reparented {:?} from {:?} to {:?}",
            node,
            old_parent,
            new_parent
        );
        Ok(())
    }

    /// Remove `node` and everything below it. Returns the removed ids, `node` first.
    pub fn detach(&mut self, node: NodeId) -> Result<Vec<NodeId>, SceneError> {
        if node == self.root {
            return Err(SceneError::CannotMoveRoot);
        }
        let parent = self
            .nodes
            .get(node)
            .ok_or(SceneError::NodeNotFound(node))?
            .parent;
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|c| *c != node);
        }

        let mut removed = Vec::new();
        let mut pending = vec![node];
        while let Some(id) = pending.pop() {
            if let Some(n) = self.nodes.remove(id) {
                pending.extend(n.children);
                removed.push(id);
            }
        }
        Ok(removed)
    }

    pub fn set_visible(&mut self, node: NodeId, visible: bool) -> Result<(), SceneError> {
        let n = self.nodes.get_mut(node).ok_or(SceneError::NodeNotFound(node))?;
        n.visible = visible;
        Ok(())
    }

    pub fn is_visible(&self, node: NodeId) -> bool {
        self.nodes.get(node).map(|n| n.visible).unwrap_or(false)
    }

    pub fn set_hovered(&mut self, node: NodeId, hovered: bool) -> Result<(), SceneError> {
        let n = self.nodes.get_mut(node).ok_or(SceneError::NodeNotFound(node))?;
        n.hovered = hovered;
        Ok(())
    }

    pub fn is_hovered(&self, node: NodeId) -> bool {
        self.nodes.get(node).map(|n| n.hovered).unwrap_or(false)
    }

    pub fn material(&self, node: NodeId) -> Option<SharedMaterial> {
        self.nodes.get(node).and_then(|n| n.material.clone())
    }

    pub fn set_material(
        &mut self,
        node: NodeId,
        material: Option<SharedMaterial>,
    ) -> Result<(), SceneError> {
        let n = self.nodes.get_mut(node).ok_or(SceneError::NodeNotFound(node))?;
        n.material = material;
        Ok(())
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{vec3, Deg, InnerSpace, Quaternion, Rotation3};

    fn near(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-4
    }

    fn translation(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::from_translation(vec3(x, y, z))
    }

    #[test]
    fn test_add_node_computes_world_matrix() {
        let mut scene = SceneGraph::new();
        let group = scene
            .add_node(scene.root(), "group", translation(0.0, 1.0, 0.0))
            .unwrap();
        let child = scene.add_node(group, "child", translation(1.0, 0.0, 0.0)).unwrap();

        assert!(near(scene.world_position(child).unwrap(), vec3(1.0, 1.0, 0.0)));
        assert_eq!(scene.parent(child), Some(group));
    }

    #[test]
    fn test_reparent_preserves_world_pose() {
        let mut scene = SceneGraph::new();
        let world = scene.add_node(scene.root(), "world", Matrix4::identity()).unwrap();
        let item = scene.add_node(world, "item", translation(1.0, 1.0, 1.0)).unwrap();

        let hand_transform = Matrix4::from_translation(vec3(0.0, 1.0, 0.0))
            * Matrix4::from(Quaternion::from_angle_y(Deg(40.0)));
        let hand = scene.add_node(scene.root(), "hand", hand_transform).unwrap();

        scene.reparent(item, hand).unwrap();
        scene.update_world_matrix(item).unwrap();

        assert_eq!(scene.parent(item), Some(hand));
        assert!(scene.node(hand).unwrap().children().contains(&item));
        assert!(!scene.node(world).unwrap().children().contains(&item));
        assert!(near(scene.world_position(item).unwrap(), vec3(1.0, 1.0, 1.0)));

        // Moving the new parent carries the child along.
        let moved = Matrix4::from_translation(vec3(0.0, 2.0, 0.0))
            * Matrix4::from(Quaternion::from_angle_y(Deg(40.0)));
        scene.set_local_transform(hand, moved).unwrap();
        scene.update_world_matrices();
        assert!(near(scene.world_position(item).unwrap(), vec3(1.0, 2.0, 1.0)));
    }

    #[test]
    fn test_reparent_rejects_cycles_and_root() {
        let mut scene = SceneGraph::new();
        let a = scene.add_node(scene.root(), "a", Matrix4::identity()).unwrap();
        let b = scene.add_node(a, "b", Matrix4::identity()).unwrap();

        assert_eq!(scene.reparent(a, b), Err(SceneError::Cycle { node: a, new_parent: b }));
        assert_eq!(scene.reparent(a, a), Err(SceneError::Cycle { node: a, new_parent: a }));
        let root = scene.root();
        assert_eq!(scene.reparent(root, a), Err(SceneError::CannotMoveRoot));
    }

    #[test]
    fn test_reparent_under_zero_scale_parent_fails_without_change() {
        let mut scene = SceneGraph::new();
        let item = scene
            .add_node(scene.root(), "item", translation(1.0, 0.0, 0.0))
            .unwrap();
        let flat = scene
            .add_node(scene.root(), "flat", Matrix4::from_nonuniform_scale(1.0, 0.0, 1.0))
            .unwrap();

        assert_eq!(
            scene.reparent(item, flat),
            Err(SceneError::NonInvertibleParent(flat))
        );
        assert_eq!(scene.parent(item), Some(scene.root()));
    }

    #[test]
    fn test_detach_removes_subtree() {
        let mut scene = SceneGraph::new();
        let a = scene.add_node(scene.root(), "a", Matrix4::identity()).unwrap();
        let b = scene.add_node(a, "b", Matrix4::identity()).unwrap();
        let c = scene.add_node(b, "c", Matrix4::identity()).unwrap();

        let removed = scene.detach(a).unwrap();

        assert_eq!(removed.len(), 3);
        assert_eq!(removed[0], a);
        assert!(!scene.contains(b));
        assert!(!scene.contains(c));
        assert!(scene.node(scene.root()).unwrap().children().is_empty());
        assert_eq!(scene.detach(a), Err(SceneError::NodeNotFound(a)));
    }

    #[test]
    fn test_cached_world_matrix_waits_for_update() {
        let mut scene = SceneGraph::new();
        let a = scene.add_node(scene.root(), "a", Matrix4::identity()).unwrap();

        scene.set_local_transform(a, translation(0.0, 3.0, 0.0)).unwrap();
        assert!(near(scene.world_position(a).unwrap(), vec3(0.0, 0.0, 0.0)));
        assert!(near(
            util::get_position_from_matrix(&scene.compute_world_matrix(a).unwrap()),
            vec3(0.0, 3.0, 0.0)
        ));

        scene.update_world_matrices();
        assert!(near(scene.world_position(a).unwrap(), vec3(0.0, 3.0, 0.0)));
    }

    #[test]
    fn test_set_local_scale_keeps_translation() {
        let mut scene = SceneGraph::new();
        let ray = scene
            .add_node(scene.root(), "ray", translation(0.0, 0.0, -0.1))
            .unwrap();

        scene.set_local_scale(ray, vec3(1.0, 1.0, 4.0)).unwrap();
        scene.update_world_matrix(ray).unwrap();

        let scale = util::get_scale_from_matrix(&scene.world_matrix(ray).unwrap());
        assert!(near(scale, vec3(1.0, 1.0, 4.0)));
        assert!(near(scene.world_position(ray).unwrap(), vec3(0.0, 0.0, -0.1)));
    }
}
