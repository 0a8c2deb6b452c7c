use engine::scene::{NodeId, SharedMaterial};
use rapier3d::prelude::SharedShape;

use crate::{input_context::Handedness, physics::BodyParams};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// Who currently parents an entity's node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Owner {
    World,
    Controller(Handedness),
}

pub struct GrabbableEntity {
    pub id: EntityId,
    pub node: NodeId,
    pub shape: SharedShape,
    pub body: BodyParams,
    pub owner: Owner,
    /// The material the node had before a grab swapped in a highlighted copy.
    pub original_material: Option<SharedMaterial>,
}

impl GrabbableEntity {
    pub fn is_held(&self) -> bool {
        matches!(self.owner, Owner::Controller(_))
    }

    pub fn holder(&self) -> Option<Handedness> {
        match self.owner {
            Owner::World => None,
            Owner::Controller(hand) => Some(hand),
        }
    }
}

/// The grabbable set, in insertion order.
#[derive(Default)]
pub struct GrabbableSet {
    entities: Vec<GrabbableEntity>,
    next_id: u32,
}

impl GrabbableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a world-owned entity. Ids are never reused.
    pub fn insert(&mut self, node: NodeId, shape: SharedShape, body: BodyParams) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entities.push(GrabbableEntity {
            id,
            node,
            shape,
            body,
            owner: Owner::World,
            original_material: None,
        });
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&GrabbableEntity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut GrabbableEntity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn by_node(&self, node: NodeId) -> Option<&GrabbableEntity> {
        self.entities.iter().find(|e| e.node == node)
    }

    pub fn get_index(&self, index: usize) -> Option<&GrabbableEntity> {
        self.entities.get(index)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<GrabbableEntity> {
        let index = self.entities.iter().position(|e| e.id == id)?;
        Some(self.entities.remove(index))
    }

    /// Remove by position, preserving the order of the rest.
    pub fn remove_index(&mut self, index: usize) -> Option<GrabbableEntity> {
        (index < self.entities.len()).then(|| self.entities.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &GrabbableEntity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Matrix4;
    use engine::scene::SceneGraph;

    #[test]
    fn test_ids_are_not_reused() {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let a = scene.add_node(root, "a", Matrix4::from_scale(1.0)).unwrap();
        let b = scene.add_node(root, "b", Matrix4::from_scale(1.0)).unwrap();

        let mut set = GrabbableSet::new();
        let first = set.insert(a, SharedShape::ball(0.1), BodyParams::default());
        assert!(set.remove(first).is_some());
        let second = set.insert(b, SharedShape::ball(0.1), BodyParams::default());

        assert_ne!(first, second);
        assert!(set.get(first).is_none());
        assert_eq!(set.by_node(b).map(|e| e.id), Some(second));
        assert_eq!(set.get(second).unwrap().owner, Owner::World);
    }

    #[test]
    fn test_remove_index_out_of_range() {
        let mut set = GrabbableSet::new();
        assert!(set.remove_index(0).is_none());
    }
}
