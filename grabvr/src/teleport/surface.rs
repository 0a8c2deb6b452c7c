use engine::scene::NodeId;
use rapier3d::prelude::SharedShape;

pub struct TeleportSurface {
    pub node: NodeId,
    pub shape: SharedShape,
}

/// Static geometry that can be teleported onto. Kept apart from the grabbable
/// set so teleport rays never consider pickable objects.
#[derive(Default)]
pub struct TeleportSurfaceSet {
    surfaces: Vec<TeleportSurface>,
}

impl TeleportSurfaceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: NodeId, shape: SharedShape) {
        self.surfaces.push(TeleportSurface { node, shape });
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.surfaces.iter().any(|s| s.node == node)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TeleportSurface> {
        self.surfaces.iter()
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}
