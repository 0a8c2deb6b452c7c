use cgmath::{Matrix4, SquareMatrix, Vector3, Zero};
use engine::{scene::NodeId, util::get_position_from_matrix};

use crate::{
    entity::EntityId,
    input_context::{Handedness, TargetRayMode},
    raycast::PointerRay,
};

/// Everything the interaction layer tracks about one physical controller.
pub struct ControllerState {
    pub hand: Handedness,
    pub node: NodeId,
    /// Child of `node` whose length is scaled to the pointed-at distance.
    pub ray_indicator: Option<NodeId>,
    pub world_transform: Matrix4<f32>,
    pub previous_position: Option<Vector3<f32>>,
    pub velocity: Vector3<f32>,
    /// Squeeze is held and teleport aiming is active.
    pub aiming: bool,
    pub held: Option<EntityId>,
    pub target_ray_mode: TargetRayMode,
    pub connected: bool,
}

impl ControllerState {
    pub fn new(hand: Handedness, node: NodeId, ray_indicator: Option<NodeId>) -> Self {
        Self {
            hand,
            node,
            ray_indicator,
            world_transform: Matrix4::identity(),
            previous_position: None,
            velocity: Vector3::zero(),
            aiming: false,
            held: None,
            target_ray_mode: TargetRayMode::TrackedPointer,
            connected: true,
        }
    }

    pub fn position(&self) -> Vector3<f32> {
        get_position_from_matrix(&self.world_transform)
    }

    pub fn ray(&self) -> PointerRay {
        PointerRay::from_transform(&self.world_transform)
    }

    pub fn is_holding(&self) -> bool {
        self.held.is_some()
    }
}

pub struct Controllers {
    pub left: ControllerState,
    pub right: ControllerState,
}

impl Controllers {
    pub fn get(&self, hand: Handedness) -> &ControllerState {
        match hand {
            Handedness::Left => &self.left,
            Handedness::Right => &self.right,
        }
    }

    pub fn get_mut(&mut self, hand: Handedness) -> &mut ControllerState {
        match hand {
            Handedness::Left => &mut self.left,
            Handedness::Right => &mut self.right,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ControllerState> {
        [&self.left, &self.right].into_iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ControllerState> {
        [&mut self.left, &mut self.right].into_iter()
    }

    pub fn holder_of(&self, entity: EntityId) -> Option<Handedness> {
        self.iter().find(|c| c.held == Some(entity)).map(|c| c.hand)
    }
}
