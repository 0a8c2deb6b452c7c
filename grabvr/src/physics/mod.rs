pub mod rapier_world;
pub mod util;

pub use rapier_world::RapierPhysicsWorld;

use std::fmt;

use cgmath::{Quaternion, Vector3};
use engine::{physics_log, scene::NodeId};
use rapier3d::prelude::SharedShape;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyParams {
    pub mass: f32,
    pub restitution: f32,
}

impl Default for BodyParams {
    fn default() -> Self {
        BodyParams {
            mass: 1.0,
            restitution: 0.3,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PhysicsError {
    /// The node has no backing body.
    MissingBody {
        node: NodeId,
        operation: &'static str,
    },
    DuplicateBody {
        node: NodeId,
    },
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicsError::MissingBody { node, operation } => {
                write!(f, "{}: node {:?} has no physics body", operation, node)
            }
            PhysicsError::DuplicateBody { node } => {
                write!(f, "add_body: node {:?} already has a physics body", node)
            }
        }
    }
}

impl std::error::Error for PhysicsError {}

/// Rigid-body simulation as seen by the interaction layer. Bodies are keyed by
/// the scene node they drive.
pub trait PhysicsWorld {
    fn add_body(
        &mut self,
        node: NodeId,
        shape: &SharedShape,
        params: BodyParams,
        position: Vector3<f32>,
        rotation: Quaternion<f32>,
    ) -> Result<(), PhysicsError>;

    /// Immovable collision geometry, e.g. floors. Not a body: `has_body` stays false.
    fn add_fixed_collider(
        &mut self,
        node: NodeId,
        shape: &SharedShape,
        position: Vector3<f32>,
        rotation: Quaternion<f32>,
    ) -> Result<(), PhysicsError>;

    fn remove_body(&mut self, node: NodeId) -> Result<(), PhysicsError>;

    fn set_position(&mut self, node: NodeId, position: Vector3<f32>) -> Result<(), PhysicsError>;

    fn set_rotation(&mut self, node: NodeId, rotation: Quaternion<f32>)
    -> Result<(), PhysicsError>;

    fn set_velocity(&mut self, node: NodeId, velocity: Vector3<f32>) -> Result<(), PhysicsError>;

    fn has_body(&self, node: NodeId) -> bool;

    fn body_pose(&self, node: NodeId) -> Option<(Vector3<f32>, Quaternion<f32>)>;

    fn body_velocity(&self, node: NodeId) -> Option<Vector3<f32>>;

    fn body_count(&self) -> usize;

    /// Advance the simulation. Non-positive `dt` is ignored.
    fn step(&mut self, dt: f32);
}

/// Log a failed physics call and carry on with the frame.
pub fn skip_missing(result: Result<(), PhysicsError>) {
    if let Err(err) = result {
        physics_log!(WARN, "{}; skipped", err);
    }
}
