use std::collections::HashMap;

use cgmath::{Quaternion, Vector3};
use engine::{physics_log, scene::NodeId};
use rapier3d::prelude::*;

use super::{
    BodyParams, PhysicsError, PhysicsWorld,
    util::{isometry_from_pose, nvec_to_cgmath, pose_from_isometry, quat_to_nquat, vec_to_nvec},
};

/// `PhysicsWorld` backed by a rapier3d pipeline.
pub struct RapierPhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    node_to_body: HashMap<NodeId, RigidBodyHandle>,
    node_to_fixed_collider: HashMap<NodeId, ColliderHandle>,
}

impl RapierPhysicsWorld {
    pub fn new(gravity: Vector3<f32>) -> Self {
        Self {
            gravity: vec_to_nvec(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            node_to_body: HashMap::new(),
            node_to_fixed_collider: HashMap::new(),
        }
    }

    fn body_mut(
        &mut self,
        node: NodeId,
        operation: &'static str,
    ) -> Result<&mut RigidBody, PhysicsError> {
        self.node_to_body
            .get(&node)
            .and_then(|handle| self.rigid_body_set.get_mut(*handle))
            .ok_or(PhysicsError::MissingBody { node, operation })
    }

    fn body(&self, node: NodeId) -> Option<&RigidBody> {
        self.node_to_body
            .get(&node)
            .and_then(|handle| self.rigid_body_set.get(*handle))
    }
}

impl PhysicsWorld for RapierPhysicsWorld {
    fn add_body(
        &mut self,
        node: NodeId,
        shape: &SharedShape,
        params: BodyParams,
        position: Vector3<f32>,
        rotation: Quaternion<f32>,
    ) -> Result<(), PhysicsError> {
        if self.node_to_body.contains_key(&node) {
            return Err(PhysicsError::DuplicateBody { node });
        }

        let rigid_body = RigidBodyBuilder::dynamic()
            .position(isometry_from_pose(position, rotation))
            .ccd_enabled(true)
            .build();
        let handle = self.rigid_body_set.insert(rigid_body);

        let collider = ColliderBuilder::new(shape.clone())
            .mass(params.mass)
            .restitution(params.restitution)
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        self.node_to_body.insert(node, handle);
        physics_log!(DEBUG, "added body for {:?} at {:?}", node, position);
        Ok(())
    }

    fn add_fixed_collider(
        &mut self,
        node: NodeId,
        shape: &SharedShape,
        position: Vector3<f32>,
        rotation: Quaternion<f32>,
    ) -> Result<(), PhysicsError> {
        if self.node_to_fixed_collider.contains_key(&node) || self.node_to_body.contains_key(&node)
        {
            return Err(PhysicsError::DuplicateBody { node });
        }

        let collider = ColliderBuilder::new(shape.clone())
            .position(isometry_from_pose(position, rotation))
            .build();
        let handle = self.collider_set.insert(collider);
        self.node_to_fixed_collider.insert(node, handle);
        Ok(())
    }

    fn remove_body(&mut self, node: NodeId) -> Result<(), PhysicsError> {
        let handle = self
            .node_to_body
            .remove(&node)
            .ok_or(PhysicsError::MissingBody {
                node,
                operation: "remove_body",
            })?;

        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        physics_log!(DEBUG, "removed body for {:?}", node);
        Ok(())
    }

    fn set_position(&mut self, node: NodeId, position: Vector3<f32>) -> Result<(), PhysicsError> {
        let body = self.body_mut(node, "set_position")?;
        body.set_translation(vec_to_nvec(position), true);
        Ok(())
    }

    fn set_rotation(
        &mut self,
        node: NodeId,
        rotation: Quaternion<f32>,
    ) -> Result<(), PhysicsError> {
        let body = self.body_mut(node, "set_rotation")?;
        body.set_rotation(quat_to_nquat(rotation), true);
        Ok(())
    }

    fn set_velocity(&mut self, node: NodeId, velocity: Vector3<f32>) -> Result<(), PhysicsError> {
        let body = self.body_mut(node, "set_velocity")?;
        body.set_linvel(vec_to_nvec(velocity), true);
        Ok(())
    }

    fn has_body(&self, node: NodeId) -> bool {
        self.node_to_body.contains_key(&node)
    }

    fn body_pose(&self, node: NodeId) -> Option<(Vector3<f32>, Quaternion<f32>)> {
        self.body(node).map(|body| pose_from_isometry(body.position()))
    }

    fn body_velocity(&self, node: NodeId) -> Option<Vector3<f32>> {
        self.body(node).map(|body| nvec_to_cgmath(*body.linvel()))
    }

    fn body_count(&self) -> usize {
        self.node_to_body.len()
    }

    fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.integration_parameters.dt = dt;

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }
}
