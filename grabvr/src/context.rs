use cgmath::{Matrix4, SquareMatrix, Vector3, vec3};
use engine::{
    scene::{Material, NodeId, SceneError, SceneGraph, SharedMaterial},
    scene_log,
    util::{compose, decompose},
};
use rapier3d::prelude::SharedShape;

use crate::{
    config::InteractionConfig,
    controller::{ControllerState, Controllers},
    entity::{EntityId, GrabbableSet},
    input_context::Handedness,
    physics::{BodyParams, PhysicsWorld, RapierPhysicsWorld},
    raycast::RayHit,
    reference_space::ReferenceSpace,
    teleport::{TeleportMarker, TeleportSurfaceSet},
};

/// The state every frame component works on, created once per session.
pub struct FrameContext {
    pub config: InteractionConfig,
    pub scene: SceneGraph,
    /// Parent of every entity not held by a controller.
    pub world_group: NodeId,
    pub physics: Box<dyn PhysicsWorld>,
    pub controllers: Controllers,
    pub grabbables: GrabbableSet,
    pub teleport_surfaces: TeleportSurfaceSet,
    pub marker: TeleportMarker,
    pub reference_space: ReferenceSpace,
}

impl FrameContext {
    pub fn new(
        config: InteractionConfig,
        physics: Box<dyn PhysicsWorld>,
    ) -> Result<Self, SceneError> {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let world_group = scene.add_node(root, "world", Matrix4::identity())?;

        let ray_length = config.default_ray_length;
        let left = create_controller(&mut scene, Handedness::Left, ray_length)?;
        let right = create_controller(&mut scene, Handedness::Right, ray_length)?;
        let marker = TeleportMarker::create(&mut scene)?;

        Ok(Self {
            config,
            scene,
            world_group,
            physics,
            controllers: Controllers { left, right },
            grabbables: GrabbableSet::new(),
            teleport_surfaces: TeleportSurfaceSet::new(),
            marker,
            reference_space: ReferenceSpace::new(),
        })
    }

    pub fn with_rapier(config: InteractionConfig) -> Result<Self, SceneError> {
        let physics = RapierPhysicsWorld::new(config.gravity);
        Self::new(config, Box::new(physics))
    }

    /// Add a world-owned grabbable with a live body. If the body cannot be
    /// created the node is removed again and `None` is returned.
    pub fn spawn_grabbable(
        &mut self,
        name: &str,
        transform: Matrix4<f32>,
        shape: SharedShape,
        body: BodyParams,
        material: Option<SharedMaterial>,
    ) -> Option<EntityId> {
        let node = match self.scene.add_node(self.world_group, name, transform) {
            Ok(node) => node,
            Err(err) => {
                scene_log!(ERROR, "unable to add grabbable '{}': {}", name, err);
                return None;
            }
        };
        let _ = self.scene.set_material(node, material);
        let _ = self.scene.update_world_matrix(node);

        let world = self.scene.world_matrix(node)?;
        let (position, rotation, _) = decompose(&world);
        if let Err(err) = self.physics.add_body(node, &shape, body, position, rotation) {
            scene_log!(ERROR, "dropping grabbable '{}': {}", name, err);
            let _ = self.scene.detach(node);
            return None;
        }

        Some(self.grabbables.insert(node, shape, body))
    }

    /// Add a static teleport destination with a fixed collider.
    pub fn spawn_teleport_surface(
        &mut self,
        name: &str,
        transform: Matrix4<f32>,
        shape: SharedShape,
        material: Option<SharedMaterial>,
    ) -> Option<NodeId> {
        let node = match self.scene.add_node(self.world_group, name, transform) {
            Ok(node) => node,
            Err(err) => {
                scene_log!(ERROR, "unable to add teleport surface '{}': {}", name, err);
                return None;
            }
        };
        let _ = self.scene.set_material(node, material);
        let _ = self.scene.update_world_matrix(node);

        let world = self.scene.world_matrix(node)?;
        let (position, rotation, _) = decompose(&world);
        if let Err(err) = self
            .physics
            .add_fixed_collider(node, &shape, position, rotation)
        {
            scene_log!(WARN, "teleport surface '{}' has no collider: {}", name, err);
        }

        self.teleport_surfaces.insert(node, shape);
        Some(node)
    }

    /// Place a controller in the world; anything it holds moves along.
    pub fn set_controller_transform(
        &mut self,
        hand: Handedness,
        world: Matrix4<f32>,
    ) -> Result<(), SceneError> {
        let controller = self.controllers.get_mut(hand);
        controller.world_transform = world;
        let node = controller.node;
        let parent = self.scene.parent(node).unwrap_or(self.scene.root());
        let inverse_parent = self
            .scene
            .compute_world_matrix(parent)?
            .invert()
            .ok_or(SceneError::NonInvertibleParent(parent))?;
        self.scene.set_local_transform(node, inverse_parent * world)?;
        self.scene.update_world_matrix(node)
    }

    /// Nearest grabbable along a controller's ray, held or not.
    pub fn pick_grabbable(&self, hand: Handedness) -> Option<RayHit<EntityId>> {
        let scene = &self.scene;
        self.controllers.get(hand).ray().cast(
            self.config.ray_max_distance,
            self.grabbables.iter().filter_map(|entity| {
                scene
                    .compute_world_matrix(entity.node)
                    .ok()
                    .map(|world| (entity.id, world, &entity.shape))
            }),
        )
    }

    pub fn node_name(&self, node: NodeId) -> &str {
        self.scene.node(node).map(|n| n.name.as_str()).unwrap_or("")
    }

    /// Move a world-owned node to a world pose, keeping its scale.
    pub fn place_in_world(
        &mut self,
        node: NodeId,
        position: Vector3<f32>,
        rotation: cgmath::Quaternion<f32>,
    ) -> Result<(), SceneError> {
        let current = self.scene.compute_world_matrix(node)?;
        let (_, _, scale) = decompose(&current);
        let parent = self.scene.parent(node).unwrap_or(self.world_group);
        let parent_world = self.scene.compute_world_matrix(parent)?;
        let inverse_parent = parent_world
            .invert()
            .ok_or(SceneError::NonInvertibleParent(parent))?;
        self.scene
            .set_local_transform(node, inverse_parent * compose(position, rotation, scale))
    }
}

fn create_controller(
    scene: &mut SceneGraph,
    hand: Handedness,
    ray_length: f32,
) -> Result<ControllerState, SceneError> {
    let root = scene.root();
    let node = scene.add_node(root, format!("controller-{}", hand.label()), Matrix4::identity())?;
    let ray = scene.add_node(
        node,
        format!("ray-{}", hand.label()),
        Matrix4::from_nonuniform_scale(1.0, 1.0, ray_length),
    )?;
    scene.set_material(
        ray,
        Some(Material::new("pointer-ray", vec3(1.0, 1.0, 1.0)).into_shared()),
    )?;
    Ok(ControllerState::new(hand, node, Some(ray)))
}
