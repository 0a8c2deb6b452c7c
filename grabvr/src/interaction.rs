use engine::{
    interaction_log,
    scene::Material,
    util::{decompose, get_position_from_matrix},
};

use crate::{
    context::FrameContext,
    entity::{EntityId, Owner},
    input_context::Handedness,
    physics::skip_missing,
};

/// Grab/release state machine. Each controller is either idle or holding exactly
/// one entity; the state itself lives on `ControllerState::held` and
/// `GrabbableEntity::owner`, which are always changed together.
pub struct InteractionController;

impl InteractionController {
    /// Select pressed: pick up the grabbable under the controller's ray.
    pub fn select_start(context: &mut FrameContext, hand: Handedness) -> Option<EntityId> {
        let controller = context.controllers.get(hand);
        if !controller.connected || controller.is_holding() {
            return None;
        }
        let controller_node = controller.node;

        let Some(hit) = context.pick_grabbable(hand) else {
            interaction_log!(TRACE, "{} select hit nothing", hand.label());
            return None;
        };
        let entity = context.grabbables.get(hit.target)?;
        let node = entity.node;

        if context.config.is_excluded(context.node_name(node)) {
            interaction_log!(DEBUG, "'{}' is not grabbable", context.node_name(node));
            return None;
        }
        if let Some(holder) = entity.holder() {
            interaction_log!(
                DEBUG,
                "{} hand cannot grab {:?}, held by {} hand",
                hand.label(),
                entity.id,
                holder.label()
            );
            return None;
        }

        let world = match context.scene.compute_world_matrix(node) {
            Ok(world) => world,
            Err(err) => {
                interaction_log!(ERROR, "grab failed: {}", err);
                return None;
            }
        };
        if let Err(err) = context.scene.reparent(node, controller_node) {
            interaction_log!(ERROR, "grab failed: {}", err);
            return None;
        }
        let _ = context.scene.update_world_matrix(node);
        skip_missing(context.physics.remove_body(node));

        let original_material = context.scene.material(node);
        if let Some(original) = &original_material {
            let highlighted = Material::detached_copy(original);
            highlighted.borrow_mut().emissive = context.config.highlight_emissive;
            let _ = context.scene.set_material(node, Some(highlighted));
        }

        let id = hit.target;
        if let Some(entity) = context.grabbables.get_mut(id) {
            entity.owner = Owner::Controller(hand);
            entity.original_material = original_material;
        }
        context.controllers.get_mut(hand).held = Some(id);

        interaction_log!(
            INFO,
            "{} hand grabbed {:?} ('{}') at {:?}",
            hand.label(),
            id,
            context.node_name(node),
            get_position_from_matrix(&world)
        );
        Some(id)
    }

    /// Select released: hand the held entity back to the world and throw it
    /// with the controller's velocity.
    pub fn select_end(context: &mut FrameContext, hand: Handedness) -> Option<EntityId> {
        let controller = context.controllers.get(hand);
        let id = controller.held?;
        let throw_velocity = controller.velocity * context.config.throw_velocity_multiplier;

        let Some(entity) = context.grabbables.get_mut(id) else {
            interaction_log!(WARN, "{} hand held unknown {:?}", hand.label(), id);
            context.controllers.get_mut(hand).held = None;
            return None;
        };
        let node = entity.node;

        // Ownership only moves once the release pose is known.
        let world = match context.scene.compute_world_matrix(node) {
            Ok(world) => world,
            Err(err) => {
                interaction_log!(ERROR, "release of {:?} failed: {}", id, err);
                return None;
            }
        };
        if let Err(err) = context.scene.reparent(node, context.world_group) {
            interaction_log!(ERROR, "release of {:?} failed: {}", id, err);
            return None;
        }
        if let Some(original) = entity.original_material.take() {
            let _ = context.scene.set_material(node, Some(original));
        }
        let _ = context.scene.update_world_matrix(node);

        let (position, rotation, _) = decompose(&world);
        skip_missing(
            context
                .physics
                .add_body(node, &entity.shape, entity.body, position, rotation),
        );
        skip_missing(context.physics.set_position(node, position));
        skip_missing(context.physics.set_rotation(node, rotation));
        skip_missing(context.physics.set_velocity(node, throw_velocity));
        interaction_log!(
            INFO,
            "{} hand released {:?} at {:?} with velocity {:?}",
            hand.label(),
            id,
            position,
            throw_velocity
        );

        entity.owner = Owner::World;
        context.controllers.get_mut(hand).held = None;
        Some(id)
    }
}
