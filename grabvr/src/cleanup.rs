use engine::{scene_log, util::get_position_from_matrix};

use crate::{context::FrameContext, entity::EntityId, physics::skip_missing};

/// Despawns world-owned grabbables that fell below the floor threshold.
pub struct CleanupSweep;

impl CleanupSweep {
    /// Returns the ids removed this sweep. Held entities are never touched.
    pub fn sweep(context: &mut FrameContext) -> Vec<EntityId> {
        let threshold = context.config.floor_threshold;
        let mut removed = Vec::new();

        for index in (0..context.grabbables.len()).rev() {
            let Some(entity) = context.grabbables.get_index(index) else {
                continue;
            };
            if entity.is_held() {
                continue;
            }
            let node = entity.node;
            let Ok(world) = context.scene.compute_world_matrix(node) else {
                continue;
            };
            let position = get_position_from_matrix(&world);
            if position.y >= threshold {
                continue;
            }

            skip_missing(context.physics.remove_body(node));
            if let Err(err) = context.scene.detach(node) {
                scene_log!(WARN, "detaching fallen node {:?}: {}", node, err);
            }
            if let Some(entity) = context.grabbables.remove_index(index) {
                scene_log!(
                    DEBUG,
                    "removed {:?} below floor threshold at {:?}",
                    entity.id,
                    position
                );
                removed.push(entity.id);
            }
        }

        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Matrix4, Vector3, vec3};
    use rapier3d::prelude::SharedShape;

    use crate::{
        config::InteractionConfig, input_context::Handedness, interaction::InteractionController,
        physics::BodyParams,
    };

    fn spawn(context: &mut FrameContext, name: &str, position: Vector3<f32>) -> EntityId {
        context
            .spawn_grabbable(
                name,
                Matrix4::from_translation(position),
                SharedShape::ball(0.2),
                BodyParams::default(),
                None,
            )
            .unwrap()
    }

    #[test]
    fn test_entities_below_threshold_are_removed_once() {
        let mut context = FrameContext::with_rapier(InteractionConfig::default()).unwrap();
        let kept = spawn(&mut context, "kept", vec3(0.0, 1.0, 0.0));
        let fallen = spawn(&mut context, "fallen", vec3(0.0, -6.0, 0.0));
        let fallen_node = context.grabbables.get(fallen).unwrap().node;

        assert_eq!(CleanupSweep::sweep(&mut context), vec![fallen]);

        assert!(!context.physics.has_body(fallen_node));
        assert!(!context.scene.contains(fallen_node));
        assert!(context.grabbables.get(fallen).is_none());
        assert!(context.grabbables.get(kept).is_some());

        assert!(CleanupSweep::sweep(&mut context).is_empty());
        assert_eq!(context.grabbables.len(), 1);
    }

    #[test]
    fn test_entity_exactly_at_threshold_is_kept() {
        let mut context = FrameContext::with_rapier(InteractionConfig::default()).unwrap();
        let id = spawn(&mut context, "edge", vec3(0.0, -5.0, 0.0));

        assert!(CleanupSweep::sweep(&mut context).is_empty());
        assert!(context.grabbables.get(id).is_some());
    }

    #[test]
    fn test_sweep_removes_in_reverse_order_and_keeps_the_rest_ordered() {
        let mut context = FrameContext::with_rapier(InteractionConfig::default()).unwrap();
        let a = spawn(&mut context, "a", vec3(0.0, -10.0, 0.0));
        let b = spawn(&mut context, "b", vec3(1.0, 1.0, 0.0));
        let c = spawn(&mut context, "c", vec3(2.0, -10.0, 0.0));
        let d = spawn(&mut context, "d", vec3(3.0, 1.0, 0.0));

        assert_eq!(CleanupSweep::sweep(&mut context), vec![c, a]);
        let remaining: Vec<EntityId> = context.grabbables.iter().map(|e| e.id).collect();
        assert_eq!(remaining, vec![b, d]);
    }

    #[test]
    fn test_held_entities_are_not_swept() {
        let mut context = FrameContext::with_rapier(InteractionConfig::default()).unwrap();
        let id = spawn(&mut context, "crate", vec3(0.0, -7.0, -2.0));
        let pose = Matrix4::from_translation(vec3(0.0, -7.0, 0.0));
        context.set_controller_transform(Handedness::Right, pose).unwrap();
        assert_eq!(InteractionController::select_start(&mut context, Handedness::Right), Some(id));

        assert!(CleanupSweep::sweep(&mut context).is_empty());
        assert!(context.grabbables.get(id).is_some());
    }
}
