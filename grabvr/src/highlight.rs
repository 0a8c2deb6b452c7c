use cgmath::vec3;
use engine::interaction_log;

use crate::{context::FrameContext, entity::EntityId, input_context::Handedness};

/// Hover feedback for whatever each free controller points at.
#[derive(Default)]
pub struct HighlightController {
    left_highlighted: Option<EntityId>,
    right_highlighted: Option<EntityId>,
}

impl HighlightController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn highlighted(&self, hand: Handedness) -> Option<EntityId> {
        match hand {
            Handedness::Left => self.left_highlighted,
            Handedness::Right => self.right_highlighted,
        }
    }

    fn set_highlighted(&mut self, hand: Handedness, entity: Option<EntityId>) {
        match hand {
            Handedness::Left => self.left_highlighted = entity,
            Handedness::Right => self.right_highlighted = entity,
        }
    }

    pub fn update(&mut self, context: &mut FrameContext) {
        let mut current = [None, None];

        for (slot, hand) in Handedness::ALL.into_iter().enumerate() {
            let controller = context.controllers.get(hand);
            if !controller.connected || controller.is_holding() {
                continue;
            }
            let ray_indicator = controller.ray_indicator;

            let target = context.pick_grabbable(hand).filter(|hit| {
                context.grabbables.get(hit.target).is_some_and(|entity| {
                    !entity.is_held() && !context.config.is_excluded(context.node_name(entity.node))
                })
            });

            let length = target
                .map(|hit| hit.distance)
                .unwrap_or(context.config.default_ray_length);
            if let Some(ray) = ray_indicator {
                let _ = context.scene.set_local_scale(ray, vec3(1.0, 1.0, length));
                let _ = context.scene.update_world_matrix(ray);
            }

            if let Some(hit) = target {
                if let Some(entity) = context.grabbables.get(hit.target) {
                    let _ = context.scene.set_hovered(entity.node, true);
                }
                current[slot] = Some(hit.target);
            }
        }

        for (slot, hand) in Handedness::ALL.into_iter().enumerate() {
            let previous = self.highlighted(hand);
            if let Some(previous) = previous.filter(|p| !current.contains(&Some(*p))) {
                if let Some(entity) = context.grabbables.get(previous) {
                    let _ = context.scene.set_hovered(entity.node, false);
                }
            }
            if previous != current[slot] {
                interaction_log!(
                    TRACE,
                    "{} highlight {:?} -> {:?}",
                    hand.label(),
                    previous,
                    current[slot]
                );
            }
            self.set_highlighted(hand, current[slot]);
        }
    }
}
