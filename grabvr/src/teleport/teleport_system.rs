use cgmath::Vector3;
use engine::{teleport_log, util::get_position_from_matrix};
use serde::{Deserialize, Serialize};

use crate::{context::FrameContext, input_context::Handedness};

/// Configuration for the teleport system
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeleportConfig {
    pub enabled: bool,
    pub max_distance: f32,
    /// When several controllers aim at once, the first one here with a hit drives the marker.
    pub priority: Vec<Handedness>,
}

impl Default for TeleportConfig {
    fn default() -> Self {
        TeleportConfig {
            enabled: true,
            max_distance: 20.0,
            priority: vec![Handedness::Left, Handedness::Right],
        }
    }
}

/// Per-hand aiming state. Whether the hand is aiming lives on its `ControllerState`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TeleportHandState {
    /// Latest surface hit recorded during the current aiming period.
    pub last_intersection: Option<Vector3<f32>>,
    /// This frame's hit, if any.
    pub current_hit: Option<Vector3<f32>>,
}

/// Aim/commit state machine for both hands
pub struct TeleportSystem {
    config: TeleportConfig,
    left_hand_state: TeleportHandState,
    right_hand_state: TeleportHandState,
}

impl TeleportSystem {
    pub fn new(config: TeleportConfig) -> Self {
        TeleportSystem {
            config,
            left_hand_state: TeleportHandState::default(),
            right_hand_state: TeleportHandState::default(),
        }
    }

    pub fn with_default_config() -> Self {
        Self::new(TeleportConfig::default())
    }

    fn hand_state_mut(&mut self, hand: Handedness) -> &mut TeleportHandState {
        match hand {
            Handedness::Left => &mut self.left_hand_state,
            Handedness::Right => &mut self.right_hand_state,
        }
    }

    /// Configured priority, deduplicated, with any unlisted hand appended.
    fn priority_order(&self) -> Vec<Handedness> {
        let mut order = Vec::with_capacity(Handedness::ALL.len());
        for hand in self.config.priority.iter().chain(Handedness::ALL.iter()) {
            if !order.contains(hand) {
                order.push(*hand);
            }
        }
        order
    }

    /// Squeeze pressed: start a fresh aiming period.
    pub fn squeeze_start(&mut self, context: &mut FrameContext, hand: Handedness) {
        if !self.config.enabled {
            return;
        }
        let controller = context.controllers.get_mut(hand);
        if !controller.connected {
            return;
        }
        controller.aiming = true;
        *self.hand_state_mut(hand) = TeleportHandState::default();
        teleport_log!(DEBUG, "{} hand started aiming", hand.label());
    }

    /// Squeeze released: teleport to the recorded intersection, if there is one.
    /// Returns the committed destination.
    pub fn squeeze_end(
        &mut self,
        context: &mut FrameContext,
        hand: Handedness,
    ) -> Option<Vector3<f32>> {
        let controller = context.controllers.get_mut(hand);
        if !controller.aiming {
            return None;
        }
        controller.aiming = false;

        let target = std::mem::take(self.hand_state_mut(hand)).last_intersection;
        let Some(point) = target else {
            teleport_log!(DEBUG, "{} hand released without a target", hand.label());
            return None;
        };

        if !context.reference_space.teleport_to(point) {
            teleport_log!(WARN, "rejected teleport to {:?}", point);
            return None;
        }
        context.marker.hide(&mut context.scene);
        teleport_log!(
            INFO,
            "teleported to {:?}, tracking origin now at {:?}",
            point,
            get_position_from_matrix(&context.reference_space.world_from_tracked())
        );
        Some(point)
    }

    /// Leave aiming without teleporting.
    pub fn cancel(&mut self, context: &mut FrameContext, hand: Handedness) {
        context.controllers.get_mut(hand).aiming = false;
        *self.hand_state_mut(hand) = TeleportHandState::default();
    }

    /// Per-frame aiming: raycast the teleport surfaces from every aiming hand and
    /// place the marker at the winning hit. Returns the winner.
    pub fn update(&mut self, context: &mut FrameContext) -> Option<(Handedness, Vector3<f32>)> {
        let mut winner = None;

        if self.config.enabled {
            for hand in self.priority_order() {
                let controller = context.controllers.get(hand);
                if !controller.aiming {
                    continue;
                }

                let scene = &context.scene;
                let hit = controller.ray().cast(
                    self.config.max_distance,
                    context.teleport_surfaces.iter().filter_map(|surface| {
                        scene
                            .world_matrix(surface.node)
                            .map(|world| (surface.node, world, &surface.shape))
                    }),
                );

                let state = self.hand_state_mut(hand);
                state.current_hit = hit.map(|h| h.point);
                if let Some(hit) = hit {
                    state.last_intersection = Some(hit.point);
                    if winner.is_none() {
                        winner = Some((hand, hit.point));
                    }
                }
            }
        }

        match winner {
            Some((_, point)) => context.marker.show_at(&mut context.scene, point),
            None => context.marker.hide(&mut context.scene),
        }
        winner
    }

    pub fn hand_state(&self, hand: Handedness) -> &TeleportHandState {
        match hand {
            Handedness::Left => &self.left_hand_state,
            Handedness::Right => &self.right_hand_state,
        }
    }

    pub fn get_left_hand_state(&self) -> &TeleportHandState {
        &self.left_hand_state
    }

    pub fn get_right_hand_state(&self) -> &TeleportHandState {
        &self.right_hand_state
    }

    pub fn get_config(&self) -> &TeleportConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: TeleportConfig) {
        self.config = config;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Matrix4, Quaternion, SquareMatrix, vec3};
    use rapier3d::{na::Vector3 as NVector3, prelude::SharedShape};

    use crate::{
        config::InteractionConfig, input_context::HandPose, physics::BodyParams,
        reference_space::ReferenceSpace,
    };

    fn near(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-4
    }

    fn pointing(position: Vector3<f32>, direction: Vector3<f32>) -> Matrix4<f32> {
        Matrix4::from_translation(position)
            * Matrix4::from(Quaternion::from_arc(vec3(0.0, 0.0, -1.0), direction.normalize(), None))
    }

    fn context_with_floor() -> FrameContext {
        let mut context = FrameContext::with_rapier(InteractionConfig::default()).unwrap();
        context
            .spawn_teleport_surface(
                "floor",
                Matrix4::identity(),
                SharedShape::halfspace(NVector3::y_axis()),
                None,
            )
            .unwrap();
        context
    }

    fn aim(
        context: &mut FrameContext,
        hand: Handedness,
        position: Vector3<f32>,
        direction: Vector3<f32>,
    ) {
        context.controllers.get_mut(hand).world_transform = pointing(position, direction);
    }

    #[test]
    fn test_aiming_down_hits_floor_below() {
        let mut context = context_with_floor();
        let mut teleport = TeleportSystem::with_default_config();
        aim(&mut context, Handedness::Right, vec3(0.0, 2.0, 0.0), vec3(0.0, -1.0, 0.0));

        teleport.squeeze_start(&mut context, Handedness::Right);
        let winner = teleport.update(&mut context);

        let (hand, point) = winner.unwrap();
        assert_eq!(hand, Handedness::Right);
        assert!(near(point, vec3(0.0, 0.0, 0.0)));
        assert!(context.marker.is_visible());
        assert!(context.scene.is_visible(context.marker.node));
        assert!(near(context.marker.position(), vec3(0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_release_over_target_moves_reference_space() {
        let mut context = context_with_floor();
        let mut teleport = TeleportSystem::with_default_config();
        aim(&mut context, Handedness::Left, vec3(3.0, 2.0, 1.0), vec3(0.0, -1.0, 0.0));

        teleport.squeeze_start(&mut context, Handedness::Left);
        teleport.update(&mut context);
        let destination = teleport.squeeze_end(&mut context, Handedness::Left).unwrap();

        assert!(near(destination, vec3(3.0, 0.0, 1.0)));
        let head = HandPose::new(vec3(0.0, 1.6, 0.0), Quaternion::new(1.0, 0.0, 0.0, 0.0));
        assert!(near(
            get_position_from_matrix(&context.reference_space.to_world(&head)),
            vec3(3.0, 1.6, 1.0)
        ));
        assert!(!context.marker.is_visible());
        assert!(!context.controllers.left.aiming);
        assert_eq!(teleport.get_left_hand_state().last_intersection, None);
    }

    #[test]
    fn test_release_without_any_hit_keeps_reference_space() {
        let mut context = context_with_floor();
        let mut teleport = TeleportSystem::with_default_config();
        aim(&mut context, Handedness::Right, vec3(0.0, 1.5, 0.0), vec3(0.0, 1.0, 0.0));

        teleport.squeeze_start(&mut context, Handedness::Right);
        teleport.update(&mut context);
        assert!(!context.marker.is_visible());

        assert_eq!(teleport.squeeze_end(&mut context, Handedness::Right), None);
        assert_eq!(context.reference_space, ReferenceSpace::new());
        assert!(!context.controllers.right.aiming);
    }

    #[test]
    fn test_hit_recorded_earlier_in_aiming_period_still_commits() {
        let mut context = context_with_floor();
        let mut teleport = TeleportSystem::with_default_config();
        aim(&mut context, Handedness::Right, vec3(2.0, 2.0, 0.0), vec3(0.0, -1.0, 0.0));
        teleport.squeeze_start(&mut context, Handedness::Right);
        teleport.update(&mut context);

        aim(&mut context, Handedness::Right, vec3(2.0, 2.0, 0.0), vec3(0.0, 1.0, 0.0));
        teleport.update(&mut context);
        assert!(!context.marker.is_visible());
        assert_eq!(teleport.get_right_hand_state().current_hit, None);

        let destination = teleport.squeeze_end(&mut context, Handedness::Right);
        assert!(near(destination.unwrap(), vec3(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_new_aiming_period_forgets_old_hits() {
        let mut context = context_with_floor();
        let mut teleport = TeleportSystem::with_default_config();
        aim(&mut context, Handedness::Right, vec3(2.0, 2.0, 0.0), vec3(0.0, -1.0, 0.0));
        teleport.squeeze_start(&mut context, Handedness::Right);
        teleport.update(&mut context);
        teleport.squeeze_end(&mut context, Handedness::Right).unwrap();
        let after_first = context.reference_space.clone();

        aim(&mut context, Handedness::Right, vec3(2.0, 2.0, 0.0), vec3(0.0, 1.0, 0.0));
        teleport.squeeze_start(&mut context, Handedness::Right);
        teleport.update(&mut context);

        assert_eq!(teleport.squeeze_end(&mut context, Handedness::Right), None);
        assert_eq!(context.reference_space, after_first);
    }

    #[test]
    fn test_priority_order_picks_marker_owner() {
        let mut context = context_with_floor();
        let mut teleport = TeleportSystem::with_default_config();
        aim(&mut context, Handedness::Left, vec3(-1.0, 2.0, 0.0), vec3(0.0, -1.0, 0.0));
        aim(&mut context, Handedness::Right, vec3(1.0, 2.0, 0.0), vec3(0.0, -1.0, 0.0));
        teleport.squeeze_start(&mut context, Handedness::Left);
        teleport.squeeze_start(&mut context, Handedness::Right);

        let (hand, _) = teleport.update(&mut context).unwrap();
        assert_eq!(hand, Handedness::Left);
        assert!(near(context.marker.position(), vec3(-1.0, 0.0, 0.0)));
        // Both hands still record their own intersection.
        assert!(near(
            teleport.get_right_hand_state().last_intersection.unwrap(),
            vec3(1.0, 0.0, 0.0)
        ));

        teleport.set_config(TeleportConfig {
            priority: vec![Handedness::Right],
            ..TeleportConfig::default()
        });
        let (hand, _) = teleport.update(&mut context).unwrap();
        assert_eq!(hand, Handedness::Right);
        assert!(near(context.marker.position(), vec3(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_lower_priority_hit_used_when_higher_misses() {
        let mut context = context_with_floor();
        let mut teleport = TeleportSystem::with_default_config();
        aim(&mut context, Handedness::Left, vec3(-1.0, 2.0, 0.0), vec3(0.0, 1.0, 0.0));
        aim(&mut context, Handedness::Right, vec3(1.0, 2.0, 0.0), vec3(0.0, -1.0, 0.0));
        teleport.squeeze_start(&mut context, Handedness::Left);
        teleport.squeeze_start(&mut context, Handedness::Right);

        let (hand, point) = teleport.update(&mut context).unwrap();
        assert_eq!(hand, Handedness::Right);
        assert!(near(point, vec3(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_teleport_rays_ignore_grabbables() {
        let mut context = context_with_floor();
        context
            .spawn_grabbable(
                "crate",
                Matrix4::from_translation(vec3(0.0, 1.0, 0.0)),
                SharedShape::ball(0.3),
                BodyParams::default(),
                None,
            )
            .unwrap();
        let mut teleport = TeleportSystem::with_default_config();
        aim(&mut context, Handedness::Right, vec3(0.0, 2.0, 0.0), vec3(0.0, -1.0, 0.0));

        teleport.squeeze_start(&mut context, Handedness::Right);
        let (_, point) = teleport.update(&mut context).unwrap();

        assert!(near(point, vec3(0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_squeeze_end_without_start_is_noop() {
        let mut context = context_with_floor();
        let mut teleport = TeleportSystem::with_default_config();
        aim(&mut context, Handedness::Right, vec3(0.0, 2.0, 0.0), vec3(0.0, -1.0, 0.0));

        assert_eq!(teleport.squeeze_end(&mut context, Handedness::Right), None);
        assert_eq!(context.reference_space, ReferenceSpace::new());
    }

    #[test]
    fn test_disabled_teleport_never_aims() {
        let mut context = context_with_floor();
        let mut teleport = TeleportSystem::new(TeleportConfig {
            enabled: false,
            ..TeleportConfig::default()
        });
        aim(&mut context, Handedness::Right, vec3(0.0, 2.0, 0.0), vec3(0.0, -1.0, 0.0));

        teleport.squeeze_start(&mut context, Handedness::Right);

        assert!(!context.controllers.right.aiming);
        assert_eq!(teleport.update(&mut context), None);
        assert!(!context.marker.is_visible());
    }
}
