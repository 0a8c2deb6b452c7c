use cgmath::{Quaternion, Vector3, Zero};
use engine::{frame_log, input_log, scene::NodeId, scene_log};

use crate::{
    assets::{AssetInbox, AssetIntake, AssetSender},
    cleanup::CleanupSweep,
    context::FrameContext,
    entity::EntityId,
    highlight::HighlightController,
    input_context::{EventQueue, Handedness, InputContext, InputEvent, TargetRayMode},
    interaction::InteractionController,
    teleport::TeleportSystem,
    time::Time,
    velocity_tracker::VelocityTracker,
};

/// Invoked once at the very end of every frame.
pub trait FrameRenderer {
    fn render(&mut self, context: &FrameContext, report: &FrameReport);
}

/// Renderer that draws nothing.
pub struct NullRenderer;

impl FrameRenderer for NullRenderer {
    fn render(&mut self, _context: &FrameContext, _report: &FrameReport) {}
}

/// What happened during one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub admitted: AssetIntake,
    pub grabbed: Vec<(Handedness, EntityId)>,
    pub released: Vec<(Handedness, EntityId)>,
    pub removed: Vec<EntityId>,
    pub teleported_to: Option<Vector3<f32>>,
    pub marker_visible: bool,
}

/// Runs every frame component in a fixed order over one `FrameContext`.
pub struct FrameScheduler {
    context: FrameContext,
    events: EventQueue,
    inbox: AssetInbox,
    teleport: TeleportSystem,
    highlight: HighlightController,
    frame: u64,
}

impl FrameScheduler {
    /// The teleport system starts from `context.config.teleport`; later edits to
    /// that config are picked up at the start of the next frame.
    pub fn new(context: FrameContext) -> Self {
        let teleport = TeleportSystem::new(context.config.teleport.clone());
        Self {
            context,
            events: EventQueue::new(),
            inbox: AssetInbox::new(),
            teleport,
            highlight: HighlightController::new(),
            frame: 0,
        }
    }

    pub fn context(&self) -> &FrameContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut FrameContext {
        &mut self.context
    }

    pub fn teleport(&self) -> &TeleportSystem {
        &self.teleport
    }

    pub fn highlight(&self) -> &HighlightController {
        &self.highlight
    }

    pub fn frame_index(&self) -> u64 {
        self.frame
    }

    /// Queue a device event; it is applied during the next frame.
    pub fn queue_event(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    pub fn asset_sender(&self) -> AssetSender {
        self.inbox.sender()
    }

    pub fn run_frame(
        &mut self,
        input: &InputContext,
        time: &Time,
        renderer: &mut dyn FrameRenderer,
    ) -> FrameReport {
        let dt = time.delta_seconds();
        let mut report = FrameReport {
            frame: self.frame,
            ..FrameReport::default()
        };

        if self.teleport.get_config() != &self.context.config.teleport {
            self.teleport.set_config(self.context.config.teleport.clone());
        }

        report.admitted = self.inbox.drain(&mut self.context);

        self.sample_poses(input);

        for controller in self.context.controllers.iter_mut() {
            if controller.connected {
                VelocityTracker::update(controller, dt);
            }
        }

        for event in self.events.flush() {
            self.handle_event(event, &mut report);
        }

        self.teleport.update(&mut self.context);
        self.highlight.update(&mut self.context);
        report.removed = CleanupSweep::sweep(&mut self.context);

        self.context.physics.step(dt);
        self.synchronize_physics_positions();

        report.marker_visible = self.context.marker.is_visible();
        renderer.render(&self.context, &report);

        frame_log!(
            TRACE,
            frame = self.frame,
            grabbed = report.grabbed.len(),
            released = report.released.len(),
            removed = report.removed.len(),
            "frame complete"
        );
        self.frame += 1;
        report
    }

    fn sample_poses(&mut self, input: &InputContext) {
        for hand in Handedness::ALL {
            if !self.context.controllers.get(hand).connected {
                continue;
            }
            let world = self.context.reference_space.to_world(input.hand(hand));
            if let Err(err) = self.context.set_controller_transform(hand, world) {
                scene_log!(WARN, "unable to place {} controller: {}", hand.label(), err);
            }
        }
        self.context.scene.update_world_matrices();
    }

    fn handle_event(&mut self, event: InputEvent, report: &mut FrameReport) {
        input_log!(DEBUG, "{:?}", event);
        let context = &mut self.context;
        match event {
            InputEvent::Connected {
                hand,
                target_ray_mode,
            } => {
                let controller = context.controllers.get_mut(hand);
                controller.connected = true;
                controller.target_ray_mode = target_ray_mode;
                if let Some(ray) = controller.ray_indicator {
                    let visible = target_ray_mode == TargetRayMode::TrackedPointer;
                    let _ = context.scene.set_visible(ray, visible);
                }
            }
            InputEvent::Disconnected { hand } => {
                if let Some(id) = InteractionController::select_end(context, hand) {
                    report.released.push((hand, id));
                }
                self.teleport.cancel(context, hand);
                let controller = context.controllers.get_mut(hand);
                controller.connected = false;
                controller.previous_position = None;
                controller.velocity = Vector3::zero();
                if let Some(ray) = controller.ray_indicator {
                    let _ = context.scene.set_visible(ray, false);
                }
            }
            InputEvent::SelectStart { hand } => {
                if let Some(id) = InteractionController::select_start(context, hand) {
                    report.grabbed.push((hand, id));
                }
            }
            InputEvent::SelectEnd { hand } => {
                if let Some(id) = InteractionController::select_end(context, hand) {
                    report.released.push((hand, id));
                }
            }
            InputEvent::SqueezeStart { hand } => self.teleport.squeeze_start(context, hand),
            InputEvent::SqueezeEnd { hand } => {
                if let Some(point) = self.teleport.squeeze_end(context, hand) {
                    report.teleported_to = Some(point);
                }
            }
        }
    }

    /// Copy simulated poses back onto the nodes of world-owned entities.
    fn synchronize_physics_positions(&mut self) {
        let poses: Vec<(NodeId, Vector3<f32>, Quaternion<f32>)> = self
            .context
            .grabbables
            .iter()
            .filter(|entity| !entity.is_held())
            .filter_map(|entity| {
                self.context
                    .physics
                    .body_pose(entity.node)
                    .map(|(position, rotation)| (entity.node, position, rotation))
            })
            .collect();

        for (node, position, rotation) in poses {
            if let Err(err) = self.context.place_in_world(node, position, rotation) {
                scene_log!(WARN, "unable to sync {:?} with its body: {}", node, err);
            }
        }
        self.context.scene.update_world_matrices();
    }
}
