// Headless Runtime - drives a scripted grab/throw/teleport session without a headset
//
// A loader thread streams a small scene into the frame scheduler. Once the scene
// has arrived, a fixed script plays controller poses and button events and every
// notable frame is logged.

use std::{path::PathBuf, thread, time::Duration};

use anyhow::{anyhow, Context};
use cgmath::{vec3, InnerSpace, Matrix4, Quaternion, SquareMatrix, Vector3};
use clap::Parser;
use grabvr::{
    AssetLoadError, AssetNode, AssetSender, AssetTags, BodyParams, FrameContext, FrameRenderer,
    FrameReport, FrameScheduler, HandPose, Handedness, InputContext, InputEvent,
    InteractionConfig, TargetRayMode, Time,
};
use rapier3d::{na::Vector3 as NVector3, prelude::SharedShape};
use tracing::info;

#[derive(Parser)]
#[command(name = "headless_runtime")]
#[command(about = "Scripted grab, throw and teleport session without a headset")]
struct Args {
    /// Number of scripted frames to simulate once the scene has loaded
    #[arg(short, long, default_value_t = 600)]
    frames: u64,

    /// Seconds per frame
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// JSON interaction config; defaults are used for anything it leaves out
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Environment variable holding the log filter, e.g. GRABVR_LOG=info,teleport=debug
    #[arg(long, default_value = "GRABVR_LOG")]
    log_env: String,

    /// Delay before the loader thread starts delivering assets, in milliseconds
    #[arg(long, default_value_t = 20)]
    loader_delay_ms: u64,

    /// Frames to wait for the loader before giving up
    #[arg(long, default_value_t = 600)]
    max_wait_frames: u64,

    /// Print the available log scopes and exit
    #[arg(long)]
    list_scopes: bool,
}

// Script steps, counted from the frame the scene finished loading.
const GRAB_STEP: u64 = 90;
const THROW_STEP: u64 = 120;
const AIM_STEP: u64 = 200;
const COMMIT_STEP: u64 = 230;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.list_scopes {
        for scope in engine::logging::SCOPES {
            println!("{}", scope);
        }
        return Ok(());
    }

    let log_config = engine::logging::init_logging(&args.log_env);
    info!("log level {:?}", log_config.global_level());

    let config = match &args.config {
        Some(path) => InteractionConfig::from_file(path)
            .with_context(|| format!("loading interaction config {}", path.display()))?,
        None => InteractionConfig::default(),
    };
    if args.dt <= 0.0 {
        return Err(anyhow!("--dt must be positive, got {}", args.dt));
    }

    let context = FrameContext::with_rapier(config).context("building the scene")?;
    let mut scheduler = FrameScheduler::new(context);

    let sender = scheduler.asset_sender();
    let delay = Duration::from_millis(args.loader_delay_ms);
    let loader = thread::spawn(move || load_scene(sender, delay));

    let mut renderer = LoggingRenderer::default();
    let session = Session {
        frames: args.frames,
        dt: args.dt,
        max_wait_frames: args.max_wait_frames,
    };
    let time = session.run(&mut scheduler, &mut renderer)?;

    let delivered = loader
        .join()
        .map_err(|_| anyhow!("asset loader thread panicked"))?;

    let context = scheduler.context();
    info!(
        "finished {} frames in {:.2}s simulated: {} assets sent, {} grabbables left, \
         {} grabs, {} throws, {} removed, {} teleports",
        scheduler.frame_index(),
        time.total.as_secs_f32(),
        delivered,
        context.grabbables.len(),
        renderer.grabs,
        renderer.throws,
        renderer.removed,
        renderer.teleports
    );

    if session.frames > COMMIT_STEP {
        renderer.check_script_played()?;
    }
    Ok(())
}

struct Session {
    frames: u64,
    dt: f32,
    max_wait_frames: u64,
}

impl Session {
    /// Waits for the scene, then plays the script for `frames` frames. Returns
    /// the time of the last frame.
    fn run(
        &self,
        scheduler: &mut FrameScheduler,
        renderer: &mut LoggingRenderer,
    ) -> anyhow::Result<Time> {
        let frame_duration = Duration::from_secs_f32(self.dt);
        let mut time = Time::default();

        for hand in Handedness::ALL {
            scheduler.queue_event(InputEvent::Connected {
                hand,
                target_ray_mode: TargetRayMode::TrackedPointer,
            });
        }

        // Waiting frames are paced so the loader thread gets wall time to deliver.
        let mut waited = 0;
        while !scene_ready(scheduler.context()) {
            if waited >= self.max_wait_frames {
                return Err(anyhow!("scene did not arrive within {} frames", waited));
            }
            time = time.next(frame_duration);
            scheduler.run_frame(&InputContext::resting(), &time, renderer);
            if !scene_ready(scheduler.context()) {
                thread::sleep(frame_duration);
            }
            waited += 1;
        }
        info!("scene ready at frame {}", scheduler.frame_index());

        for step in 0..self.frames {
            let (input, events) = script(step, self.dt);
            for event in events {
                scheduler.queue_event(event);
            }
            time = time.next(frame_duration);
            scheduler.run_frame(&input, &time, renderer);
        }
        Ok(time)
    }
}

fn scene_ready(context: &FrameContext) -> bool {
    !context.grabbables.is_empty() && !context.teleport_surfaces.is_empty()
}

fn load_scene(sender: AssetSender, delay: Duration) -> usize {
    thread::sleep(delay);
    let mut sent = 0;

    let floor = AssetNode::new(
        "floor",
        Matrix4::identity(),
        SharedShape::halfspace(NVector3::y_axis()),
        AssetTags::TELEPORT_SURFACE,
    )
    .with_material("concrete", vec3(0.4, 0.4, 0.4));
    sent += sender.deliver(floor) as usize;

    let crates = [vec3(0.0, 0.25, -1.0), vec3(0.8, 0.25, -1.5), vec3(-0.8, 0.25, -1.5)];
    for (index, position) in crates.into_iter().enumerate() {
        let node = AssetNode::new(
            format!("crate-{}", index),
            Matrix4::from_translation(position),
            SharedShape::cuboid(0.25, 0.25, 0.25),
            AssetTags::GRABBABLE,
        )
        .with_material("wood", vec3(0.55, 0.35, 0.2))
        .with_body(BodyParams {
            mass: 2.0,
            restitution: 0.2,
        });
        sent += sender.deliver(node) as usize;
    }

    sender.fail(AssetLoadError::new("statue.glb", "truncated buffer"));
    sent
}

fn pointing(position: Vector3<f32>, target: Vector3<f32>) -> HandPose {
    let direction = (target - position).normalize();
    HandPose::new(
        position,
        Quaternion::from_arc(vec3(0.0, 0.0, -1.0), direction, None),
    )
}

/// Controller poses and events for one step of the script.
fn script(step: u64, dt: f32) -> (InputContext, Vec<InputEvent>) {
    let mut input = InputContext::resting();
    let mut events = Vec::new();

    // Reach for the first crate, lift it and swing it forward.
    if (GRAB_STEP - 10..=THROW_STEP).contains(&step) {
        let swing = step.saturating_sub(GRAB_STEP) as f32 * dt;
        let hand = vec3(0.0, 0.25 + swing * 2.0, -swing * 3.0);
        *input.hand_mut(Handedness::Right) = pointing(hand, hand + vec3(0.0, 0.0, -1.0));
    }
    if step == GRAB_STEP {
        events.push(InputEvent::SelectStart {
            hand: Handedness::Right,
        });
    }
    if step == THROW_STEP {
        events.push(InputEvent::SelectEnd {
            hand: Handedness::Right,
        });
    }

    // Aim at the floor ahead and jump there.
    if (AIM_STEP..=COMMIT_STEP).contains(&step) {
        let left = input.hand_mut(Handedness::Left);
        *left = pointing(left.position, vec3(left.position.x, 0.0, -3.0));
    }
    if step == AIM_STEP {
        events.push(InputEvent::SqueezeStart {
            hand: Handedness::Left,
        });
    }
    if step == COMMIT_STEP {
        events.push(InputEvent::SqueezeEnd {
            hand: Handedness::Left,
        });
    }

    (input, events)
}

#[derive(Default)]
struct LoggingRenderer {
    grabs: usize,
    throws: usize,
    removed: usize,
    teleports: usize,
    marker_was_visible: bool,
}

impl LoggingRenderer {
    fn check_script_played(&self) -> anyhow::Result<()> {
        if self.grabs == 0 || self.throws == 0 {
            return Err(anyhow!("scripted grab and throw did not happen"));
        }
        if self.teleports == 0 {
            return Err(anyhow!("scripted teleport did not happen"));
        }
        Ok(())
    }
}

impl FrameRenderer for LoggingRenderer {
    fn render(&mut self, context: &FrameContext, report: &FrameReport) {
        if !report.admitted.is_empty() {
            info!(
                "frame {}: admitted {} grabbables, {} teleport surfaces, {} failures",
                report.frame,
                report.admitted.grabbables.len(),
                report.admitted.teleport_surfaces.len(),
                report.admitted.failures
            );
        }
        for (hand, id) in &report.grabbed {
            self.grabs += 1;
            info!("frame {}: {} hand grabbed {:?}", report.frame, hand.label(), id);
        }
        for (hand, id) in &report.released {
            self.throws += 1;
            let velocity = context
                .grabbables
                .get(*id)
                .and_then(|entity| context.physics.body_velocity(entity.node));
            info!(
                "frame {}: {} hand threw {:?} with velocity {:?}",
                report.frame,
                hand.label(),
                id,
                velocity
            );
        }
        if !report.removed.is_empty() {
            self.removed += report.removed.len();
            info!("frame {}: removed {:?}", report.frame, report.removed);
        }
        if report.marker_visible != self.marker_was_visible {
            info!(
                "frame {}: teleport marker {} at {:?}",
                report.frame,
                if report.marker_visible { "shown" } else { "hidden" },
                context.marker.position()
            );
            self.marker_was_visible = report.marker_visible;
        }
        if let Some(destination) = report.teleported_to {
            self.teleports += 1;
            info!("frame {}: teleported to {:?}", report.frame, destination);
        }
    }
}
