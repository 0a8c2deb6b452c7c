pub mod assets;
pub mod cleanup;
pub mod config;
pub mod context;
pub mod controller;
pub mod entity;
pub mod frame;
pub mod highlight;
pub mod input_context;
pub mod interaction;
pub mod physics;
pub mod raycast;
pub mod reference_space;
pub mod teleport;
pub mod time;
pub mod velocity_tracker;

pub use assets::{AssetInbox, AssetLoadError, AssetNode, AssetSender, AssetTags};
pub use config::{ConfigError, InteractionConfig};
pub use context::FrameContext;
pub use entity::{EntityId, Owner};
pub use frame::{FrameRenderer, FrameReport, FrameScheduler, NullRenderer};
pub use input_context::{Handedness, HandPose, InputContext, InputEvent, TargetRayMode};
pub use physics::{BodyParams, PhysicsError, PhysicsWorld, RapierPhysicsWorld};
pub use time::Time;
