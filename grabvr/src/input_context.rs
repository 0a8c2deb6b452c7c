use cgmath::{Matrix4, Quaternion, Vector3, Zero, vec3};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub const ALL: [Handedness; 2] = [Handedness::Left, Handedness::Right];

    pub fn other(self) -> Handedness {
        match self {
            Handedness::Left => Handedness::Right,
            Handedness::Right => Handedness::Left,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Handedness::Left => "left",
            Handedness::Right => "right",
        }
    }
}

/// How a controller's pointing ray is produced by the device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetRayMode {
    #[default]
    TrackedPointer,
    Gaze,
    Screen,
}

/// A controller pose in tracking space, before the reference space is applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandPose {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
}

impl HandPose {
    pub fn new(position: Vector3<f32>, rotation: Quaternion<f32>) -> Self {
        Self { position, rotation }
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position) * Matrix4::from(self.rotation)
    }
}

impl Default for HandPose {
    fn default() -> Self {
        Self {
            position: Vector3::zero(),
            rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
        }
    }
}

/// Poses sampled from the input devices for one frame.
#[derive(Clone, Debug, Default)]
pub struct InputContext {
    pub left_hand: HandPose,
    pub right_hand: HandPose,
}

impl InputContext {
    pub fn hand(&self, hand: Handedness) -> &HandPose {
        match hand {
            Handedness::Left => &self.left_hand,
            Handedness::Right => &self.right_hand,
        }
    }

    pub fn hand_mut(&mut self, hand: Handedness) -> &mut HandPose {
        match hand {
            Handedness::Left => &mut self.left_hand,
            Handedness::Right => &mut self.right_hand,
        }
    }

    /// Both hands at a resting height in front of the user, pointing forward.
    pub fn resting() -> Self {
        Self {
            left_hand: HandPose::new(vec3(-0.2, 1.2, -0.3), Quaternion::new(1.0, 0.0, 0.0, 0.0)),
            right_hand: HandPose::new(vec3(0.2, 1.2, -0.3), Quaternion::new(1.0, 0.0, 0.0, 0.0)),
        }
    }
}

/// Discrete device events. They are queued as they arrive and applied in order
/// at one fixed point of the frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    Connected {
        hand: Handedness,
        target_ray_mode: TargetRayMode,
    },
    Disconnected {
        hand: Handedness,
    },
    SelectStart {
        hand: Handedness,
    },
    SelectEnd {
        hand: Handedness,
    },
    SqueezeStart {
        hand: Handedness,
    },
    SqueezeEnd {
        hand: Handedness,
    },
}

impl InputEvent {
    pub fn hand(&self) -> Handedness {
        match *self {
            InputEvent::Connected { hand, .. }
            | InputEvent::Disconnected { hand }
            | InputEvent::SelectStart { hand }
            | InputEvent::SelectEnd { hand }
            | InputEvent::SqueezeStart { hand }
            | InputEvent::SqueezeEnd { hand } => hand,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    events: Vec<InputEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Take every queued event, oldest first.
    pub fn flush(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
