use cgmath::{Vector3, Zero};

use crate::controller::ControllerState;

/// Finite-difference controller velocity. No smoothing is applied, so the value
/// follows frame-time jitter directly.
pub struct VelocityTracker;

impl VelocityTracker {
    pub fn update(controller: &mut ControllerState, dt: f32) {
        let current = controller.position();

        controller.velocity = match controller.previous_position {
            Some(previous) if dt > 0.0 => (current - previous) / dt,
            _ => Vector3::zero(),
        };
        controller.previous_position = Some(current);
    }
}
