use cgmath::{Matrix4, SquareMatrix, Vector3};

use crate::input_context::HandPose;

/// Maps tracked device poses into world space.
///
/// The active space is always `base_origin * origin_offset`: a teleport swaps in a
/// new offset in one step, it never accumulates onto the previous one.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceSpace {
    base_origin: Matrix4<f32>,
    origin_offset: Matrix4<f32>,
    world_from_tracked: Matrix4<f32>,
}

impl ReferenceSpace {
    pub fn new() -> Self {
        Self {
            base_origin: Matrix4::identity(),
            origin_offset: Matrix4::identity(),
            world_from_tracked: Matrix4::identity(),
        }
    }

    /// Offset that moves the tracking origin onto `point`, orientation unchanged.
    pub fn teleport_offset(point: Vector3<f32>) -> Matrix4<f32> {
        Matrix4::from_translation(-point)
    }

    /// Replace the active offset. Returns false, leaving the space untouched, if
    /// the composed transform cannot be inverted.
    pub fn replace_offset(&mut self, origin_offset: Matrix4<f32>) -> bool {
        let Some(world_from_tracked) = (self.base_origin * origin_offset).invert() else {
            return false;
        };
        self.origin_offset = origin_offset;
        self.world_from_tracked = world_from_tracked;
        true
    }

    pub fn teleport_to(&mut self, point: Vector3<f32>) -> bool {
        self.replace_offset(Self::teleport_offset(point))
    }

    pub fn origin_offset(&self) -> Matrix4<f32> {
        self.origin_offset
    }

    pub fn world_from_tracked(&self) -> Matrix4<f32> {
        self.world_from_tracked
    }

    pub fn to_world(&self, pose: &HandPose) -> Matrix4<f32> {
        self.world_from_tracked * pose.to_matrix()
    }
}

impl Default for ReferenceSpace {
    fn default() -> Self {
        Self::new()
    }
}
