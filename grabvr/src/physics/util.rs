use cgmath::{Quaternion, Vector3, vec3};
use rapier3d::{
    na::{self, Translation3, UnitQuaternion},
    prelude::*,
};

pub fn nvec_to_cgmath(vec: Vector<Real>) -> Vector3<f32> {
    vec3(vec.x, vec.y, vec.z)
}

pub fn vec_to_nvec(vec: Vector3<f32>) -> Vector<Real> {
    vector![vec.x, vec.y, vec.z]
}

pub fn vec_to_npoint(vec: Vector3<f32>) -> Point<Real> {
    point![vec.x, vec.y, vec.z]
}

pub fn nquat_to_quat(quat: UnitQuaternion<f32>) -> Quaternion<f32> {
    Quaternion::new(quat.w, quat.i, quat.j, quat.k)
}

pub fn quat_to_nquat(quat: Quaternion<f32>) -> UnitQuaternion<f32> {
    UnitQuaternion::from_quaternion(na::Quaternion::new(quat.s, quat.v.x, quat.v.y, quat.v.z))
}

pub fn isometry_from_pose(position: Vector3<f32>, rotation: Quaternion<f32>) -> Isometry<Real> {
    Isometry::from_parts(Translation3::from(vec_to_nvec(position)), quat_to_nquat(rotation))
}

pub fn pose_from_isometry(isometry: &Isometry<Real>) -> (Vector3<f32>, Quaternion<f32>) {
    (
        nvec_to_cgmath(isometry.translation.vector),
        nquat_to_quat(isometry.rotation),
    )
}
