use cgmath::{InnerSpace, Matrix3, Matrix4, Quaternion, Vector3, vec3};

pub fn get_position_from_matrix(matrix: &Matrix4<f32>) -> Vector3<f32> {
    matrix.w.truncate()
}

pub fn get_scale_from_matrix(matrix: &Matrix4<f32>) -> Vector3<f32> {
    vec3(
        matrix.x.truncate().magnitude(),
        matrix.y.truncate().magnitude(),
        matrix.z.truncate().magnitude(),
    )
}

/// Rotation part of an affine matrix with scale divided out. Degenerate axes
/// (zero scale) yield the identity rotation.
pub fn get_rotation_from_matrix(matrix: &Matrix4<f32>) -> Quaternion<f32> {
    let scale = get_scale_from_matrix(matrix);
    if scale.x <= f32::EPSILON || scale.y <= f32::EPSILON || scale.z <= f32::EPSILON {
        return Quaternion::new(1.0, 0.0, 0.0, 0.0);
    }

    let rotation = Matrix3::from_cols(
        matrix.x.truncate() / scale.x,
        matrix.y.truncate() / scale.y,
        matrix.z.truncate() / scale.z,
    );
    Quaternion::from(rotation).normalize()
}

/// Split an affine matrix into translation, rotation and scale.
pub fn decompose(matrix: &Matrix4<f32>) -> (Vector3<f32>, Quaternion<f32>, Vector3<f32>) {
    (
        get_position_from_matrix(matrix),
        get_rotation_from_matrix(matrix),
        get_scale_from_matrix(matrix),
    )
}

pub fn compose(
    position: Vector3<f32>,
    rotation: Quaternion<f32>,
    scale: Vector3<f32>,
) -> Matrix4<f32> {
    Matrix4::from_translation(position)
        * Matrix4::from(rotation)
        * Matrix4::from_nonuniform_scale(scale.x, scale.y, scale.z)
}
