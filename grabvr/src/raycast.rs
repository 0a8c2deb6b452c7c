use cgmath::{InnerSpace, Matrix4, Vector3, vec3};
use engine::util::{get_position_from_matrix, get_rotation_from_matrix};
use ordered_float::OrderedFloat;
use rapier3d::{parry::query::Ray, prelude::SharedShape};

use crate::physics::util::{isometry_from_pose, vec_to_npoint, vec_to_nvec};

/// A controller's pointing ray in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerRay {
    pub origin: Vector3<f32>,
    /// Unit length.
    pub direction: Vector3<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit<T> {
    pub target: T,
    pub distance: f32,
    pub point: Vector3<f32>,
}

impl PointerRay {
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Ray leaving the origin of `transform` along its local -Z axis.
    pub fn from_transform(transform: &Matrix4<f32>) -> Self {
        let rotation = get_rotation_from_matrix(transform);
        Self::new(
            get_position_from_matrix(transform),
            rotation * vec3(0.0, 0.0, -1.0),
        )
    }

    pub fn at(&self, distance: f32) -> Vector3<f32> {
        self.origin + self.direction * distance
    }

    /// Nearest hit among `candidates` within `max_distance`.
    ///
    /// Candidates are `(target, world matrix, shape)`. Shapes are posed by the
    /// translation and rotation of the world matrix; scale is not applied.
    pub fn cast<'a, T, I>(&self, max_distance: f32, candidates: I) -> Option<RayHit<T>>
    where
        I: IntoIterator<Item = (T, Matrix4<f32>, &'a SharedShape)>,
    {
        let ray = Ray::new(vec_to_npoint(self.origin), vec_to_nvec(self.direction));

        candidates
            .into_iter()
            .filter_map(|(target, world, shape)| {
                let isometry = isometry_from_pose(
                    get_position_from_matrix(&world),
                    get_rotation_from_matrix(&world),
                );
                shape
                    .cast_ray(&isometry, &ray, max_distance, true)
                    .map(|distance| (target, distance))
            })
            .min_by_key(|(_, distance)| OrderedFloat(*distance))
            .map(|(target, distance)| RayHit {
                target,
                distance,
                point: self.at(distance),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rapier3d::na::Vector3 as NVector3;

    fn near(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-4
    }

    #[test]
    fn test_downward_ray_hits_floor_at_origin() {
        let floor = SharedShape::halfspace(NVector3::y_axis());
        let ray = PointerRay::new(vec3(0.0, 2.0, 0.0), vec3(0.0, -1.0, 0.0));

        let hit = ray
            .cast(50.0, [("floor", Matrix4::from_scale(1.0), &floor)])
            .unwrap();

        assert_eq!(hit.target, "floor");
        assert!((hit.distance - 2.0).abs() < 1e-5);
        assert!(near(hit.point, vec3(0.0, 0.0, 0.0)));
    }

    #[test]
    fn test_nearest_candidate_wins() {
        let ball = SharedShape::ball(0.5);
        let ray = PointerRay::new(vec3(0.0, 0.0, 0.0), vec3(0.0, 0.0, -1.0));
        let far = Matrix4::from_translation(vec3(0.0, 0.0, -10.0));
        let close = Matrix4::from_translation(vec3(0.0, 0.0, -3.0));

        let hit = ray.cast(50.0, [(1, far, &ball), (2, close, &ball)]).unwrap();

        assert_eq!(hit.target, 2);
        assert!((hit.distance - 2.5).abs() < 1e-4);
    }

    #[test]
    fn test_max_distance_limits_hits() {
        let ball = SharedShape::ball(0.5);
        let ray = PointerRay::new(vec3(0.0, 0.0, 0.0), vec3(0.0, 0.0, -1.0));
        let far = Matrix4::from_translation(vec3(0.0, 0.0, -10.0));

        assert!(ray.cast(5.0, [(1, far, &ball)]).is_none());
        assert!(ray.cast(50.0, std::iter::empty::<(u32, Matrix4<f32>, &SharedShape)>()).is_none());
    }

    #[test]
    fn test_ray_from_transform_points_down_local_negative_z() {
        let transform = Matrix4::from_translation(vec3(1.0, 2.0, 3.0))
            * Matrix4::from(cgmath::Quaternion::from_arc(
                vec3(0.0, 0.0, -1.0),
                vec3(0.0, -1.0, 0.0),
                None,
            ));

        let ray = PointerRay::from_transform(&transform);

        assert!(near(ray.origin, vec3(1.0, 2.0, 3.0)));
        assert!(near(ray.direction, vec3(0.0, -1.0, 0.0)));
    }
}
