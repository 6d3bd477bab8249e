//! Thin-lens camera for primary ray generation.

use rake_math::{Point3, Ray, Vector3};

use crate::random::random_in_unit_disk;

/// Thin-lens camera.
///
/// A pure function of its constructor arguments, rebuilt from world
/// parameters at the start of every trace. `get_ray` is reentrant; its only
/// state is the thread-local RNG.
#[derive(Debug, Clone)]
pub struct Camera {
    origin: Point3,
    lower_left_corner: Point3,
    horizontal: Vector3,
    vertical: Vector3,
    right: Vector3,
    up: Vector3,
    lens_radius: f64,
}

impl Camera {
    /// Create a camera at `position` looking at `target`.
    ///
    /// - `v_fov`: vertical field of view in degrees
    /// - `aperture`: lens diameter; 0 disables depth of field
    /// - `focus_dist`: distance to the plane of perfect focus
    pub fn new(
        position: Point3,
        target: Point3,
        v_fov: f64,
        aspect_ratio: f64,
        aperture: f64,
        focus_dist: f64,
    ) -> Self {
        let theta = v_fov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h;
        let viewport_width = aspect_ratio * viewport_height;

        let forward = (position - target).normalize();
        let right = Vector3::Y.cross(forward).normalize();
        let up = forward.cross(right);

        let origin = position;
        let horizontal = focus_dist * viewport_width * right;
        let vertical = focus_dist * viewport_height * up;
        let lower_left_corner = origin - horizontal / 2.0 - vertical / 2.0 - focus_dist * forward;

        Self {
            origin,
            lower_left_corner,
            horizontal,
            vertical,
            right,
            up,
            lens_radius: aperture / 2.0,
        }
    }

    /// Generate a primary ray through viewport coordinates (s, t) in [0, 1],
    /// jittered over the lens disk for depth of field.
    pub fn get_ray(&self, s: f64, t: f64) -> Ray {
        let rd = self.lens_radius * random_in_unit_disk();
        let offset = rd.x * self.right + rd.y * self.up;

        Ray::new(
            self.origin + offset,
            (self.lower_left_corner + s * self.horizontal + t * self.vertical
                - self.origin
                - offset)
                .normalize(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hittable::{HitRecord, Hittable};
    use crate::material::Lambertian;
    use crate::sphere::Sphere;
    use rake_math::Color;
    use std::sync::Arc;

    fn pinhole_camera() -> Camera {
        Camera::new(
            Point3::ZERO,
            Point3::new(0.0, 0.0, -1.0),
            90.0,
            1.0,
            0.0,
            1.0,
        )
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let camera = pinhole_camera();

        let ray = camera.get_ray(0.5, 0.5);
        assert_eq!(ray.origin, Point3::ZERO);
        assert!((ray.direction - Vector3::new(0.0, 0.0, -1.0)).length() < 1e-12);
    }

    #[test]
    fn test_viewport_corners_at_90_degrees() {
        let camera = pinhole_camera();

        // 90 degree FOV at focus 1: the viewport spans [-1, 1] in x and y.
        let ray = camera.get_ray(0.0, 0.0);
        let expected = Vector3::new(-1.0, -1.0, -1.0).normalize();
        assert!((ray.direction - expected).length() < 1e-12);

        let ray = camera.get_ray(1.0, 1.0);
        let expected = Vector3::new(1.0, 1.0, -1.0).normalize();
        assert!((ray.direction - expected).length() < 1e-12);
    }

    #[test]
    fn test_center_ray_hits_sphere() {
        // Camera at the origin looking down -z at a sphere half a unit deep:
        // the center ray strikes the near surface head on.
        let camera = pinhole_camera();
        let sphere = Sphere::new(
            Point3::new(0.0, 0.0, -1.0),
            0.5,
            Arc::new(Lambertian::new(Color::new(1.0, 0.0, 0.0))),
        );

        let ray = camera.get_ray(0.5, 0.5);
        let mut rec = HitRecord::default();
        assert!(sphere.hit(&ray, 0.001, f64::INFINITY, &mut rec));
        assert!((rec.distance - 0.5).abs() < 1e-9);
        assert!((rec.normal - Vector3::new(0.0, 0.0, 1.0)).length() < 1e-9);
        assert!((rec.uv.x - 0.25).abs() < 1e-9);
        assert!((rec.uv.y - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_aperture_jitters_origin() {
        let camera = Camera::new(
            Point3::ZERO,
            Point3::new(0.0, 0.0, -1.0),
            90.0,
            1.0,
            0.5,
            1.0,
        );

        let mut saw_offset = false;
        for _ in 0..100 {
            let ray = camera.get_ray(0.5, 0.5);
            assert!(ray.origin.length() <= 0.25 + 1e-9);
            if ray.origin.length() > 1e-6 {
                saw_offset = true;
            }
        }
        assert!(saw_offset);
    }
}
