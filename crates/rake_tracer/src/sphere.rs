//! Sphere primitive.

use std::f64::consts::PI;
use std::sync::Arc;

use rake_math::{Aabb, Point2, Point3, Ray, Vector3};

use crate::hittable::{HitRecord, Hittable};
use crate::material::Material;

/// A sphere primitive.
pub struct Sphere {
    pub center: Point3,
    pub radius: f64,
    pub material: Arc<dyn Material>,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(center: Point3, radius: f64, material: Arc<dyn Material>) -> Self {
        Self {
            center,
            radius,
            material,
        }
    }

    /// Get the UV coordinates for a point on the unit sphere.
    fn get_uv(p: Point3) -> Point2 {
        // theta: angle down from +Y, phi: angle around Y from +X.
        // acos is clamped so points a hair outside the unit sphere from
        // floating point error do not produce NaN.
        let theta = (-p.y).clamp(-1.0, 1.0).acos();
        let phi = (-p.z).atan2(p.x) + PI;

        Point2::new(phi / (2.0 * PI), theta / PI)
    }
}

impl Hittable for Sphere {
    fn hit<'a>(&'a self, ray: &Ray, t_min: f64, t_max: f64, rec: &mut HitRecord<'a>) -> bool {
        // Ray directions are unit length, so the quadratic's leading
        // coefficient is 1 and drops out.
        let oc = ray.origin - self.center;
        let half_b = oc.dot(ray.direction);
        let c = oc.dot(oc) - self.radius * self.radius;

        let discriminant = half_b * half_b - c;
        if discriminant < 0.0 {
            return false;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = -half_b - sqrtd;
        if root < t_min || t_max < root {
            root = -half_b + sqrtd;
            if root < t_min || t_max < root {
                return false;
            }
        }

        rec.distance = root;
        rec.point = ray.at(rec.distance);
        let outward_normal = (rec.point - self.center) / self.radius;
        rec.set_face_normal(ray, outward_normal);
        rec.uv = Self::get_uv(outward_normal);
        rec.material = &*self.material;

        true
    }

    fn bounds(&self) -> Option<Aabb> {
        let r = self.radius.abs();
        Some(Aabb::new(
            self.center - Vector3::splat(r),
            self.center + Vector3::splat(r),
        ))
    }
}
