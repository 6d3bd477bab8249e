//! Axis-aligned rectangles and their degenerate infinite-plane form.

use std::sync::Arc;

use rake_math::{Aabb, Point2, Point3, Ray, Vector3};

use crate::hittable::{HitRecord, Hittable};
use crate::material::Material;

/// Thickness given to a rectangle's bounding box along its flat axis.
const BOUNDS_PADDING: f64 = 0.0001;

/// Plane orientation of a [`Rect`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Axis {
    XY,
    XZ,
    YZ,
}

impl Axis {
    /// Outward unit normal of a rectangle with this orientation.
    fn normal(self) -> Vector3 {
        match self {
            Axis::XY => Vector3::Z,
            Axis::XZ => Vector3::Y,
            Axis::YZ => Vector3::X,
        }
    }

    /// Component indices as (in-plane a, in-plane b, flat axis).
    fn indices(self) -> (usize, usize, usize) {
        match self {
            Axis::XY => (0, 1, 2),
            Axis::XZ => (0, 2, 1),
            Axis::YZ => (1, 2, 0),
        }
    }
}

/// Pick the canonical in-plane direction for a surface normal: the largest
/// of the normal's cross products with the three coordinate axes.
///
/// Ambiguous for normals diagonal to all axes (the cross products tie); the
/// tie-breaking below is kept as-is and must not be "fixed" to assume
/// axis-aligned normals.
fn primary_dir(normal: Vector3) -> Vector3 {
    let a = normal.cross(Vector3::X);
    let b = normal.cross(Vector3::Y);
    let max_ab = if a.dot(a) < b.dot(b) { b } else { a };
    let c = normal.cross(Vector3::Z);
    let max_abc = if max_ab.dot(max_ab) < c.dot(c) {
        c
    } else {
        max_ab
    };

    max_abc.normalize()
}

/// An axis-aligned rectangle at `k` along its flat axis, spanning
/// `min..max` over its two in-plane axes.
pub struct Rect {
    pub axis: Axis,
    pub min: Point2,
    pub max: Point2,
    pub k: f64,
    pub material: Arc<dyn Material>,
}

impl Rect {
    /// Create a new rectangle.
    pub fn new(axis: Axis, min: Point2, max: Point2, k: f64, material: Arc<dyn Material>) -> Self {
        Self {
            axis,
            min,
            max,
            k,
            material,
        }
    }

    /// Create an infinite plane: a rectangle with unbounded extents.
    pub fn plane(axis: Axis, k: f64, material: Arc<dyn Material>) -> Self {
        Self::new(
            axis,
            Point2::splat(f64::NEG_INFINITY),
            Point2::splat(f64::INFINITY),
            k,
            material,
        )
    }
}

impl Hittable for Rect {
    fn hit<'a>(&'a self, ray: &Ray, t_min: f64, t_max: f64, rec: &mut HitRecord<'a>) -> bool {
        let (a, b, k) = self.axis.indices();

        let t = (self.k - ray.origin[k]) * ray.inv_direction[k];
        // NaN here means the ray lies in the rectangle's plane.
        if !t.is_finite() || t < t_min || t > t_max {
            return false;
        }

        let pa = ray.origin[a] + t * ray.direction[a];
        let pb = ray.origin[b] + t * ray.direction[b];
        if pa < self.min.x || pa > self.max.x || pb < self.min.y || pb > self.max.y {
            return false;
        }

        rec.distance = t;
        rec.point = ray.at(rec.distance);
        let outward_normal = self.axis.normal();
        rec.set_face_normal(ray, outward_normal);
        rec.material = &*self.material;
        let u_dir = primary_dir(outward_normal);
        let v_dir = outward_normal.cross(u_dir);
        rec.uv = Point2::new(u_dir.dot(rec.point), v_dir.dot(rec.point));

        true
    }

    fn bounds(&self) -> Option<Aabb> {
        let (a, b, k) = self.axis.indices();

        let mut min = Point3::ZERO;
        let mut max = Point3::ZERO;
        min[a] = self.min.x;
        min[b] = self.min.y;
        min[k] = self.k - BOUNDS_PADDING;
        max[a] = self.max.x;
        max[b] = self.max.y;
        max[k] = self.k + BOUNDS_PADDING;

        Some(Aabb::new(min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Lambertian;
    use rake_math::Color;

    fn matte() -> Arc<dyn Material> {
        Arc::new(Lambertian::new(Color::new(0.5, 0.5, 0.5)))
    }

    #[test]
    fn test_xy_rect_hit() {
        let rect = Rect::new(
            Axis::XY,
            Point2::new(-1.0, -1.0),
            Point2::new(1.0, 1.0),
            -2.0,
            matte(),
        );

        let ray = Ray::new(Point3::ZERO, Vector3::new(0.0, 0.0, -1.0));
        let mut rec = HitRecord::default();
        assert!(rect.hit(&ray, 0.001, f64::INFINITY, &mut rec));
        assert!((rec.distance - 2.0).abs() < 1e-9);
        assert!(rec.front_face);
        assert_eq!(rec.normal, Vector3::Z);

        // Ray past the rectangle's edge misses.
        let ray = Ray::new(
            Point3::new(1.5, 0.0, 0.0),
            Vector3::new(0.0, 0.0, -1.0),
        );
        assert!(!rect.hit(&ray, 0.001, f64::INFINITY, &mut rec));
    }

    #[test]
    fn test_xz_rect_back_face() {
        let rect = Rect::new(
            Axis::XZ,
            Point2::new(-1.0, -1.0),
            Point2::new(1.0, 1.0),
            1.0,
            matte(),
        );

        // Approaching from below: the +Y normal faces away, so this is a
        // back-face hit and the stored normal flips.
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0));
        let mut rec = HitRecord::default();
        assert!(rect.hit(&ray, 0.001, f64::INFINITY, &mut rec));
        assert!(!rec.front_face);
        assert_eq!(rec.normal, Vector3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn test_rect_parallel_ray_misses() {
        let rect = Rect::new(
            Axis::XY,
            Point2::new(-1.0, -1.0),
            Point2::new(1.0, 1.0),
            0.0,
            matte(),
        );

        // Ray travelling inside the rectangle's plane.
        let ray = Ray::new(Point3::new(-5.0, 0.0, 0.0), Vector3::X);
        let mut rec = HitRecord::default();
        assert!(!rect.hit(&ray, 0.001, f64::INFINITY, &mut rec));
    }

    #[test]
    fn test_rect_bounds_are_padded() {
        let rect = Rect::new(
            Axis::YZ,
            Point2::new(-1.0, -2.0),
            Point2::new(1.0, 2.0),
            3.0,
            matte(),
        );

        let bounds = rect.bounds().unwrap();
        assert_eq!(bounds.min, Point3::new(3.0 - BOUNDS_PADDING, -1.0, -2.0));
        assert_eq!(bounds.max, Point3::new(3.0 + BOUNDS_PADDING, 1.0, 2.0));
    }

    #[test]
    fn test_plane_extends_everywhere() {
        let plane = Rect::plane(Axis::XZ, 0.0, matte());

        let ray = Ray::new(
            Point3::new(1000.0, 5.0, -2000.0),
            Vector3::new(0.0, -1.0, 0.0),
        );
        let mut rec = HitRecord::default();
        assert!(plane.hit(&ray, 0.001, f64::INFINITY, &mut rec));
        assert!((rec.distance - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_primary_dir_for_axis_normals() {
        // For an axis-aligned normal the heuristic picks a unit in-plane
        // axis; together with cross(n, u) it spans the rectangle's plane.
        for normal in [Vector3::X, Vector3::Y, Vector3::Z] {
            let u = primary_dir(normal);
            assert!((u.length() - 1.0).abs() < 1e-12);
            assert!(u.dot(normal).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rect_uv_from_in_plane_basis() {
        let rect = Rect::new(
            Axis::XY,
            Point2::new(-4.0, -4.0),
            Point2::new(4.0, 4.0),
            0.0,
            matte(),
        );

        // Normal +Z: the X and Y cross products tie at unit length, the X
        // product wins the tie, so u_dir = Y and v_dir = cross(Z, Y) = -X.
        let ray = Ray::new(Point3::new(1.0, 2.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
        let mut rec = HitRecord::default();
        assert!(rect.hit(&ray, 0.001, f64::INFINITY, &mut rec));
        let u_dir = primary_dir(Vector3::Z);
        let v_dir = Vector3::Z.cross(u_dir);
        assert!((rec.uv.x - u_dir.dot(rec.point)).abs() < 1e-12);
        assert!((rec.uv.y - v_dir.dot(rec.point)).abs() < 1e-12);
    }
}
