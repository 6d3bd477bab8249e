use crate::{Point3, Vector3};

/// A ray with origin, unit direction, and cached inverse direction.
///
/// Callers construct rays with a normalized direction. The inverse is
/// computed once so the AABB slab test is a pure multiply; zero direction
/// components produce infinities, which the slab test handles.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Point3,
    pub direction: Vector3,
    pub inv_direction: Vector3,
}

impl Ray {
    /// Create a new ray. `direction` must be unit length.
    pub fn new(origin: Point3, direction: Vector3) -> Self {
        Self {
            origin,
            direction,
            inv_direction: direction.recip(),
        }
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Point3::ZERO, Vector3::X);

        assert_eq!(ray.at(0.0), Point3::ZERO);
        assert_eq!(ray.at(1.0), Point3::X);
        assert_eq!(ray.at(2.0), Point3::new(2.0, 0.0, 0.0));
        assert_eq!(ray.at(-1.0), Point3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_ray_inv_direction() {
        let ray = Ray::new(Point3::ZERO, Vector3::new(0.5, -0.25, 1.0));
        assert_eq!(ray.inv_direction, Vector3::new(2.0, -4.0, 1.0));
    }

    #[test]
    fn test_ray_inv_direction_zero_component() {
        // Axis-aligned directions have zero components; the inverse holds
        // infinities there, which is legal input for the slab test.
        let ray = Ray::new(Point3::ZERO, Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(ray.inv_direction.x, f64::INFINITY);
        assert_eq!(ray.inv_direction.y, 1.0);
        assert_eq!(ray.inv_direction.z, f64::INFINITY);
    }
}
