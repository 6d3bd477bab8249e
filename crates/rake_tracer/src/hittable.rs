//! Hittable trait and HitRecord for ray-object intersection.

use std::sync::Arc;

use rake_math::{Aabb, Point2, Point3, Ray, Vector3};

use crate::material::{Material, Scatter};

/// A fallback material used for `HitRecord::default()`.
/// Always absorbs light (returns None from scatter).
struct AbsorbingMaterial;

impl Material for AbsorbingMaterial {
    fn scatter(&self, _ray: &Ray, _hit: &HitRecord) -> Option<Scatter> {
        None
    }
}

static ABSORBING_MATERIAL: AbsorbingMaterial = AbsorbingMaterial;

/// Record of a ray-object intersection.
#[derive(Clone)]
pub struct HitRecord<'a> {
    /// Point of intersection
    pub point: Point3,
    /// Distance along the ray to the intersection
    pub distance: f64,
    /// Surface normal at the intersection (always points against the ray)
    pub normal: Vector3,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
    /// Surface UV coordinates
    pub uv: Point2,
    /// Material at the intersection point
    pub material: &'a dyn Material,
}

impl Default for HitRecord<'_> {
    fn default() -> Self {
        Self {
            point: Point3::ZERO,
            distance: 0.0,
            normal: Vector3::ZERO,
            front_face: false,
            uv: Point2::ZERO,
            material: &ABSORBING_MATERIAL,
        }
    }
}

impl<'a> HitRecord<'a> {
    /// Set the face normal based on ray direction and outward normal.
    ///
    /// The normal is always stored pointing against the ray direction,
    /// so we need to track whether we hit the front or back face.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vector3) {
        self.front_face = ray.direction.dot(outward_normal) < 0.0;

        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }
}

/// Trait for objects that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Test if a ray hits this object within `(t_min, t_max)`.
    ///
    /// Returns true if hit, and fills in the hit record.
    fn hit<'a>(&'a self, ray: &Ray, t_min: f64, t_max: f64, rec: &mut HitRecord<'a>) -> bool;

    /// Axis-aligned bounding box, or `None` if the object cannot report one.
    fn bounds(&self) -> Option<Aabb>;
}

/// An ordered list of hittable objects; the input to BVH construction.
pub struct HittableList {
    pub objects: Vec<Arc<dyn Hittable>>,
}

impl HittableList {
    /// Create a new empty hittable list.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
        }
    }

    /// Add an object to the list.
    pub fn add(&mut self, object: Arc<dyn Hittable>) {
        self.objects.push(object);
    }

    /// Clear all objects from the list.
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Get the number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Default for HittableList {
    fn default() -> Self {
        Self::new()
    }
}

impl Hittable for HittableList {
    fn hit<'a>(&'a self, ray: &Ray, t_min: f64, t_max: f64, rec: &mut HitRecord<'a>) -> bool {
        let mut hit_anything = false;
        let mut closest_so_far = t_max;

        for object in &self.objects {
            if object.hit(ray, t_min, closest_so_far, rec) {
                hit_anything = true;
                closest_so_far = rec.distance;
            }
        }

        hit_anything
    }

    fn bounds(&self) -> Option<Aabb> {
        if self.objects.is_empty() {
            return None;
        }

        let mut bounds = Aabb::EMPTY;
        for object in &self.objects {
            bounds = bounds.surrounding(&object.bounds()?);
        }

        Some(bounds)
    }
}
