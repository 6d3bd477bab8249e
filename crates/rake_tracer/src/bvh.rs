//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree over the scene's hittables, built with a random split axis
//! and a median partition. Good enough for this scene complexity without the
//! build cost of SAH.

use std::sync::Arc;

use rake_math::{Aabb, Ray};
use thiserror::Error;

use crate::hittable::{HitRecord, Hittable, HittableList};
use crate::random::random_axis;

/// Errors that can occur while building a BVH.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BvhError {
    #[error("cannot construct a BVH with 0 objects")]
    EmptyScene,

    #[error("failed to get bounds for a hittable during BVH construction")]
    MissingBounds,
}

/// Interior node of the hierarchy.
///
/// Leaves are the hittables themselves; a single-object subtree stores the
/// same object in both children, which traversal tolerates.
pub struct BvhNode {
    left: Arc<dyn Hittable>,
    right: Arc<dyn Hittable>,
    bounds: Aabb,
}

impl std::fmt::Debug for BvhNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BvhNode").field("bounds", &self.bounds).finish()
    }
}

impl BvhNode {
    /// Build a BVH over the objects of a list.
    pub fn new(list: &HittableList) -> Result<Self, BvhError> {
        Self::build(list.objects.clone())
    }

    fn build(objects: Vec<Arc<dyn Hittable>>) -> Result<Self, BvhError> {
        let axis = random_axis();

        let (left, right): (Arc<dyn Hittable>, Arc<dyn Hittable>) = match objects.len() {
            0 => return Err(BvhError::EmptyScene),
            1 => (objects[0].clone(), objects[0].clone()),
            2 => {
                let a = objects[0].clone();
                let b = objects[1].clone();
                if min_on_axis(&*a, axis)? < min_on_axis(&*b, axis)? {
                    (a, b)
                } else {
                    (b, a)
                }
            }
            _ => {
                let mut keyed = objects
                    .into_iter()
                    .map(|object| Ok((min_on_axis(&*object, axis)?, object)))
                    .collect::<Result<Vec<_>, BvhError>>()?;

                // Partial sort: everything below the median on the split
                // axis lands in the left half.
                let mid = keyed.len() / 2;
                keyed.select_nth_unstable_by(mid, |a, b| a.0.total_cmp(&b.0));

                let right_half: Vec<_> = keyed.split_off(mid).into_iter().map(|(_, o)| o).collect();
                let left_half: Vec<_> = keyed.into_iter().map(|(_, o)| o).collect();

                (
                    Arc::new(Self::build(left_half)?) as Arc<dyn Hittable>,
                    Arc::new(Self::build(right_half)?) as Arc<dyn Hittable>,
                )
            }
        };

        let bounds = child_bounds(&*left)?.surrounding(&child_bounds(&*right)?);

        Ok(Self {
            left,
            right,
            bounds,
        })
    }
}

fn min_on_axis(object: &dyn Hittable, axis: usize) -> Result<f64, BvhError> {
    Ok(child_bounds(object)?.min[axis])
}

fn child_bounds(object: &dyn Hittable) -> Result<Aabb, BvhError> {
    object.bounds().ok_or(BvhError::MissingBounds)
}

impl Hittable for BvhNode {
    fn hit<'a>(&'a self, ray: &Ray, t_min: f64, t_max: f64, rec: &mut HitRecord<'a>) -> bool {
        if !self.bounds.hit(ray, t_min, t_max) {
            return false;
        }

        let hit_left = self.left.hit(ray, t_min, t_max, rec);

        // Only check right up to the closest hit found on the left.
        let right_max = if hit_left { rec.distance } else { t_max };
        let hit_right = self.right.hit(ray, t_min, right_max, rec);

        hit_left || hit_right
    }

    fn bounds(&self) -> Option<Aabb> {
        Some(self.bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Lambertian;
    use crate::random::{random_range, random_in_unit_sphere};
    use crate::sphere::Sphere;
    use rake_math::{Color, Point3, Vector3};

    fn matte_sphere(center: Point3, radius: f64) -> Arc<dyn Hittable> {
        Arc::new(Sphere::new(
            center,
            radius,
            Arc::new(Lambertian::new(Color::new(0.5, 0.5, 0.5))),
        ))
    }

    #[test]
    fn test_bvh_empty_scene() {
        let list = HittableList::new();
        assert_eq!(BvhNode::new(&list).unwrap_err(), BvhError::EmptyScene);
    }

    #[test]
    fn test_bvh_missing_bounds() {
        struct Boundless;

        impl Hittable for Boundless {
            fn hit<'a>(
                &'a self,
                _ray: &Ray,
                _t_min: f64,
                _t_max: f64,
                _rec: &mut HitRecord<'a>,
            ) -> bool {
                false
            }

            fn bounds(&self) -> Option<Aabb> {
                None
            }
        }

        let mut list = HittableList::new();
        list.add(Arc::new(Boundless));
        assert_eq!(BvhNode::new(&list).unwrap_err(), BvhError::MissingBounds);
    }

    #[test]
    fn test_bvh_single_object_duplicates_child() {
        let mut list = HittableList::new();
        list.add(matte_sphere(Point3::new(0.0, 0.0, -1.0), 0.5));

        let bvh = BvhNode::new(&list).unwrap();

        let ray = Ray::new(Point3::ZERO, Vector3::new(0.0, 0.0, -1.0));
        let mut rec = HitRecord::default();
        assert!(bvh.hit(&ray, 0.001, f64::INFINITY, &mut rec));
        assert!((rec.distance - 0.5).abs() < 1e-9);

        // Both children are the same leaf.
        let sphere_bounds = list.objects[0].bounds().unwrap();
        assert_eq!(bvh.left.bounds().unwrap(), sphere_bounds);
        assert_eq!(bvh.right.bounds().unwrap(), sphere_bounds);
    }

    #[test]
    fn test_bvh_bounds_contain_children() {
        fn check(node: &BvhNode) {
            for child in [&node.left, &node.right] {
                let child_bounds = child.bounds().unwrap();
                let union = node.bounds.surrounding(&child_bounds);
                assert_eq!(union, node.bounds);
            }
        }

        let mut list = HittableList::new();
        for i in 0..32 {
            let center = Point3::new(
                f64::from(i % 4) * 2.0,
                f64::from((i / 4) % 4) * 2.0,
                -f64::from(i / 16) * 2.0 - 1.0,
            );
            list.add(matte_sphere(center, 0.4));
        }

        let bvh = BvhNode::new(&list).unwrap();
        check(&bvh);

        // The root bounds also contain every object.
        let list_bounds = list.bounds().unwrap();
        assert_eq!(bvh.bounds.surrounding(&list_bounds), bvh.bounds);
    }

    #[test]
    fn test_bvh_matches_linear_list() {
        // Randomly scattered spheres: the BVH must agree with the brute
        // force list on every ray, in distance and material.
        let mut list = HittableList::new();
        for _ in 0..200 {
            let center = Point3::new(
                random_range(-20.0, 20.0),
                random_range(-20.0, 20.0),
                random_range(-20.0, 20.0),
            );
            list.add(matte_sphere(center, random_range(0.1, 1.5)));
        }

        let bvh = BvhNode::new(&list).unwrap();

        for _ in 0..1000 {
            let origin = Point3::new(
                random_range(-25.0, 25.0),
                random_range(-25.0, 25.0),
                random_range(-25.0, 25.0),
            );
            let mut direction = random_in_unit_sphere();
            while direction.length() < 0.1 {
                direction = random_in_unit_sphere();
            }
            let ray = Ray::new(origin, direction.normalize());

            let mut bvh_rec = HitRecord::default();
            let mut list_rec = HitRecord::default();
            let bvh_hit = bvh.hit(&ray, 0.001, f64::INFINITY, &mut bvh_rec);
            let list_hit = list.hit(&ray, 0.001, f64::INFINITY, &mut list_rec);

            assert_eq!(bvh_hit, list_hit);
            if bvh_hit {
                assert!((bvh_rec.distance - list_rec.distance).abs() < 1e-9);
                assert!(std::ptr::eq(
                    bvh_rec.material as *const _ as *const (),
                    list_rec.material as *const _ as *const (),
                ));
            }
        }
    }
}
