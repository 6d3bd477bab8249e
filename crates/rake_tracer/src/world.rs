//! Named scene: geometry, sky, and the camera parameters used to photograph
//! it.

use std::sync::{Arc, OnceLock};

use rake_math::{Color, Point3};

use crate::bvh::{BvhError, BvhNode};
use crate::hittable::HittableList;
use crate::sky::{GradientSky, SkyMaterial};

/// A scene the tracer can photograph.
///
/// Immutable while a trace is in flight. The BVH is built on first use and
/// cached, so repeated traces of the same world share one tree.
pub struct World {
    pub name: String,
    pub objects: HittableList,
    pub sky: Arc<dyn SkyMaterial>,
    pub vertical_fov: f64,
    pub camera_pos: Point3,
    pub camera_target: Point3,
    pub camera_aperture: f64,
    pub camera_focus_distance: f64,
    bvh: OnceLock<Arc<BvhNode>>,
}

impl World {
    /// Create an empty world with the default camera and gradient sky.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: HittableList::new(),
            sky: Arc::new(GradientSky::new(
                Color::ONE,
                Color::new(0.5, 0.7, 1.0),
                0.5,
            )),
            vertical_fov: 90.0,
            camera_pos: Point3::ZERO,
            camera_target: Point3::new(0.0, 0.0, -1.0),
            camera_aperture: 0.01,
            camera_focus_distance: 100.0,
            bvh: OnceLock::new(),
        }
    }

    /// Build (once) and return the BVH over this world's objects.
    ///
    /// Concurrent first calls may build twice; one result wins and the
    /// other is dropped.
    pub fn construct_bvh(&self) -> Result<Arc<BvhNode>, BvhError> {
        if let Some(bvh) = self.bvh.get() {
            return Ok(bvh.clone());
        }

        let built = Arc::new(BvhNode::new(&self.objects)?);
        Ok(self.bvh.get_or_init(|| built).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bvh::BvhError;
    use crate::material::Lambertian;
    use crate::sphere::Sphere;

    #[test]
    fn test_empty_world_has_no_bvh() {
        let world = World::new("empty");
        assert_eq!(world.construct_bvh().unwrap_err(), BvhError::EmptyScene);
    }

    #[test]
    fn test_bvh_is_cached() {
        let mut world = World::new("one sphere");
        world.objects.add(Arc::new(Sphere::new(
            Point3::new(0.0, 0.0, -1.0),
            0.5,
            Arc::new(Lambertian::new(Color::new(0.5, 0.5, 0.5))),
        )));

        let first = world.construct_bvh().unwrap();
        let second = world.construct_bvh().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
