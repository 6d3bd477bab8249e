//! Rake tracer - progressive CPU path tracing.
//!
//! A Monte Carlo path tracer that renders incrementally: a pool of worker
//! threads pulls band tasks off a shared queue, accumulates one sample at a
//! time, and a foreground consumer polls averaged snapshots while the image
//! refines. Traces are cancellable between band-samples.

mod bvh;
mod camera;
mod export;
mod hittable;
mod material;
pub mod random;
mod rect;
mod sky;
mod sphere;
mod texture;
mod tracer;
mod world;

pub use bvh::{BvhError, BvhNode};
pub use camera::Camera;
pub use export::{export_png, ExportError};
pub use hittable::{HitRecord, Hittable, HittableList};
pub use material::{Dielectric, DiffuseLight, Lambertian, Material, Metal, Scatter};
pub use rect::{Axis, Rect};
pub use sky::{GradientSky, SkyMaterial, SolidSky};
pub use sphere::Sphere;
pub use texture::{CheckerTexture, ImageTexture, SolidTexture, Texture, TextureError};
pub use tracer::Tracer;
pub use world::World;

/// Re-export the shared math types from rake_math
pub use rake_math::{Aabb, Color, Point2, Point3, Ray, Vector3};
