// Re-export glam for convenience
pub use glam::*;

/// 2D point / UV coordinate (f64).
pub type Point2 = glam::DVec2;
/// 3D position (f64).
pub type Point3 = glam::DVec3;
/// 3D direction or offset (f64).
pub type Vector3 = glam::DVec3;
/// Linear RGB color (f32).
pub type Color = glam::Vec3;

// Rake math types
mod aabb;
mod ray;
pub use aabb::Aabb;
pub use ray::Ray;
