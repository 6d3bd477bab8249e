//! Material trait for surface scattering.

use std::sync::Arc;

use rake_math::{Color, Point2, Point3, Ray, Vector3};

use crate::hittable::HitRecord;
use crate::random::{random_double, random_in_hemisphere, random_in_unit_sphere};
use crate::texture::{SolidTexture, Texture};

/// Result of scattering a ray off a material.
#[derive(Debug, Clone, Copy)]
pub struct Scatter {
    /// Color attenuation applied to the scattered path
    pub attenuation: Color,
    /// The scattered ray
    pub scattered: Ray,
}

/// Trait for materials that describe how light interacts with surfaces.
pub trait Material: Send + Sync {
    /// Get emitted light at the hit point.
    ///
    /// Most materials return black (no emission).
    fn emit(&self, _uv: Point2, _p: Point3) -> Color {
        Color::ZERO
    }

    /// Scatter an incoming ray.
    ///
    /// Returns Some(Scatter) if the ray scatters, or None if absorbed.
    fn scatter(&self, ray: &Ray, hit: &HitRecord) -> Option<Scatter>;
}

/// Lambertian (diffuse) material.
pub struct Lambertian {
    texture: Arc<dyn Texture>,
}

impl Lambertian {
    /// Create a new Lambertian material with a flat albedo color.
    pub fn new(albedo: Color) -> Self {
        Self {
            texture: Arc::new(SolidTexture::new(albedo)),
        }
    }

    /// Create a new Lambertian material sampling the given texture.
    pub fn textured(texture: Arc<dyn Texture>) -> Self {
        Self { texture }
    }
}

impl Material for Lambertian {
    fn scatter(&self, _ray: &Ray, hit: &HitRecord) -> Option<Scatter> {
        let mut target = random_in_hemisphere(hit.normal);

        // Catch degenerate scatter directions before normalizing.
        if target.length() < 0.001 {
            target = hit.normal;
        }

        Some(Scatter {
            attenuation: self.texture.sample(hit.uv, hit.point),
            scattered: Ray::new(hit.point, target.normalize()),
        })
    }
}

/// Metal (specular) material.
pub struct Metal {
    albedo: Color,
    roughness: f64,
}

impl Metal {
    /// Create a new Metal material.
    ///
    /// - `albedo`: The color of the metal
    /// - `roughness`: 0.0 = perfect mirror, 1.0 = very rough
    pub fn new(albedo: Color, roughness: f64) -> Self {
        Self {
            albedo,
            roughness: roughness.clamp(0.0, 1.0),
        }
    }
}

impl Material for Metal {
    fn scatter(&self, ray: &Ray, hit: &HitRecord) -> Option<Scatter> {
        let reflected =
            reflect(ray.direction.normalize(), hit.normal) + self.roughness * random_in_unit_sphere();
        let scattered = Ray::new(hit.point, reflected.normalize());

        // Rough samples can end up under the surface; those are absorbed.
        if scattered.direction.dot(hit.normal) > 0.0 {
            Some(Scatter {
                attenuation: self.albedo,
                scattered,
            })
        } else {
            None
        }
    }
}

/// Dielectric (glass) material.
pub struct Dielectric {
    /// Index of refraction
    ior: f64,
}

impl Dielectric {
    /// Create a new Dielectric material.
    ///
    /// - `ior`: Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    pub fn new(ior: f64) -> Self {
        Self { ior }
    }

    /// Schlick's approximation for reflectance
    fn reflectance(cosine: f64, ref_index: f64) -> f64 {
        let r0 = ((1.0 - ref_index) / (1.0 + ref_index)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
    }
}

impl Material for Dielectric {
    fn scatter(&self, ray: &Ray, hit: &HitRecord) -> Option<Scatter> {
        let refraction_ratio = if hit.front_face {
            1.0 / self.ior
        } else {
            self.ior
        };

        let cos_theta = (-ray.direction).dot(hit.normal).min(1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();

        // Total internal reflection
        let cannot_refract = refraction_ratio * sin_theta > 1.0;

        let direction =
            if cannot_refract || Self::reflectance(cos_theta, refraction_ratio) > random_double() {
                reflect(ray.direction, hit.normal)
            } else {
                refract(ray.direction, hit.normal, refraction_ratio)
            };

        Some(Scatter {
            attenuation: Color::ONE,
            scattered: Ray::new(hit.point, direction.normalize()),
        })
    }
}

/// Diffuse light emitter.
pub struct DiffuseLight {
    texture: Arc<dyn Texture>,
}

impl DiffuseLight {
    /// Create a new diffuse light with a flat emission color.
    pub fn new(emit: Color) -> Self {
        Self {
            texture: Arc::new(SolidTexture::new(emit)),
        }
    }

    /// Create a new diffuse light sampling the given texture.
    pub fn textured(texture: Arc<dyn Texture>) -> Self {
        Self { texture }
    }
}

impl Material for DiffuseLight {
    fn emit(&self, uv: Point2, p: Point3) -> Color {
        self.texture.sample(uv, p)
    }

    fn scatter(&self, _ray: &Ray, _hit: &HitRecord) -> Option<Scatter> {
        // Lights don't scatter rays
        None
    }
}

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vector3, n: Vector3) -> Vector3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a unit vector through a surface.
#[inline]
pub fn refract(uv: Vector3, n: Vector3, etai_over_etat: f64) -> Vector3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}
