//! Sky materials sampled when a ray escapes the scene.

use std::sync::Arc;

use rake_math::{Color, Point2, Ray};

use crate::texture::{SolidTexture, Texture};

/// Background radiance for rays that hit nothing.
pub trait SkyMaterial: Send + Sync {
    fn sample(&self, ray: &Ray) -> Color;
}

/// Environment-mapped sky: the ray direction is spherically mapped into a
/// texture. With a solid texture this degenerates to a flat backdrop.
pub struct SolidSky {
    texture: Arc<dyn Texture>,
}

impl SolidSky {
    pub fn new(texture: Arc<dyn Texture>) -> Self {
        Self { texture }
    }

    pub fn from_color(color: Color) -> Self {
        Self::new(Arc::new(SolidTexture::new(color)))
    }
}

impl SkyMaterial for SolidSky {
    fn sample(&self, ray: &Ray) -> Color {
        let d = ray.direction;
        let uv = Point2::new(d.z.atan2(d.x), d.y.clamp(-1.0, 1.0).asin())
            * Point2::new(0.1591, 0.3183)
            + Point2::splat(0.5);

        self.texture.sample(uv, d)
    }
}

/// Vertical two-color gradient keyed on the ray direction's y component.
pub struct GradientSky {
    pub albedo_a: Color,
    pub albedo_b: Color,
    pub gradient: f64,
}

impl GradientSky {
    pub fn new(albedo_a: Color, albedo_b: Color, gradient: f64) -> Self {
        Self {
            albedo_a,
            albedo_b,
            gradient,
        }
    }
}

impl SkyMaterial for GradientSky {
    fn sample(&self, ray: &Ray) -> Color {
        let t = (self.gradient * (ray.direction.y + 1.0)) as f32;
        (1.0 - t) * self.albedo_a + t * self.albedo_b
    }
}
