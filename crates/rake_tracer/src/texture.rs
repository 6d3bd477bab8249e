//! Textures sampled by materials and the sky.

use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;
use rake_math::{Color, Point2, Point3, UVec2};
use thiserror::Error;

/// Errors that can occur while loading an image texture.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image decoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// Trait for anything that can be sampled at a surface point.
pub trait Texture: Send + Sync {
    /// Sample the texture at the given UV coordinates and surface point.
    fn sample(&self, uv: Point2, p: Point3) -> Color;
}

/// A single flat color.
pub struct SolidTexture {
    pub albedo: Color,
}

impl SolidTexture {
    pub fn new(albedo: Color) -> Self {
        Self { albedo }
    }
}

impl Texture for SolidTexture {
    fn sample(&self, _uv: Point2, _p: Point3) -> Color {
        self.albedo
    }
}

/// A 2D checker pattern over UV space.
pub struct CheckerTexture {
    pub odd: Arc<dyn Texture>,
    pub even: Arc<dyn Texture>,
    pub scale: Point2,
}

impl CheckerTexture {
    pub fn new(odd: Arc<dyn Texture>, even: Arc<dyn Texture>, scale: Point2) -> Self {
        Self { odd, even, scale }
    }

    /// Checker between two solid colors, with the default tile scale.
    pub fn from_colors(odd: Color, even: Color) -> Self {
        Self::new(
            Arc::new(SolidTexture::new(odd)),
            Arc::new(SolidTexture::new(even)),
            Point2::splat(10.0),
        )
    }
}

impl Texture for CheckerTexture {
    fn sample(&self, uv: Point2, p: Point3) -> Color {
        let sines = (self.scale.x * uv.x).sin() * (self.scale.y * uv.y).sin();
        if sines < 0.0 {
            self.odd.sample(uv, p)
        } else {
            self.even.sample(uv, p)
        }
    }
}

/// An image-backed texture, nearest-neighbor sampled.
///
/// An empty image (zero pixels, as left behind by a failed load) samples as
/// cyan, a deliberately loud failure signal.
pub struct ImageTexture {
    pub size: UVec2,
    pub pixels: Vec<Color>,
}

impl ImageTexture {
    /// Load a texture from a file, surfacing decode failures to the caller.
    ///
    /// HDR files keep their 32-bit float channels; LDR files map each 8-bit
    /// channel to `c / 255` unchanged.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TextureError> {
        let img = image::open(path.as_ref())?;
        let size = UVec2::new(img.width(), img.height());

        let pixels = match &img {
            DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => img
                .to_rgb32f()
                .pixels()
                .map(|p| Color::new(p[0], p[1], p[2]))
                .collect(),
            _ => img
                .to_rgb8()
                .pixels()
                .map(|p| {
                    Color::new(
                        f32::from(p[0]) / 255.0,
                        f32::from(p[1]) / 255.0,
                        f32::from(p[2]) / 255.0,
                    )
                })
                .collect(),
        };

        Ok(Self { size, pixels })
    }

    /// Load a texture from a file, recovering from failure with an empty
    /// (cyan-sampling) texture.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(texture) => texture,
            Err(err) => {
                log::error!("failed to open texture file {}: {err}", path.display());
                Self {
                    size: UVec2::ZERO,
                    pixels: Vec::new(),
                }
            }
        }
    }
}

impl Texture for ImageTexture {
    fn sample(&self, uv: Point2, _p: Point3) -> Color {
        if self.pixels.is_empty() {
            return Color::new(0.0, 1.0, 1.0);
        }

        let u = uv.x.clamp(0.0, 1.0);
        let v = 1.0 - uv.y.clamp(0.0, 1.0);
        let x = ((u * f64::from(self.size.x)) as u32).min(self.size.x - 1);
        let y = ((v * f64::from(self.size.y)) as u32).min(self.size.y - 1);

        self.pixels[(y * self.size.x + x) as usize]
    }
}
