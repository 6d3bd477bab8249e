//! PNG export of averaged snapshots.

use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use image::{ImageBuffer, Rgba};
use rake_math::{Color, UVec2};
use thiserror::Error;

/// Errors that can occur while exporting a snapshot.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("pixel buffer does not match image size")]
    SizeMismatch,

    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// Gamma-encode a linear color to 8-bit RGBA.
fn color_to_rgba(color: Color) -> [u8; 4] {
    let r = (255.0 * color.x.clamp(0.0, 1.0).sqrt()) as u8;
    let g = (255.0 * color.y.clamp(0.0, 1.0).sqrt()) as u8;
    let b = (255.0 * color.z.clamp(0.0, 1.0).sqrt()) as u8;
    [r, g, b, 255]
}

/// Write `pixels` to `path` as a PNG on a background worker.
///
/// The export never blocks the tracer; the returned handle can be joined
/// for the result or dropped to let the export finish on its own.
pub fn export_png(
    path: PathBuf,
    size: UVec2,
    pixels: Vec<Color>,
) -> JoinHandle<Result<(), ExportError>> {
    thread::spawn(move || {
        let start = Instant::now();

        if pixels.len() != (size.x * size.y) as usize {
            log::error!(
                "export to {} failed: {} pixels for a {}x{} image",
                path.display(),
                pixels.len(),
                size.x,
                size.y
            );
            return Err(ExportError::SizeMismatch);
        }

        let mut data = Vec::with_capacity(pixels.len() * 4);
        for pixel in &pixels {
            data.extend_from_slice(&color_to_rgba(*pixel));
        }

        // The buffer length is validated above, so from_raw cannot fail.
        let image: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_raw(size.x, size.y, data).ok_or(ExportError::SizeMismatch)?;

        match image.save(&path) {
            Ok(()) => {
                log::info!(
                    "exported {}x{} PNG to {} in {:.2?}",
                    size.x,
                    size.y,
                    path.display(),
                    start.elapsed()
                );
                Ok(())
            }
            Err(err) => {
                log::error!("export to {} failed: {err}", path.display());
                Err(err.into())
            }
        }
    })
}
