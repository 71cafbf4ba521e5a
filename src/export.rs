use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage, RgbaImage};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::ExportResult;
use crate::layer::{Layer, TRANSPARENT};
use crate::renderer::composite;

/// JPEG quality used for exports, out of 100
pub const JPEG_QUALITY: u8 = 95;

/// Base name of exported files
pub const EXPORT_FILE_STEM: &str = "drawing";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Lossless, keeps transparency
    #[default]
    Png,
    /// Lossy at quality 95, no alpha channel
    Jpeg,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
        }
    }

    /// `drawing.png` or `drawing.jpeg`
    pub fn file_name(&self) -> String {
        format!("{}.{}", EXPORT_FILE_STEM, self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Encoded image bytes ready to be handed to the user
#[derive(Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub format: ExportFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ExportedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportedImage")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl ExportedImage {
    pub fn file_name(&self) -> String {
        self.format.file_name()
    }

    /// Writes the image into `dir` under its canonical file name
    pub fn save_to(&self, dir: &Path) -> ExportResult<PathBuf> {
        let path = dir.join(self.file_name());
        std::fs::write(&path, &self.bytes)?;
        info!("Saved {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

/// Composites all visible layers into a fresh buffer, exactly as the display does
pub fn flatten(layers: &[Layer], width: u32, height: u32) -> RgbaImage {
    let mut flat = RgbaImage::from_pixel(width, height, TRANSPARENT);
    composite(layers, &mut flat);
    flat
}

/// Flattens the visible layers and encodes them
pub fn export(layers: &[Layer], width: u32, height: u32, format: ExportFormat) -> ExportResult<ExportedImage> {
    let flat = flatten(layers, width, height);
    let bytes = encode(&flat, format)?;
    info!("Exported {}x{} canvas as {} ({} bytes)", width, height, format, bytes.len());
    Ok(ExportedImage {
        format,
        width,
        height,
        bytes,
    })
}

/// Encodes a straight-alpha buffer in the requested format
pub fn encode(image: &RgbaImage, format: ExportFormat) -> ExportResult<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    match format {
        ExportFormat::Png => {
            PngEncoder::new(&mut bytes).write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
        ExportFormat::Jpeg => {
            let opaque = flatten_onto_black(image);
            JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY).write_image(
                opaque.as_raw(),
                opaque.width(),
                opaque.height(),
                ExtendedColorType::Rgb8,
            )?;
        }
    }
    Ok(bytes.into_inner())
}

/// Drops alpha the way a browser canvas does for JPEG: transparent areas turn black
fn flatten_onto_black(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let p = image.get_pixel(x, y);
        let a = u16::from(p[3]);
        let scale = |c: u8| ((u16::from(c) * a + 127) / 255) as u8;
        image::Rgb([scale(p[0]), scale(p[1]), scale(p[2])])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    #[test]
    fn file_names_use_format_extension() {
        assert_eq!(ExportFormat::Png.file_name(), "drawing.png");
        assert_eq!(ExportFormat::Jpeg.file_name(), "drawing.jpeg");
    }

    #[test]
    fn png_preserves_transparency() {
        let layers = vec![Layer::new("Layer 1", 6, 3)];
        let exported = export(&layers, 6, 3, ExportFormat::Png).unwrap();
        let decoded = image::load_from_memory(&exported.bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (6, 3));
        assert!(decoded.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn jpeg_is_opaque_and_sized() {
        let layers = vec![Layer::new_filled("Background", 16, 8, Rgb::WHITE)];
        let exported = export(&layers, 16, 8, ExportFormat::Jpeg).unwrap();
        assert_eq!(&exported.bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&exported.bytes).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (16, 8));
        assert!(decoded.get_pixel(8, 4)[0] > 250);
    }

    #[test]
    fn transparent_areas_become_black_in_jpeg() {
        let flat = RgbaImage::from_pixel(2, 2, TRANSPARENT);
        assert_eq!(flatten_onto_black(&flat).get_pixel(0, 0).0, [0, 0, 0]);
    }
}
