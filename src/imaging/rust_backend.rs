//! Pure Rust codec built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader`, format guessed from content |
//! | Color / grayscale conversion | `DynamicImage::to_rgb8` / `to_luma8` |
//! | Encode | `DynamicImage::save_with_format`, format from the file extension |

use super::backend::{CodecError, ImageCodec, ImageMode};
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;

/// Output extensions and the format they are written in.
const OUTPUT_FORMATS: &[(&str, ImageFormat)] = &[
    ("png", ImageFormat::Png),
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

/// Returns the page file extensions [`RustCodec`] can write.
pub fn supported_output_extensions() -> impl Iterator<Item = &'static str> {
    OUTPUT_FORMATS.iter().map(|(ext, _)| *ext)
}

fn output_format(path: &Path) -> Result<ImageFormat, CodecError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    OUTPUT_FORMATS
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map(|(_, format)| *format)
        .ok_or_else(|| CodecError::UnsupportedFormat {
            extension: ext,
            supported: supported_output_extensions().collect::<Vec<_>>().join(", "),
        })
}

/// Codec backed by the `image` crate's pure Rust decoders and encoders.
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageCodec for RustCodec {
    fn decode(&self, path: &Path, mode: ImageMode) -> Result<DynamicImage, CodecError> {
        let decoded = ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|source| CodecError::Decode {
                path: path.display().to_string(),
                source,
            })?;

        Ok(match mode {
            ImageMode::Color => DynamicImage::ImageRgb8(decoded.into_rgb8()),
            ImageMode::Grayscale => DynamicImage::ImageLuma8(decoded.into_luma8()),
        })
    }

    fn encode(&self, image: &DynamicImage, path: &Path) -> Result<(), CodecError> {
        let format = output_format(path)?;
        image
            .save_with_format(path, format)
            .map_err(|source| CodecError::Encode {
                path: path.display().to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbImage};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    #[test]
    fn png_round_trip_is_lossless() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("scan000.png");
        let original = gradient(64, 32);

        let codec = RustCodec::new();
        codec.encode(&original, &path).unwrap();
        let decoded = codec.decode(&path, ImageMode::Color).unwrap();

        assert_eq!(decoded.dimensions(), (64, 32));
        assert_eq!(decoded.to_rgb8(), original.to_rgb8());
    }

    #[test]
    fn grayscale_mode_decodes_to_luma() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("scan000.png");
        RustCodec::new().encode(&gradient(16, 16), &path).unwrap();

        let decoded = RustCodec::new().decode(&path, ImageMode::Grayscale).unwrap();
        assert!(matches!(decoded, DynamicImage::ImageLuma8(_)));
    }

    #[test]
    fn decode_sniffs_format_from_content() {
        let tmp = tempfile::TempDir::new().unwrap();
        let png = tmp.path().join("scan.png");
        RustCodec::new().encode(&gradient(8, 8), &png).unwrap();
        let renamed = tmp.path().join("scan.dat");
        std::fs::rename(&png, &renamed).unwrap();

        let decoded = RustCodec::new().decode(&renamed, ImageMode::Color).unwrap();
        assert_eq!(decoded.dimensions(), (8, 8));
    }

    #[test]
    fn encode_jpeg_by_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("page001.JPG");
        RustCodec::new().encode(&gradient(40, 30), &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn encode_unknown_extension_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("page001.xyz");
        let result = RustCodec::new().encode(&gradient(4, 4), &path);
        assert!(matches!(
            &result,
            Err(CodecError::UnsupportedFormat { extension, .. }) if extension == "xyz"
        ));
        let message = result.unwrap_err().to_string();
        assert_eq!(
            message,
            "Unsupported output format: 'xyz' (use one of: png, jpg, jpeg, tif, tiff, webp)"
        );
        assert!(!path.exists());
    }

    #[test]
    fn decode_missing_file_is_io_error() {
        let result = RustCodec::new().decode(Path::new("/nonexistent/scan.png"), ImageMode::Color);
        assert!(matches!(result, Err(CodecError::Io(_))));
    }

    #[test]
    fn decode_garbage_is_decode_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("scan.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let result = RustCodec::new().decode(&path, ImageMode::Color);
        assert!(matches!(result, Err(CodecError::Decode { .. })));
    }

    #[test]
    fn supported_extensions_cover_common_formats() {
        let exts: Vec<_> = supported_output_extensions().collect();
        for expected in ["png", "jpg", "tif", "webp"] {
            assert!(exts.contains(&expected), "expected {expected}");
        }
    }
}
