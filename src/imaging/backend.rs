//! Image codec trait and shared types.
//!
//! The [`ImageCodec`] trait is the only way the rest of the crate touches
//! image files: decode a scan into pixels, encode a page back to disk. The
//! page logic never looks inside a [`CodecError`]; it is handed back to the
//! caller as is.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_backend::RustCodec).

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: String,
        source: image::ImageError,
    },
    #[error("Failed to encode {path}: {source}")]
    Encode {
        path: String,
        source: image::ImageError,
    },
    #[error("Unsupported output format: '{extension}' (use one of: {supported})")]
    UnsupportedFormat { extension: String, supported: String },
}

/// Pixel format scans are decoded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMode {
    #[default]
    Color,
    Grayscale,
}

impl ImageMode {
    pub const NAMES: &'static [&'static str] = &["color", "grayscale"];

    pub fn as_str(self) -> &'static str {
        match self {
            ImageMode::Color => "color",
            ImageMode::Grayscale => "grayscale",
        }
    }
}

impl fmt::Display for ImageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an image mode other than `color` or `grayscale`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Undefined image mode: '{0}'. Only 'color' and 'grayscale' are defined.")]
pub struct UndefinedImageMode(pub String);

impl FromStr for ImageMode {
    type Err = UndefinedImageMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "color" => Ok(ImageMode::Color),
            "grayscale" => Ok(ImageMode::Grayscale),
            other => Err(UndefinedImageMode(other.to_string())),
        }
    }
}

/// Decode and encode image files.
pub trait ImageCodec {
    /// Decode the image at `path`, converted to `mode`.
    fn decode(&self, path: &Path, mode: ImageMode) -> Result<DynamicImage, CodecError>;

    /// Encode `image` to `path`; the format follows the file extension.
    fn encode(&self, image: &DynamicImage, path: &Path) -> Result<(), CodecError>;
}

impl<C: ImageCodec + ?Sized> ImageCodec for &C {
    fn decode(&self, path: &Path, mode: ImageMode) -> Result<DynamicImage, CodecError> {
        (**self).decode(path, mode)
    }

    fn encode(&self, image: &DynamicImage, path: &Path) -> Result<(), CodecError> {
        (**self).encode(image, path)
    }
}
