//! Image file I/O in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (JPEG, PNG, TIFF, WebP) |
//! | **Encode** | `DynamicImage::save_with_format` |
//!
//! The module is split into:
//! - **Backend**: [`ImageCodec`] trait, [`ImageMode`] and [`CodecError`]
//! - **Rust backend**: [`RustCodec`], the production codec

pub mod backend;
pub mod rust_backend;

pub use backend::{CodecError, ImageCodec, ImageMode, UndefinedImageMode};
pub use rust_backend::{RustCodec, supported_output_extensions};
