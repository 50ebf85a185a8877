//! Page bounding-box geometry.
//!
//! A geometry is written the way X11 and ImageMagick write them:
//! `WIDTHxHEIGHT+OFFSET_LEFT+OFFSET_TOP`, e.g. `600x800+10+20`. The offsets
//! are measured from the top-left corner of the *half* of the scan the page
//! lives on, so the same geometry describes both the left and the right page
//! of a two-up scan:
//!
//! ```text
//! scan (width 2000)
//! +--------------------+--------------------+
//! |  +10,+20           |  +1000+10,+20      |
//! |   +--------+       |   +--------+       |
//! |   |  left  |       |   | right  |       |
//! |   +--------+       |   +--------+       |
//! +--------------------+--------------------+
//!                      ^ floor(2000 / 2)
//! ```
//!
//! Everything here is pure: no I/O, no images.

use crate::types::Side;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

static GEOMETRY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)x(\d+)\+(\d+)\+(\d+)$").unwrap());

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("Malformed geometry: '{0}' (expected WIDTHxHEIGHT+LEFT+TOP, e.g. 600x800+10+20)")]
    Malformed(String),
    #[error("Geometry must have a non-zero width and height: '{0}'")]
    ZeroSize(String),
}

/// Size and offset of the page bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub offset_left: u32,
    pub offset_top: u32,
}

/// Parse a `WIDTHxHEIGHT+OFFSET_LEFT+OFFSET_TOP` geometry string.
///
/// The whole string must match; trailing garbage, signs and whitespace are
/// all rejected.
pub fn parse_geometry(text: &str) -> Result<Geometry, GeometryError> {
    let malformed = || GeometryError::Malformed(text.to_string());
    let caps = GEOMETRY_PATTERN.captures(text).ok_or_else(malformed)?;
    let number = |i: usize| caps[i].parse::<u32>().map_err(|_| malformed());

    let geometry = Geometry {
        width: number(1)?,
        height: number(2)?,
        offset_left: number(3)?,
        offset_top: number(4)?,
    };
    if geometry.width == 0 || geometry.height == 0 {
        return Err(GeometryError::ZeroSize(text.to_string()));
    }
    Ok(geometry)
}

impl FromStr for Geometry {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_geometry(s)
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}+{}+{}",
            self.width, self.height, self.offset_left, self.offset_top
        )
    }
}

/// A pixel coordinate in scan space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

/// Crop rectangle given by its inclusive top-left and bottom-right corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub p1: Point,
    pub p2: Point,
}

impl CropRect {
    pub fn width(&self) -> u32 {
        self.p2.x - self.p1.x + 1
    }

    pub fn height(&self) -> u32 {
        self.p2.y - self.p1.y + 1
    }

    /// Whether every pixel of the rectangle lies inside a `width`×`height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.p2.x < width && self.p2.y < height
    }
}

impl fmt::Display for CropRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {})-({}, {})",
            self.p1.x, self.p1.y, self.p2.x, self.p2.y
        )
    }
}

/// Compute the crop rectangle for one side of a scan `scan_width` pixels wide.
///
/// Right pages are shifted by `floor(scan_width / 2)`. The result is not
/// checked against the scan size.
pub fn compute_crop_rect(geometry: &Geometry, side: Side, scan_width: u32) -> CropRect {
    let shift = match side {
        Side::Left => 0,
        Side::Right => scan_width / 2,
    };
    let x1 = geometry.offset_left.saturating_add(shift);
    let y1 = geometry.offset_top;

    // Saturating: absurd offsets must still produce a rect that fails
    // `fits_within` instead of overflowing.
    CropRect {
        p1: Point { x: x1, y: y1 },
        p2: Point {
            x: x1.saturating_add(geometry.width - 1),
            y: y1.saturating_add(geometry.height - 1),
        },
    }
}
