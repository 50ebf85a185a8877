//! Turning located pages into pixels.
//!
//! The [`PageExtractor`] reads a scan through an [`ImageCodec`], finds the
//! page's bounding box with [`compute_crop_rect`], and either
//!
//! - hands back the scan path untouched ([`ViewMode::Raw`]),
//! - outlines the bounding box on the scan for preview ([`ViewMode::Scan`]), or
//! - cuts the bounding box out as the page image ([`ViewMode::Page`]).
//!
//! [`PageExtractor::store`] writes the cut-out page to its target path and
//! [`PageExtractor::store_all`] does that for a whole [`PageSequence`].
//!
//! The extractor never touches the sequence cursor.

use crate::geometry::{CropRect, Geometry, compute_crop_rect};
use crate::imaging::{CodecError, ImageCodec, ImageMode};
use crate::sequence::PageSequence;
use crate::types::LocatedPage;
use image::{DynamicImage, GenericImageView, Rgba};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Outline color of the bounding box in preview scans.
const BOUNDING_BOX_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
/// Outline thickness in pixels, drawn on the inside of the box.
const BOUNDING_BOX_LINE_WIDTH: u32 = 2;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Scan not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error(
        "Cannot cut page {page} out of {}: bounding box {rect} exceeds the {width}x{height} scan",
        scan.display()
    )]
    ExtractionFailed {
        page: u32,
        scan: PathBuf,
        rect: CropRect,
        width: u32,
        height: u32,
    },
    #[error("Cannot create page directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// What [`PageExtractor::extract`] produces for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// The scan file as is.
    Raw,
    /// The scan with the page's bounding box outlined.
    #[default]
    Scan,
    /// The page cut out of the scan.
    Page,
}

impl ViewMode {
    pub const NAMES: &'static [&'static str] = &["raw", "scan", "page"];

    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Raw => "raw",
            ViewMode::Scan => "scan",
            ViewMode::Page => "page",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Undefined view mode: '{0}'. Only 'raw', 'scan' and 'page' are defined.")]
pub struct UndefinedViewMode(pub String);

impl FromStr for ViewMode {
    type Err = UndefinedViewMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(ViewMode::Raw),
            "scan" => Ok(ViewMode::Scan),
            "page" => Ok(ViewMode::Page),
            other => Err(UndefinedViewMode(other.to_string())),
        }
    }
}

/// Extracted page content.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Path of the unmodified scan.
    Raw(PathBuf),
    /// The scan with the bounding box drawn on it.
    Annotated(DynamicImage),
    /// The page image.
    Page(DynamicImage),
}

impl Extraction {
    pub fn image(&self) -> Option<&DynamicImage> {
        match self {
            Extraction::Raw(_) => None,
            Extraction::Annotated(image) | Extraction::Page(image) => Some(image),
        }
    }
}

/// What [`PageExtractor::store_all`] does after a page fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failing page.
    #[default]
    Abort,
    /// Report the failure and go on with the next page.
    Continue,
}

impl FailurePolicy {
    pub const NAMES: &'static [&'static str] = &["abort", "continue"];

    pub fn as_str(self) -> &'static str {
        match self {
            FailurePolicy::Abort => "abort",
            FailurePolicy::Continue => "continue",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Undefined failure policy: '{0}'. Only 'abort' and 'continue' are defined.")]
pub struct UndefinedFailurePolicy(pub String);

impl FromStr for FailurePolicy {
    type Err = UndefinedFailurePolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abort" => Ok(FailurePolicy::Abort),
            "continue" => Ok(FailurePolicy::Continue),
            other => Err(UndefinedFailurePolicy(other.to_string())),
        }
    }
}

/// Progress of [`PageExtractor::store_all`], reported once per page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Stored {
        page: u32,
        scan: u32,
        page_path: PathBuf,
    },
    Failed {
        page: u32,
        scan: u32,
        page_path: PathBuf,
        error: String,
    },
}

/// A page that could not be stored.
#[derive(Debug)]
pub struct StoreFailure {
    pub page: u32,
    pub page_path: PathBuf,
    pub error: ExtractError,
}

/// Outcome of storing a whole sequence.
#[derive(Debug, Default)]
pub struct StoreReport {
    pub stored: Vec<PathBuf>,
    pub failures: Vec<StoreFailure>,
    /// Pages never attempted because the run aborted.
    pub skipped: usize,
}

impl StoreReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Cuts pages out of scans with a fixed geometry and image mode.
pub struct PageExtractor<C: ImageCodec> {
    codec: C,
    geometry: Geometry,
    image_mode: ImageMode,
}

impl<C: ImageCodec> PageExtractor<C> {
    pub fn new(codec: C, geometry: Geometry, image_mode: ImageMode) -> Self {
        Self {
            codec,
            geometry,
            image_mode,
        }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Produce the content of `page` for `view_mode`.
    pub fn extract(
        &self,
        page: &LocatedPage,
        view_mode: ViewMode,
    ) -> Result<Extraction, ExtractError> {
        tracing::debug!(
            page = page.page(),
            scan = page.scan(),
            side = %page.side(),
            view_mode = %view_mode,
            source = %page.scan_path.display(),
            "extracting page"
        );
        match view_mode {
            ViewMode::Raw => {
                self.ensure_scan_exists(page)?;
                Ok(Extraction::Raw(page.scan_path.clone()))
            }
            ViewMode::Scan => self.annotated_scan(page).map(Extraction::Annotated),
            ViewMode::Page => self.cut_page(page).map(Extraction::Page),
        }
    }

    /// The scan with the page's bounding box outlined.
    pub fn annotated_scan(&self, page: &LocatedPage) -> Result<DynamicImage, ExtractError> {
        let mut scan = self.load_scan(page)?;
        let rect = compute_crop_rect(&self.geometry, page.side(), scan.width());
        draw_bounding_box(&mut scan, &rect);
        Ok(scan)
    }

    /// The page cut out of its scan, pixel for pixel.
    pub fn cut_page(&self, page: &LocatedPage) -> Result<DynamicImage, ExtractError> {
        let scan = self.load_scan(page)?;
        let (width, height) = scan.dimensions();
        let rect = compute_crop_rect(&self.geometry, page.side(), width);
        if !rect.fits_within(width, height) {
            return Err(ExtractError::ExtractionFailed {
                page: page.page(),
                scan: page.scan_path.clone(),
                rect,
                width,
                height,
            });
        }

        tracing::debug!(
            page = page.page(),
            x = rect.p1.x,
            y = rect.p1.y,
            w = rect.width(),
            h = rect.height(),
            "cutting out page area"
        );
        Ok(scan.crop_imm(rect.p1.x, rect.p1.y, rect.width(), rect.height()))
    }

    /// Cut the page out and write it to its page path.
    ///
    /// Missing target directories are created.
    pub fn store(&self, page: &LocatedPage) -> Result<PathBuf, ExtractError> {
        let image = self.cut_page(page)?;

        if let Some(dir) = page.page_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if !dir.exists() {
                tracing::debug!(dir = %dir.display(), "creating page directory");
                std::fs::create_dir_all(dir).map_err(|source| ExtractError::CreateDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
        }

        self.codec.encode(&image, &page.page_path)?;
        tracing::info!(page = page.page(), path = %page.page_path.display(), "stored page");
        Ok(page.page_path.clone())
    }

    /// Store every page of `sequence` in page-number order.
    ///
    /// Each page's outcome is passed to `on_event` before the next page is
    /// attempted. With [`FailurePolicy::Abort`] the run ends at the first
    /// failure; the remaining pages are counted in [`StoreReport::skipped`].
    pub fn store_all(
        &self,
        sequence: &PageSequence,
        policy: FailurePolicy,
        mut on_event: impl FnMut(&StoreEvent),
    ) -> StoreReport {
        let pages = sequence.all_entries();
        let total = pages.len();
        let mut report = StoreReport::default();

        for (i, page) in pages.iter().enumerate() {
            match self.store(page) {
                Ok(path) => {
                    on_event(&StoreEvent::Stored {
                        page: page.page(),
                        scan: page.scan(),
                        page_path: path.clone(),
                    });
                    report.stored.push(path);
                }
                Err(error) => {
                    tracing::warn!(
                        page = page.page(),
                        path = %page.page_path.display(),
                        %error,
                        "failed to store page"
                    );
                    on_event(&StoreEvent::Failed {
                        page: page.page(),
                        scan: page.scan(),
                        page_path: page.page_path.clone(),
                        error: error.to_string(),
                    });
                    report.failures.push(StoreFailure {
                        page: page.page(),
                        page_path: page.page_path.clone(),
                        error,
                    });
                    if policy == FailurePolicy::Abort {
                        report.skipped = total - i - 1;
                        break;
                    }
                }
            }
        }

        report
    }

    fn ensure_scan_exists(&self, page: &LocatedPage) -> Result<(), ExtractError> {
        if page.scan_path.exists() {
            Ok(())
        } else {
            Err(ExtractError::SourceNotFound(page.scan_path.clone()))
        }
    }

    fn load_scan(&self, page: &LocatedPage) -> Result<DynamicImage, ExtractError> {
        self.ensure_scan_exists(page)?;
        tracing::debug!(
            scan = page.scan(),
            image_mode = %self.image_mode,
            source = %page.scan_path.display(),
            "loading scan"
        );
        Ok(self.codec.decode(&page.scan_path, self.image_mode)?)
    }
}

/// Outline `rect` on `image`, clipped to the image bounds.
///
/// Edges lying outside the image are not drawn. Corners are computed in
/// `u64` so no geometry can overflow.
fn draw_bounding_box(image: &mut DynamicImage, rect: &CropRect) {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let (max_x, max_y) = (u64::from(width) - 1, u64::from(height) - 1);

    for inset in 0..u64::from(BOUNDING_BOX_LINE_WIDTH) {
        let (left, top) = (u64::from(rect.p1.x) + inset, u64::from(rect.p1.y) + inset);
        let (Some(right), Some(bottom)) = (
            u64::from(rect.p2.x).checked_sub(inset),
            u64::from(rect.p2.y).checked_sub(inset),
        ) else {
            break;
        };
        // Insets only move further right and down from here.
        if right < left || bottom < top || left > max_x || top > max_y {
            break;
        }

        let (x_end, y_end) = (right.min(max_x), bottom.min(max_y));
        let (span_x, span_y) = (x_end - left + 1, y_end - top + 1);
        fill_strip(image, left, top, span_x, 1);
        fill_strip(image, left, top, 1, span_y);
        if bottom <= max_y {
            fill_strip(image, left, bottom, span_x, 1);
        }
        if right <= max_x {
            fill_strip(image, right, top, 1, span_y);
        }
    }
}

/// Fill a strip already known to lie inside the image.
fn fill_strip(image: &mut DynamicImage, x: u64, y: u64, width: u64, height: u64) {
    let (Ok(x), Ok(y), Ok(width), Ok(height)) = (
        i32::try_from(x),
        i32::try_from(y),
        u32::try_from(width),
        u32::try_from(height),
    ) else {
        return;
    };
    if x.checked_add_unsigned(width).is_none() || y.checked_add_unsigned(height).is_none() {
        return;
    }
    draw_filled_rect_mut(image, Rect::at(x, y).of_size(width, height), BOUNDING_BOX_COLOR);
}
