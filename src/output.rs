//! CLI output formatting.
//!
//! Output is page-centric: every line leads with the page number, with the
//! scan it comes from and the files involved shown as context.
//!
//! # Output Format
//!
//! ## Page plan
//!
//! ```text
//! Pages (3)
//! 001 scan 000 left
//!     Source: /scans/scan000.png
//!     Target: /pages/page001.png
//! 002 scan 001 left
//!     ...
//! ```
//!
//! ## Extract
//!
//! ```text
//! 001 scan 000 → /pages/page001.png
//! 002 scan 001
//!     Failed: Scan not found: /scans/scan001.png
//!
//! Stored 1 page, 1 failed, 1 skipped
//! ```
//!
//! # Architecture
//!
//! Each kind of output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::config::Settings;
use crate::extract::{StoreEvent, StoreReport};
use crate::sequence::PageSequence;
use crate::types::{LocatedPage, Side};

/// Format a 1-based page number as 3-digit zero-padded.
fn format_index(pos: u32) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `001 scan 000 left`
fn page_header(page: u32, scan: u32, side: Side) -> String {
    format!("{} scan {:0>3} {}", format_index(page), scan, side)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Format the effective settings after all config layers are applied.
pub fn format_settings(settings: &Settings) -> Vec<String> {
    let naming = &settings.naming;
    vec![
        format!("Pages: {}", settings.pages),
        format!("Geometry: {}", settings.geometry),
        format!("Image mode: {}", settings.image_mode),
        format!("View mode: {}", settings.view_mode),
        format!("On error: {}", settings.on_error),
        "Source".to_string(),
        format!(
            "{}{}",
            indent(1),
            naming.source_dir.join(naming.source_template.as_str()).display()
        ),
        "Target".to_string(),
        format!(
            "{}{}",
            indent(1),
            naming.target_dir.join(naming.target_template.as_str()).display()
        ),
    ]
}

pub fn print_settings(settings: &Settings) {
    for line in format_settings(settings) {
        println!("{}", line);
    }
}

// ============================================================================
// Page plan
// ============================================================================

/// Format every page of the sequence with its source scan and target file.
pub fn format_page_plan(sequence: &PageSequence) -> Vec<String> {
    let pages = sequence.all_entries();
    let mut lines = vec![format!("Pages ({})", pages.len())];
    for page in &pages {
        lines.push(page_header(page.page(), page.scan(), page.side()));
        lines.push(format!("{}Source: {}", indent(1), page.scan_path.display()));
        lines.push(format!("{}Target: {}", indent(1), page.page_path.display()));
    }
    lines
}

pub fn print_page_plan(sequence: &PageSequence) {
    for line in format_page_plan(sequence) {
        println!("{}", line);
    }
}

/// The page plan as pretty-printed JSON, one object per page.
pub fn page_plan_json(sequence: &PageSequence) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&sequence.all_entries())
}

// ============================================================================
// Browse
// ============================================================================

/// `Showing page 3  [scan 1, right side]`
pub fn format_showing(page: &LocatedPage) -> String {
    format!(
        "Showing page {}  [scan {}, {} side]",
        page.page(),
        page.scan(),
        page.side()
    )
}

// ============================================================================
// Extract
// ============================================================================

/// Format a single store progress event as display lines.
pub fn format_store_event(event: &StoreEvent) -> Vec<String> {
    match event {
        StoreEvent::Stored {
            page,
            scan,
            page_path,
        } => {
            let header = event_header(*page, *scan);
            vec![format!("{} \u{2192} {}", header, page_path.display())]
        }
        StoreEvent::Failed {
            page, scan, error, ..
        } => vec![
            event_header(*page, *scan),
            format!("{}Failed: {}", indent(1), error),
        ],
    }
}

/// `002 scan 001`; events carry no side.
fn event_header(page: u32, scan: u32) -> String {
    format!("{} scan {:0>3}", format_index(page), scan)
}

pub fn print_store_event(event: &StoreEvent) {
    for line in format_store_event(event) {
        println!("{}", line);
    }
}

/// Format the closing summary of an extract run.
pub fn format_store_summary(report: &StoreReport) -> Vec<String> {
    let mut summary = format!("Stored {}", plural(report.stored.len(), "page"));
    if !report.failures.is_empty() {
        summary.push_str(&format!(", {} failed", report.failures.len()));
    }
    if report.skipped > 0 {
        summary.push_str(&format!(", {} skipped", report.skipped));
    }
    vec![String::new(), summary]
}

pub fn print_store_summary(report: &StoreReport) {
    for line in format_store_summary(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
