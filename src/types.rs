//! Shared types used across the page pipeline.
//!
//! [`PageEntry`] is produced once by the page-spec parser and owned by the
//! [`PageSequence`](crate::sequence::PageSequence). [`LocatedPage`] adds the
//! file paths derived from the current naming settings and is what the
//! extractor and the CLI consume.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which half of a two-up scan a page is cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scheduled extraction unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    /// Index of the source scan (fed into the scan filename template).
    pub scan: u32,
    pub side: Side,
    /// 1-based output page number (fed into the page filename template).
    pub page: u32,
}

/// A [`PageEntry`] with its source and target files resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatedPage {
    #[serde(flatten)]
    pub entry: PageEntry,
    pub scan_file: String,
    pub scan_path: PathBuf,
    pub page_file: String,
    pub page_path: PathBuf,
}

impl LocatedPage {
    pub fn scan(&self) -> u32 {
        self.entry.scan
    }

    pub fn side(&self) -> Side {
        self.entry.side
    }

    pub fn page(&self) -> u32 {
        self.entry.page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_displays_lowercase() {
        assert_eq!(Side::Left.to_string(), "left");
        assert_eq!(Side::Right.to_string(), "right");
    }

    #[test]
    fn located_page_serializes_flat() {
        let page = LocatedPage {
            entry: PageEntry {
                scan: 3,
                side: Side::Right,
                page: 7,
            },
            scan_file: "scan003.png".to_string(),
            scan_path: PathBuf::from("/scans/scan003.png"),
            page_file: "page007.png".to_string(),
            page_path: PathBuf::from("/pages/page007.png"),
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["scan"], 3);
        assert_eq!(json["side"], "right");
        assert_eq!(json["page"], 7);
        assert_eq!(json["page_path"], "/pages/page007.png");
    }
}
