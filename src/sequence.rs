//! The ordered list of pages to cut out, with a navigation cursor.
//!
//! A [`PageSequence`] is built once from the page specification. Entries
//! never change afterwards; only the cursor moves. File paths are derived on
//! every call from the current [`Naming`], so swapping the naming before
//! storing pages is reflected in the output paths.
//!
//! ```text
//! spec "0l,1-2lr"          cursor
//!                            v
//! page  1      2      3      4      5
//! scan  0      1      1      2      2
//! side  left   left   right  left   right
//! ```

use crate::naming::Naming;
use crate::page_spec::{PageSpecError, parse_page_spec};
use crate::types::{LocatedPage, PageEntry};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error(transparent)]
    PageSpec(#[from] PageSpecError),
    #[error("Page spec '{0}' does not select any page")]
    Empty(String),
}

#[derive(Debug, Clone)]
pub struct PageSequence {
    entries: Vec<PageEntry>,
    cursor: usize,
    naming: Naming,
}

impl PageSequence {
    pub fn new(page_spec: &str, naming: Naming) -> Result<Self, SequenceError> {
        let entries = parse_page_spec(page_spec)?;
        if entries.is_empty() {
            return Err(SequenceError::Empty(page_spec.to_string()));
        }
        Ok(Self {
            entries,
            cursor: 0,
            naming,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; construction rejects empty sequences.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 0-based cursor position.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn set_naming(&mut self, naming: Naming) {
        self.naming = naming;
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn is_first(&self) -> bool {
        self.cursor == 0
    }

    pub fn is_last(&self) -> bool {
        self.cursor == self.entries.len() - 1
    }

    pub fn current(&self) -> LocatedPage {
        self.locate(self.entries[self.cursor])
    }

    /// Step back one page. `None` when already on the first page.
    pub fn previous(&mut self) -> Option<LocatedPage> {
        if self.is_first() {
            return None;
        }
        self.cursor -= 1;
        Some(self.current())
    }

    /// Step forward one page. `None` when already on the last page.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<LocatedPage> {
        if self.is_last() {
            return None;
        }
        self.cursor += 1;
        Some(self.current())
    }

    /// Every page in page-number order, independent of the cursor.
    pub fn all_entries(&self) -> Vec<LocatedPage> {
        self.entries.iter().map(|&entry| self.locate(entry)).collect()
    }

    fn locate(&self, entry: PageEntry) -> LocatedPage {
        LocatedPage {
            entry,
            scan_file: self.naming.scan_file(entry.scan),
            scan_path: self.naming.scan_path(entry.scan),
            page_file: self.naming.page_file(entry.page),
            page_path: self.naming.page_path(entry.page),
        }
    }
}
