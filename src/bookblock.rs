//! Interactive session over a page sequence.
//!
//! [`BookBlock`] ties a [`PageSequence`] to a [`PageExtractor`] and keeps the
//! view mode the preview is in. Navigation renders the page it lands on;
//! hitting either end of the sequence returns `Ok(None)` and leaves the
//! cursor where it was.

use crate::extract::{
    ExtractError, Extraction, FailurePolicy, PageExtractor, StoreEvent, StoreReport, ViewMode,
};
use crate::imaging::ImageCodec;
use crate::sequence::PageSequence;
use crate::types::LocatedPage;

/// A page together with what was extracted for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub page: LocatedPage,
    pub extraction: Extraction,
}

pub struct BookBlock<C: ImageCodec> {
    sequence: PageSequence,
    extractor: PageExtractor<C>,
    view_mode: ViewMode,
}

impl<C: ImageCodec> BookBlock<C> {
    pub fn new(sequence: PageSequence, extractor: PageExtractor<C>, view_mode: ViewMode) -> Self {
        Self {
            sequence,
            extractor,
            view_mode,
        }
    }

    pub fn sequence(&self) -> &PageSequence {
        &self.sequence
    }

    pub fn extractor(&self) -> &PageExtractor<C> {
        &self.extractor
    }

    pub fn reset(&mut self) {
        self.sequence.reset();
    }

    pub fn is_first_page(&self) -> bool {
        self.sequence.is_first()
    }

    pub fn is_last_page(&self) -> bool {
        self.sequence.is_last()
    }

    pub fn current_page(&self) -> Result<Rendered, ExtractError> {
        self.render(self.sequence.current())
    }

    pub fn previous_page(&mut self) -> Result<Option<Rendered>, ExtractError> {
        match self.sequence.previous() {
            Some(page) => self.render(page).map(Some),
            None => {
                tracing::debug!("already on the first page");
                Ok(None)
            }
        }
    }

    pub fn next_page(&mut self) -> Result<Option<Rendered>, ExtractError> {
        match self.sequence.next() {
            Some(page) => self.render(page).map(Some),
            None => {
                tracing::debug!("already on the last page");
                Ok(None)
            }
        }
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, view_mode: ViewMode) {
        self.view_mode = view_mode;
    }

    /// Flip between the annotated scan and the cut-out page.
    ///
    /// Raw mode toggles to page mode.
    pub fn toggle_view_mode(&mut self) -> ViewMode {
        self.view_mode = match self.view_mode {
            ViewMode::Page => ViewMode::Scan,
            ViewMode::Scan | ViewMode::Raw => ViewMode::Page,
        };
        tracing::debug!(view_mode = %self.view_mode, "toggled view mode");
        self.view_mode
    }

    /// Store every page of the sequence. The cursor does not move.
    pub fn store_pages(
        &self,
        policy: FailurePolicy,
        on_event: impl FnMut(&StoreEvent),
    ) -> StoreReport {
        self.extractor.store_all(&self.sequence, policy, on_event)
    }

    fn render(&self, page: LocatedPage) -> Result<Rendered, ExtractError> {
        let extraction = self.extractor.extract(&page, self.view_mode)?;
        Ok(Rendered { page, extraction })
    }
}
