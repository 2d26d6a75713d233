use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::Item,
    services::{ranker::RankedList, similarity::SimilarityStore},
};

/// Movies per page unless configured otherwise
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Where a root movie is in its "show more" lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Nothing has been shown yet
    Fresh,
    /// At least one page has been shown
    Paging,
    /// No page differs from the last one shown
    Exhausted,
}

/// Per-root pagination record
///
/// Only the [`PaginationEngine`] mutates the cursor, the last shown ids and
/// the exhaustion flag.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    ranked: RankedList,
    page_cursor: usize,
    last_shown_ids: Option<Vec<i64>>,
    exhausted: bool,
}

impl SessionState {
    pub fn new(ranked: RankedList) -> Self {
        Self {
            ranked,
            page_cursor: 0,
            last_shown_ids: None,
            exhausted: false,
        }
    }

    pub fn ranked(&self) -> &RankedList {
        &self.ranked
    }

    pub fn page_cursor(&self) -> usize {
        self.page_cursor
    }

    pub fn last_shown_ids(&self) -> Option<&[i64]> {
        self.last_shown_ids.as_deref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn phase(&self) -> SessionPhase {
        if self.exhausted {
            SessionPhase::Exhausted
        } else if self.last_shown_ids.is_some() {
            SessionPhase::Paging
        } else {
            SessionPhase::Fresh
        }
    }
}

/// A slice of a ranked list
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub page_number: usize,
    pub items: Vec<Item>,
    /// Length of the whole ranked list, not of this page
    pub total_candidates: usize,
}

impl Page {
    pub fn ids(&self) -> Vec<i64> {
        self.items.iter().map(|item| item.id).collect()
    }
}

/// Outcome of asking for the next unique page
#[derive(Debug, Clone, PartialEq)]
pub enum PageResult {
    Found { page_number: usize, items: Vec<Item> },
    Exhausted,
}

impl PageResult {
    pub fn is_found(&self) -> bool {
        matches!(self, PageResult::Found { .. })
    }
}

/// Turns ranked lists into fixed-size pages
///
/// Holds no per-root state of its own; every operation receives the
/// [`SessionState`] it reads or updates.
#[derive(Debug, Clone)]
pub struct PaginationEngine {
    store: Arc<SimilarityStore>,
}

impl PaginationEngine {
    pub fn new(store: Arc<SimilarityStore>) -> Self {
        Self { store }
    }

    /// Returns page `page_number` without touching the cursor or exhaustion
    ///
    /// Pages past the end of the list are empty.
    pub fn get_page(
        &self,
        state: &SessionState,
        page_number: usize,
        page_size: usize,
    ) -> AppResult<Page> {
        validate_page_size(page_size)?;

        let indices = page_slice(&state.ranked, page_number, page_size);
        Ok(Page {
            page_number,
            items: self.items_for(indices)?,
            total_candidates: state.ranked.len(),
        })
    }

    /// Marks `ids` as the page the client is currently looking at
    pub fn record_shown(&self, state: &mut SessionState, ids: Vec<i64>) {
        state.last_shown_ids = Some(ids);
    }

    /// Returns the root to its initial state, keeping the ranked list
    pub fn reset(&self, state: &mut SessionState) {
        state.page_cursor = 0;
        state.last_shown_ids = None;
        state.exhausted = false;
    }

    /// Advances to the first page after the cursor whose ids differ from the
    /// last page shown
    ///
    /// Only the most recently shown page is compared, in order. Running out of
    /// pages is not an error: the state is flagged exhausted and stays that
    /// way until [`PaginationEngine::reset`].
    pub fn advance_to_next_unique_page(
        &self,
        state: &mut SessionState,
        page_size: usize,
    ) -> AppResult<PageResult> {
        validate_page_size(page_size)?;

        let total = state.ranked.len();
        let page_count = total.div_ceil(page_size);

        for page_number in state.page_cursor + 1..page_count {
            let items = self.items_for(page_slice(&state.ranked, page_number, page_size))?;
            let ids: Vec<i64> = items.iter().map(|item| item.id).collect();

            if state.last_shown_ids.as_deref() == Some(ids.as_slice()) {
                tracing::debug!(page = page_number, "Skipping page identical to last shown");
                continue;
            }

            state.page_cursor = page_number;
            state.last_shown_ids = Some(ids);
            state.exhausted = false;

            return Ok(PageResult::Found { page_number, items });
        }

        state.exhausted = true;
        tracing::debug!(
            cursor = state.page_cursor,
            total_candidates = total,
            "No unique page left"
        );

        Ok(PageResult::Exhausted)
    }

    fn items_for(&self, indices: &[usize]) -> AppResult<Vec<Item>> {
        indices
            .iter()
            .map(|&index| self.store.item(index).cloned())
            .collect()
    }
}

fn validate_page_size(page_size: usize) -> AppResult<()> {
    if page_size == 0 {
        return Err(AppError::InvalidArgument(
            "Page size must be positive".to_string(),
        ));
    }
    Ok(())
}

fn page_slice(ranked: &[usize], page_number: usize, page_size: usize) -> &[usize] {
    let start = page_number.saturating_mul(page_size).min(ranked.len());
    let end = start.saturating_add(page_size).min(ranked.len());
    &ranked[start..end]
}
