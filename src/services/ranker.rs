use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    services::similarity::SimilarityStore,
};

/// Candidates kept by the primary metric before re-ranking
pub const DEFAULT_PRIMARY_K: usize = 25;

/// Ordered catalog indices recommended for one root movie
///
/// Cheap to clone; the underlying list is shared and never mutated.
pub type RankedList = Arc<[usize]>;

/// Two-stage candidate ranking
///
/// The primary metric picks the `primary_k` closest movies, then the
/// secondary metric reorders only that bounded set. The secondary matrix is
/// never scanned across the full catalog.
#[derive(Debug, Clone)]
pub struct CandidateRanker {
    store: Arc<SimilarityStore>,
    primary_k: usize,
}

impl CandidateRanker {
    pub fn new(store: Arc<SimilarityStore>, primary_k: usize) -> AppResult<Self> {
        if primary_k == 0 {
            return Err(AppError::InvalidArgument(
                "primary_k must be positive".to_string(),
            ));
        }
        Ok(Self { store, primary_k })
    }

    pub fn with_default_k(store: Arc<SimilarityStore>) -> Self {
        Self {
            store,
            primary_k: DEFAULT_PRIMARY_K,
        }
    }

    pub fn store(&self) -> &Arc<SimilarityStore> {
        &self.store
    }

    /// Ranks candidates for `root_index`
    ///
    /// Deterministic for fixed matrices. The root never appears in its own
    /// list and the list holds at most `primary_k` entries.
    pub fn rank(&self, root_index: usize) -> AppResult<RankedList> {
        let coarse = self.store.top_k_by_primary(root_index, self.primary_k)?;
        let ranked = self.store.rerank_by_secondary(root_index, &coarse)?;

        tracing::debug!(
            root_index,
            candidates = ranked.len(),
            primary_k = self.primary_k,
            "Ranked candidates"
        );

        Ok(ranked.into())
    }
}
