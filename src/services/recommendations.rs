use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Item, ItemIdentity, MovieCard, Poster},
    services::{
        pagination::{Page, PageResult, PaginationEngine},
        providers::{PosterGateway, CONNECTION_ERROR_PLACEHOLDER},
        ranker::CandidateRanker,
        session::SessionBook,
        similarity::SimilarityStore,
        title_search::TitleResolver,
    },
};

/// What the client sees for a root movie
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendations {
    pub root: Item,
    pub page: Page,
    pub exhausted: bool,
}

/// Entry point for the "search" and "get similar movies" actions
///
/// Every operation takes the caller's [`SessionBook`] explicitly; the service
/// itself only holds immutable data and stateless helpers, so one instance
/// serves all sessions.
pub struct RecommendationService {
    store: Arc<SimilarityStore>,
    ranker: CandidateRanker,
    engine: PaginationEngine,
    resolver: TitleResolver,
    gateway: Arc<dyn PosterGateway>,
    page_size: usize,
}

impl RecommendationService {
    pub fn new(
        store: Arc<SimilarityStore>,
        gateway: Arc<dyn PosterGateway>,
        primary_k: usize,
        page_size: usize,
    ) -> AppResult<Self> {
        let resolver = TitleResolver::new(store.clone());
        Self::with_resolver(store, gateway, resolver, primary_k, page_size)
    }

    /// Same as [`RecommendationService::new`] with a caller-supplied resolver,
    /// typically one seeded for reproducible random fallbacks
    pub fn with_resolver(
        store: Arc<SimilarityStore>,
        gateway: Arc<dyn PosterGateway>,
        resolver: TitleResolver,
        primary_k: usize,
        page_size: usize,
    ) -> AppResult<Self> {
        if page_size == 0 {
            return Err(AppError::InvalidArgument(
                "Page size must be positive".to_string(),
            ));
        }

        Ok(Self {
            ranker: CandidateRanker::new(store.clone(), primary_k)?,
            engine: PaginationEngine::new(store.clone()),
            store,
            resolver,
            gateway,
            page_size,
        })
    }

    pub fn resolve(&self, identity: &ItemIdentity) -> AppResult<&Item> {
        let index = self.store.resolve_index(identity)?;
        self.store.item(index)
    }

    /// Shows the page the root's cursor points at (page 0 on first access)
    ///
    /// The shown ids become the reference for the next "show more".
    pub fn show_recommendations(
        &self,
        book: &mut SessionBook,
        identity: &ItemIdentity,
    ) -> AppResult<Recommendations> {
        let root = self.resolve(identity)?;
        let state = book.entry(root, &self.ranker)?;

        let page = self
            .engine
            .get_page(state, state.page_cursor(), self.page_size)?;
        self.engine.record_shown(state, page.ids());
        let exhausted = state.is_exhausted();
        book.set_current_root(root.id);

        tracing::info!(
            root_id = root.id,
            root_title = %root.title,
            page = page.page_number,
            shown = page.items.len(),
            total_candidates = page.total_candidates,
            "Showing recommendations"
        );

        Ok(Recommendations {
            root: root.clone(),
            page,
            exhausted,
        })
    }

    /// Moves the root to its next page with a different id sequence
    pub fn request_more(
        &self,
        book: &mut SessionBook,
        identity: &ItemIdentity,
    ) -> AppResult<PageResult> {
        let root = self.resolve(identity)?;
        let state = book.entry(root, &self.ranker)?;

        let result = self
            .engine
            .advance_to_next_unique_page(state, self.page_size)?;

        match &result {
            PageResult::Found { page_number, items } => {
                book.set_current_root(root.id);
                tracing::info!(
                    root_id = root.id,
                    page = page_number,
                    shown = items.len(),
                    "Advanced to next unique page"
                );
            }
            PageResult::Exhausted => {
                tracing::info!(root_id = root.id, "No more unique pages for root movie");
            }
        }

        Ok(result)
    }

    /// Resolves free text to a movie and starts its recommendations over
    pub fn search(&self, book: &mut SessionBook, text: &str) -> AppResult<Recommendations> {
        let root = self.resolver.resolve(text)?;
        tracing::info!(query = %text, resolved = %root.title, "Search resolved");

        let state = book.entry(root, &self.ranker)?;
        self.engine.reset(state);

        self.show_recommendations(book, &ItemIdentity::from(root))
    }

    /// Re-displays the session's current root, if any
    pub fn current(&self, book: &mut SessionBook) -> AppResult<Option<Recommendations>> {
        match book.current_root() {
            Some(root_id) => self
                .show_recommendations(book, &ItemIdentity::Id(root_id))
                .map(Some),
            None => Ok(None),
        }
    }

    /// Pairs each movie with its poster
    ///
    /// Poster failures never fail the page; affected movies get a placeholder.
    pub async fn attach_posters(&self, items: &[Item]) -> Vec<MovieCard> {
        let ids: Vec<i64> = items.iter().map(|item| item.id).collect();
        let mut posters = self.gateway.fetch_posters(&ids).await.into_iter();

        items
            .iter()
            .map(|item| {
                let poster = posters
                    .next()
                    .filter(|poster| poster.movie_id == item.id)
                    .unwrap_or_else(|| {
                        Poster::placeholder(item.id, CONNECTION_ERROR_PLACEHOLDER)
                    });
                MovieCard::new(item, poster)
            })
            .collect()
    }
}
