pub mod pagination;
pub mod providers;
pub mod ranker;
pub mod recommendations;
pub mod session;
pub mod similarity;
pub mod title_search;

pub use pagination::{Page, PageResult, PaginationEngine, SessionPhase, SessionState};
pub use ranker::{CandidateRanker, RankedList};
pub use recommendations::{RecommendationService, Recommendations};
pub use session::{SessionBook, SessionRegistry};
pub use similarity::{SimilarityMatrix, SimilarityStore};
pub use title_search::TitleResolver;
