//! Poster lookup abstraction
//!
//! Posters come from an external service that can fail transiently. The
//! gateway owns its retry policy and always answers: a lookup that cannot be
//! completed degrades to a placeholder instead of an error, so one bad movie
//! never fails a whole page.
use crate::models::Poster;

pub mod tmdb;

/// Shown when the movie exists upstream but has no poster
pub const NO_IMAGE_PLACEHOLDER: &str = "https://via.placeholder.com/500x750?text=No+Image";

/// Shown when every lookup attempt failed
pub const CONNECTION_ERROR_PLACEHOLDER: &str =
    "https://via.placeholder.com/500x750?text=Connection+Error";

/// Trait for poster providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PosterGateway: Send + Sync {
    /// Fetch the poster for one movie
    async fn fetch_poster(&self, movie_id: i64) -> Poster;

    /// Fetch posters for several movies in parallel
    ///
    /// Results keep the order of `movie_ids`. Providers can override for bulk
    /// endpoints if available.
    async fn fetch_posters(&self, movie_ids: &[i64]) -> Vec<Poster> {
        let mut tasks = Vec::new();

        for &movie_id in movie_ids {
            let provider = self.clone_for_task();
            let task = tokio::spawn(async move { provider.fetch_poster(movie_id).await });
            tasks.push((movie_id, task));
        }

        let mut posters = Vec::with_capacity(tasks.len());
        let mut failures = 0;

        for (movie_id, task) in tasks {
            match task.await {
                Ok(poster) => {
                    if poster.placeholder {
                        failures += 1;
                    }
                    posters.push(poster);
                }
                Err(e) => {
                    tracing::error!(error = %e, movie_id, "Poster task join error");
                    failures += 1;
                    posters.push(Poster::placeholder(movie_id, CONNECTION_ERROR_PLACEHOLDER));
                }
            }
        }

        if failures > 0 {
            tracing::debug!(
                success_count = posters.len() - failures,
                placeholder_count = failures,
                provider = self.name(),
                "Some posters fell back to placeholders"
            );
        }

        posters
    }

    /// Clone provider for parallel task execution
    ///
    /// Required because providers need to be moved into tokio tasks.
    fn clone_for_task(&self) -> Box<dyn PosterGateway>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Gateway that never calls out and always returns the "No Image" placeholder
///
/// Used when no poster API key is configured.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderPosterGateway;

#[async_trait::async_trait]
impl PosterGateway for PlaceholderPosterGateway {
    async fn fetch_poster(&self, movie_id: i64) -> Poster {
        Poster::placeholder(movie_id, NO_IMAGE_PLACEHOLDER)
    }

    fn clone_for_task(&self) -> Box<dyn PosterGateway> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "placeholder"
    }
}
