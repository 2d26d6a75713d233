//! TMDB poster provider
//!
//! Looks up `GET /3/movie/{id}` and builds a w500 poster URL from
//! `poster_path`. Transport and status failures are retried with a fixed
//! delay; once attempts run out the caller gets the connection-error
//! placeholder. Completed lookups (including "no poster") are cached in Redis
//! when a cache is configured.
use std::time::Duration;

use reqwest::Client as HttpClient;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{Poster, TmdbMovie},
    services::providers::{PosterGateway, CONNECTION_ERROR_PLACEHOLDER, NO_IMAGE_PLACEHOLDER},
};

const POSTER_CACHE_TTL: u64 = 604800; // 1 week
const POSTER_SIZE: &str = "w500";

/// How often and how patiently to retry a poster lookup
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

#[derive(Clone)]
pub struct TmdbPosterGateway {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_url: String,
    cache: Option<Cache>,
    retry: RetryPolicy,
}

impl TmdbPosterGateway {
    pub fn new(
        api_key: String,
        api_url: String,
        image_url: String,
        timeout: Duration,
        retry: RetryPolicy,
        cache: Option<Cache>,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            image_url: image_url.trim_end_matches('/').to_string(),
            cache,
            retry,
        })
    }

    fn poster_url(&self, poster_path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.image_url,
            POSTER_SIZE,
            poster_path.trim_start_matches('/')
        )
    }

    /// Single request against TMDB
    async fn request_poster(&self, movie_id: i64) -> AppResult<Poster> {
        let url = format!("{}/3/movie/{}", self.api_url, movie_id);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", "en-US")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let movie: TmdbMovie = response.json().await?;

        Ok(match movie.poster_path {
            Some(path) if !path.is_empty() => Poster::found(movie_id, self.poster_url(&path)),
            _ => Poster::placeholder(movie_id, NO_IMAGE_PLACEHOLDER),
        })
    }

    /// Runs [`Self::request_poster`] under the retry policy
    async fn request_with_retry(&self, movie_id: i64) -> AppResult<Poster> {
        let attempts = self.retry.attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.request_poster(movie_id).await {
                Ok(poster) => return Ok(poster),
                Err(e) => {
                    tracing::warn!(
                        movie_id,
                        attempt,
                        max_attempts = attempts,
                        error = %e,
                        "Poster lookup failed"
                    );
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            AppError::ExternalApi(format!("Poster lookup for {} never ran", movie_id))
        }))
    }

    async fn cached_lookup(&self, cache: &Cache, movie_id: i64) -> AppResult<Poster> {
        cached!(
            cache,
            CacheKey::Poster(movie_id),
            POSTER_CACHE_TTL,
            self.request_with_retry(movie_id)
        )
    }
}

#[async_trait::async_trait]
impl PosterGateway for TmdbPosterGateway {
    async fn fetch_poster(&self, movie_id: i64) -> Poster {
        let result = match &self.cache {
            Some(cache) => match self.cached_lookup(cache, movie_id).await {
                Err(AppError::Cache(e)) => {
                    tracing::warn!(
                        movie_id,
                        error = %e,
                        "Poster cache unavailable, fetching directly"
                    );
                    self.request_with_retry(movie_id).await
                }
                other => other,
            },
            None => self.request_with_retry(movie_id).await,
        };

        match result {
            Ok(poster) => {
                tracing::debug!(
                    movie_id,
                    placeholder = poster.placeholder,
                    provider = "tmdb",
                    "Poster fetched"
                );
                poster
            }
            Err(e) => {
                tracing::error!(
                    movie_id,
                    error = %e,
                    provider = "tmdb",
                    "Poster lookup exhausted retries"
                );
                Poster::placeholder(movie_id, CONNECTION_ERROR_PLACEHOLDER)
            }
        }
    }

    fn clone_for_task(&self) -> Box<dyn PosterGateway> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
