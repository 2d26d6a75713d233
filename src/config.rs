use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Directory holding movies.json and the two similarity matrices
    #[serde(default = "default_catalog_dir")]
    pub catalog_dir: String,

    /// Redis connection URL; poster caching is disabled when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// TMDB API key
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// TMDB image CDN base URL
    #[serde(default = "default_tmdb_image_url")]
    pub tmdb_image_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Movies per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Candidates kept by the primary metric before re-ranking
    #[serde(default = "default_primary_k")]
    pub primary_k: usize,

    #[serde(default = "default_poster_retry_attempts")]
    pub poster_retry_attempts: u32,

    #[serde(default = "default_poster_retry_delay_ms")]
    pub poster_retry_delay_ms: u64,

    #[serde(default = "default_poster_timeout_secs")]
    pub poster_timeout_secs: u64,

    /// Idle sessions older than this are dropped on the next access
    #[serde(default = "default_session_idle_ttl_secs")]
    pub session_idle_ttl_secs: i64,
}

fn default_catalog_dir() -> String {
    "model".to_string()
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org".to_string()
}

fn default_tmdb_image_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_page_size() -> usize {
    5
}

fn default_primary_k() -> usize {
    25
}

fn default_poster_retry_attempts() -> u32 {
    3
}

fn default_poster_retry_delay_ms() -> u64 {
    1000
}

fn default_poster_timeout_secs() -> u64 {
    10
}

fn default_session_idle_ttl_secs() -> i64 {
    3600
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Idle timeout for client sessions
    ///
    /// Rejects values that are not positive or do not fit a `chrono::Duration`.
    pub fn session_idle_ttl(&self) -> anyhow::Result<chrono::Duration> {
        if self.session_idle_ttl_secs <= 0 {
            anyhow::bail!(
                "SESSION_IDLE_TTL_SECS must be positive, got {}",
                self.session_idle_ttl_secs
            );
        }
        chrono::Duration::try_seconds(self.session_idle_ttl_secs).ok_or_else(|| {
            anyhow::anyhow!(
                "SESSION_IDLE_TTL_SECS is out of range: {}",
                self.session_idle_ttl_secs
            )
        })
    }

    /// Socket address string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
