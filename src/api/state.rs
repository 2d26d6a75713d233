use std::sync::Arc;

use chrono::Duration;

use crate::services::{RecommendationService, SessionRegistry};

/// Shared application state
///
/// The service holds only immutable catalog data; everything mutable lives
/// in per-session books inside the registry.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RecommendationService>,
    pub sessions: SessionRegistry,
}

impl AppState {
    /// Creates application state with sessions expiring after `session_idle_ttl`
    pub fn new(service: RecommendationService, session_idle_ttl: Duration) -> Self {
        Self {
            service: Arc::new(service),
            sessions: SessionRegistry::new(session_idle_ttl),
        }
    }
}
