use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::Item,
    services::{pagination::SessionState, ranker::CandidateRanker},
};

/// Pagination state for every root movie one client has looked at
///
/// Keyed by the root movie's external id. Entries live as long as the
/// client's session.
#[derive(Debug, Default)]
pub struct SessionBook {
    states: HashMap<i64, SessionState>,
    current_root: Option<i64>,
}

impl SessionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the state for `root`, ranking its candidates on first access
    pub fn entry(&mut self, root: &Item, ranker: &CandidateRanker) -> AppResult<&mut SessionState> {
        if !self.states.contains_key(&root.id) {
            let ranked = ranker.rank(root.index)?;
            tracing::debug!(
                root_id = root.id,
                candidates = ranked.len(),
                "Created session state for root movie"
            );
            self.states.insert(root.id, SessionState::new(ranked));
        }

        self.states
            .get_mut(&root.id)
            .ok_or_else(|| AppError::Internal(format!("Session state missing for {}", root.id)))
    }

    pub fn get(&self, root_id: i64) -> Option<&SessionState> {
        self.states.get(&root_id)
    }

    pub fn current_root(&self) -> Option<i64> {
        self.current_root
    }

    pub fn set_current_root(&mut self, root_id: i64) {
        self.current_root = Some(root_id);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

struct RegistryEntry {
    book: Arc<Mutex<SessionBook>>,
    last_seen: DateTime<Utc>,
}

/// Client sessions, each with its own [`SessionBook`]
///
/// Books are never shared between sessions and each sits behind its own
/// mutex, so requests from one client serialize while other clients proceed.
/// Idle sessions are dropped on the next registry access.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, RegistryEntry>>>,
    idle_ttl: Duration,
}

impl SessionRegistry {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
        }
    }

    /// Returns the book for `session_id`, creating it if needed
    pub async fn session(&self, session_id: Uuid) -> Arc<Mutex<SessionBook>> {
        self.session_at(session_id, Utc::now()).await
    }

    async fn session_at(&self, session_id: Uuid, now: DateTime<Utc>) -> Arc<Mutex<SessionBook>> {
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        let cutoff = now - self.idle_ttl;
        sessions.retain(|id, entry| *id == session_id || entry.last_seen >= cutoff);
        let pruned = before - sessions.len();
        if pruned > 0 {
            tracing::info!(pruned, "Dropped idle sessions");
        }

        let entry = sessions.entry(session_id).or_insert_with(|| {
            tracing::debug!(session_id = %session_id, "New session");
            RegistryEntry {
                book: Arc::new(Mutex::new(SessionBook::new())),
                last_seen: now,
            }
        });
        entry.last_seen = now;

        entry.book.clone()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(Duration::hours(1))
    }
}
