use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::{
    error::{AppError, AppResult},
    models::Item,
    services::similarity::SimilarityStore,
};

/// Minimum similarity ratio for a fuzzy title match
pub const FUZZY_CUTOFF: f64 = 0.35;

/// Turns arbitrary user text into a catalog movie
///
/// Matching runs in order: case-insensitive exact title, case-insensitive
/// substring, closest fuzzy match at or above [`FUZZY_CUTOFF`]. Empty text and
/// text matching nothing resolve to a random movie, so a non-empty catalog
/// always yields a result.
pub struct TitleResolver {
    store: Arc<SimilarityStore>,
    rng: Mutex<StdRng>,
}

impl TitleResolver {
    pub fn new(store: Arc<SimilarityStore>) -> Self {
        Self {
            store,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Creates a resolver whose random fallback is reproducible
    pub fn with_seed(store: Arc<SimilarityStore>, seed: u64) -> Self {
        Self {
            store,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn resolve(&self, text: &str) -> AppResult<&Item> {
        let items = self.store.items();
        if items.is_empty() {
            return Err(AppError::NotFound("Catalog is empty".to_string()));
        }

        let query = text.trim();
        if query.is_empty() {
            return self.random_item();
        }

        let lowered = query.to_lowercase();

        if let Some(item) = items.iter().find(|item| item.title.to_lowercase() == lowered) {
            return Ok(item);
        }

        if let Some(item) = items
            .iter()
            .find(|item| item.title.to_lowercase().contains(&lowered))
        {
            return Ok(item);
        }

        if let Some(item) = self.closest_match(query) {
            tracing::debug!(query = %query, matched = %item.title, "Fuzzy title match");
            return Ok(item);
        }

        tracing::debug!(query = %query, "No title match, picking a random movie");
        self.random_item()
    }

    /// Highest-ratio title at or above the cutoff
    ///
    /// Equal ratios go to the lexicographically greatest title, then to the
    /// earliest catalog row.
    fn closest_match(&self, query: &str) -> Option<&Item> {
        let query: Vec<char> = query.chars().collect();
        let mut best: Option<(&Item, f64)> = None;

        for item in self.store.items() {
            let title: Vec<char> = item.title.chars().collect();
            let ratio = similarity_ratio(&title, &query);
            if ratio < FUZZY_CUTOFF {
                continue;
            }
            let better = match best {
                None => true,
                Some((current, best_ratio)) => {
                    ratio > best_ratio || (ratio == best_ratio && item.title > current.title)
                }
            };
            if better {
                best = Some((item, ratio));
            }
        }

        best.map(|(item, _)| item)
    }

    fn random_item(&self) -> AppResult<&Item> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| AppError::Internal("Resolver RNG lock poisoned".to_string()))?;

        self.store
            .items()
            .choose(&mut *rng)
            .ok_or_else(|| AppError::NotFound("Catalog is empty".to_string()))
    }
}

/// Queries at least this long have their frequent characters dropped from
/// the match index
const POPULAR_MIN_LEN: usize = 200;

/// Gestalt pattern-matching ratio in `[0, 1]`: twice the number of matched
/// characters over the combined length
///
/// Matched characters come from recursively taking the longest common run and
/// repeating on both sides of it. `candidate` is scanned against an index of
/// `query`.
fn similarity_ratio(candidate: &[char], query: &[char]) -> f64 {
    let total = candidate.len() + query.len();
    if total == 0 {
        return 1.0;
    }
    let matched = RunMatcher::new(candidate, query).matched_len();
    2.0 * matched as f64 / total as f64
}

struct RunMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// Positions of each character in `b`, ascending
    b_positions: HashMap<char, Vec<usize>>,
}

impl<'a> RunMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b_positions: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b_positions.entry(c).or_default().push(j);
        }

        if b.len() >= POPULAR_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b_positions.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b_positions }
    }

    /// Longest run with `a[i..i + k] == b[j..j + k]` inside the given windows,
    /// as `(i, j, k)`; the earliest such run wins
    fn longest_run(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_len) = (alo, blo, 0);
        let mut run_ending_at: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b_positions.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let len = j
                        .checked_sub(1)
                        .and_then(|prev| run_ending_at.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next.insert(j, len);
                    if len > best_len {
                        best_i = i + 1 - len;
                        best_j = j + 1 - len;
                        best_len = len;
                    }
                }
            }
            run_ending_at = next;
        }

        // Popular characters are missing from the index; grow over them here
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_len += 1;
        }
        while best_i + best_len < ahi
            && best_j + best_len < bhi
            && self.a[best_i + best_len] == self.b[best_j + best_len]
        {
            best_len += 1;
        }

        (best_i, best_j, best_len)
    }

    fn matched_len(&self) -> usize {
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];
        let mut matched = 0;

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let (i, j, len) = self.longest_run(alo, ahi, blo, bhi);
            if len == 0 {
                continue;
            }
            matched += len;
            if alo < i && blo < j {
                pending.push((alo, i, blo, j));
            }
            if i + len < ahi && j + len < bhi {
                pending.push((i + len, ahi, j + len, bhi));
            }
        }

        matched
    }
}
