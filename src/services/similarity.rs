use crate::{
    error::{AppError, AppResult},
    models::{Item, ItemIdentity},
};

/// Square matrix of similarity scores, stored row-major
///
/// `score(i, j)` is the similarity of movie `i` to movie `j`. Symmetry is not
/// assumed.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    scores: Vec<f32>,
}

impl SimilarityMatrix {
    /// Builds a matrix from nested rows, rejecting ragged or non-finite input
    pub fn from_rows(rows: Vec<Vec<f32>>) -> AppResult<Self> {
        let size = rows.len();
        let mut scores = Vec::with_capacity(size * size);

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(AppError::DataIntegrity(format!(
                    "Similarity row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    size
                )));
            }
            if let Some(j) = row.iter().position(|score| !score.is_finite()) {
                return Err(AppError::DataIntegrity(format!(
                    "Non-finite similarity score at [{}][{}]",
                    i, j
                )));
            }
            scores.extend(row);
        }

        Ok(Self { size, scores })
    }

    /// Number of rows (and columns)
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.scores[i * self.size..(i + 1) * self.size]
    }

    pub fn score(&self, i: usize, j: usize) -> f32 {
        self.scores[i * self.size + j]
    }
}

/// Immutable catalog plus the primary and secondary similarity matrices
///
/// Read-only after construction, so a single instance is shared across all
/// sessions behind an `Arc` without locking.
#[derive(Debug)]
pub struct SimilarityStore {
    items: Vec<Item>,
    primary: SimilarityMatrix,
    secondary: SimilarityMatrix,
}

impl SimilarityStore {
    /// Creates the store, failing fast when the catalog and matrices disagree
    pub fn new(
        items: Vec<Item>,
        primary: SimilarityMatrix,
        secondary: SimilarityMatrix,
    ) -> AppResult<Self> {
        let n = items.len();
        if primary.size() != n || secondary.size() != n {
            return Err(AppError::DataIntegrity(format!(
                "Catalog has {} movies but primary matrix is {}x{} and secondary matrix is {}x{}",
                n,
                primary.size(),
                primary.size(),
                secondary.size(),
                secondary.size()
            )));
        }

        if let Some((pos, item)) = items
            .iter()
            .enumerate()
            .find(|(pos, item)| item.index != *pos)
        {
            return Err(AppError::DataIntegrity(format!(
                "Movie {} has index {} but sits at catalog position {}",
                item.id, item.index, pos
            )));
        }

        tracing::info!(movies = n, "Similarity store ready");

        Ok(Self {
            items,
            primary,
            secondary,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, index: usize) -> AppResult<&Item> {
        self.items
            .get(index)
            .ok_or_else(|| AppError::NotFound(format!("No movie at index {}", index)))
    }

    /// Maps a movie identity to its matrix index
    ///
    /// Titles are matched exactly; when several movies share a title the first
    /// one in catalog order wins.
    pub fn resolve_index(&self, identity: &ItemIdentity) -> AppResult<usize> {
        let found = match identity {
            ItemIdentity::Title(title) => self.items.iter().find(|item| &item.title == title),
            ItemIdentity::Id(id) => self.items.iter().find(|item| item.id == *id),
        };

        found
            .map(|item| item.index)
            .ok_or_else(|| AppError::NotFound(format!("Movie with {} is not in the catalog", identity)))
    }

    /// Returns the `k` movies with the highest primary score against `index`
    ///
    /// The query movie itself is never returned. Equal scores keep matrix row
    /// order.
    pub fn top_k_by_primary(&self, index: usize, k: usize) -> AppResult<Vec<usize>> {
        self.item(index)?;

        let mut scored: Vec<(usize, f32)> = self
            .primary
            .row(index)
            .iter()
            .copied()
            .enumerate()
            .filter(|(candidate, _)| *candidate != index)
            .collect();

        // sort_by is stable, so ties stay in row order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(candidate, _)| candidate)
            .collect())
    }

    /// Reorders `candidates` by `secondary[base][candidate]`, highest first
    pub fn rerank_by_secondary(&self, base: usize, candidates: &[usize]) -> AppResult<Vec<usize>> {
        self.item(base)?;
        if let Some(&bad) = candidates.iter().find(|&&c| c >= self.len()) {
            return Err(AppError::NotFound(format!("No movie at index {}", bad)));
        }

        let row = self.secondary.row(base);
        let mut reranked = candidates.to_vec();
        reranked.sort_by(|&a, &b| row[b].total_cmp(&row[a]));

        Ok(reranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(n: usize) -> Vec<Item> {
        (0..n)
            .map(|i| Item::new(100 + i as i64, format!("Movie {}", i), i))
            .collect()
    }

    fn matrix(rows: Vec<Vec<f32>>) -> SimilarityMatrix {
        SimilarityMatrix::from_rows(rows).unwrap()
    }

    fn store_3x3() -> SimilarityStore {
        let primary = matrix(vec![
            vec![1.0, 0.2, 0.8],
            vec![0.2, 1.0, 0.5],
            vec![0.8, 0.5, 1.0],
        ]);
        let secondary = matrix(vec![
            vec![1.0, 0.9, 0.1],
            vec![0.9, 1.0, 0.3],
            vec![0.1, 0.3, 1.0],
        ]);
        SimilarityStore::new(catalog(3), primary, secondary).unwrap()
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let result = SimilarityMatrix::from_rows(vec![vec![1.0, 0.5], vec![0.5]]);
        assert!(matches!(result, Err(AppError::DataIntegrity(_))));
    }

    #[test]
    fn test_from_rows_rejects_nan() {
        let result = SimilarityMatrix::from_rows(vec![vec![1.0, f32::NAN], vec![0.5, 1.0]]);
        assert!(matches!(result, Err(AppError::DataIntegrity(_))));
    }

    #[test]
    fn test_new_rejects_dimension_mismatch() {
        let primary = matrix(vec![vec![1.0, 0.5], vec![0.5, 1.0]]);
        let secondary = primary.clone();
        let result = SimilarityStore::new(catalog(3), primary, secondary);
        assert!(matches!(result, Err(AppError::DataIntegrity(_))));
    }

    #[test]
    fn test_new_rejects_secondary_mismatch() {
        let primary = matrix(vec![vec![1.0, 0.5], vec![0.5, 1.0]]);
        let secondary = matrix(vec![vec![1.0]]);
        let result = SimilarityStore::new(catalog(2), primary, secondary);
        assert!(matches!(result, Err(AppError::DataIntegrity(_))));
    }

    #[test]
    fn test_new_rejects_misplaced_index() {
        let mut items = catalog(2);
        items[1].index = 5;
        let m = matrix(vec![vec![1.0, 0.5], vec![0.5, 1.0]]);
        let result = SimilarityStore::new(items, m.clone(), m);
        assert!(matches!(result, Err(AppError::DataIntegrity(_))));
    }

    #[test]
    fn test_resolve_index_by_title_and_id() {
        let store = store_3x3();
        assert_eq!(
            store
                .resolve_index(&ItemIdentity::Title("Movie 2".to_string()))
                .unwrap(),
            2
        );
        assert_eq!(store.resolve_index(&ItemIdentity::Id(101)).unwrap(), 1);
    }

    #[test]
    fn test_resolve_index_duplicate_title_takes_first() {
        let mut items = catalog(3);
        items[2].title = "Movie 1".to_string();
        let m = matrix(vec![vec![0.0; 3], vec![0.0; 3], vec![0.0; 3]]);
        let store = SimilarityStore::new(items, m.clone(), m).unwrap();

        assert_eq!(
            store
                .resolve_index(&ItemIdentity::Title("Movie 1".to_string()))
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_resolve_index_not_found() {
        let store = store_3x3();
        let result = store.resolve_index(&ItemIdentity::Title("movie 1".to_string()));
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(matches!(
            store.resolve_index(&ItemIdentity::Id(999)),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_top_k_by_primary_excludes_self() {
        let store = store_3x3();
        assert_eq!(store.top_k_by_primary(0, 25).unwrap(), vec![2, 1]);
        assert_eq!(store.top_k_by_primary(1, 25).unwrap(), vec![2, 0]);
    }

    #[test]
    fn test_top_k_by_primary_truncates() {
        let store = store_3x3();
        assert_eq!(store.top_k_by_primary(0, 1).unwrap(), vec![2]);
        assert!(store.top_k_by_primary(0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_top_k_by_primary_excludes_self_even_when_not_highest() {
        let primary = matrix(vec![
            vec![0.1, 0.9, 0.5],
            vec![0.9, 1.0, 0.5],
            vec![0.5, 0.5, 1.0],
        ]);
        let store = SimilarityStore::new(catalog(3), primary.clone(), primary).unwrap();
        assert_eq!(store.top_k_by_primary(0, 25).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_top_k_by_primary_ties_keep_row_order() {
        let primary = matrix(vec![
            vec![1.0, 0.5, 0.5, 0.5],
            vec![0.5, 1.0, 0.5, 0.5],
            vec![0.5, 0.5, 1.0, 0.5],
            vec![0.5, 0.5, 0.5, 1.0],
        ]);
        let store = SimilarityStore::new(catalog(4), primary.clone(), primary).unwrap();
        assert_eq!(store.top_k_by_primary(2, 25).unwrap(), vec![0, 1, 3]);
    }

    #[test]
    fn test_top_k_by_primary_out_of_range() {
        let store = store_3x3();
        assert!(matches!(
            store.top_k_by_primary(3, 5),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_rerank_by_secondary() {
        let store = store_3x3();
        // secondary row 0: movie 1 scores 0.9, movie 2 scores 0.1
        assert_eq!(store.rerank_by_secondary(0, &[2, 1]).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_rerank_by_secondary_ties_are_stable() {
        let primary = matrix(vec![vec![0.0; 4], vec![0.0; 4], vec![0.0; 4], vec![0.0; 4]]);
        let secondary = primary.clone();
        let store = SimilarityStore::new(catalog(4), primary, secondary).unwrap();
        assert_eq!(
            store.rerank_by_secondary(0, &[3, 1, 2]).unwrap(),
            vec![3, 1, 2]
        );
    }

    #[test]
    fn test_rerank_by_secondary_rejects_unknown_candidate() {
        let store = store_3x3();
        assert!(matches!(
            store.rerank_by_secondary(0, &[1, 7]),
            Err(AppError::NotFound(_))
        ));
    }
}
