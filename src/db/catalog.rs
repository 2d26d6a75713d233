use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::Item,
    services::similarity::{SimilarityMatrix, SimilarityStore},
};

pub const MOVIES_FILE: &str = "movies.json";
pub const PRIMARY_FILE: &str = "similarity_primary.json";
pub const SECONDARY_FILE: &str = "similarity_secondary.json";

/// One row of movies.json; the row position becomes the matrix index
#[derive(Debug, Deserialize)]
struct MovieRecord {
    movie_id: i64,
    title: String,
}

/// Catalog and both similarity matrices as read from disk
#[derive(Debug)]
pub struct CatalogData {
    pub items: Vec<Item>,
    pub primary: SimilarityMatrix,
    pub secondary: SimilarityMatrix,
}

impl CatalogData {
    /// Validates dimensions and builds the shared store
    pub fn into_store(self) -> AppResult<SimilarityStore> {
        SimilarityStore::new(self.items, self.primary, self.secondary)
    }
}

/// Loads movies.json and the two matrix files from `dir`
///
/// Matrix files hold an array of rows. Ragged rows and non-finite scores are
/// rejected here; size agreement with the catalog is checked by
/// [`CatalogData::into_store`].
pub async fn load_catalog(dir: impl AsRef<Path>) -> AppResult<CatalogData> {
    let dir = dir.as_ref();

    let records: Vec<MovieRecord> = read_json(&dir.join(MOVIES_FILE)).await?;
    let items = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| Item::new(record.movie_id, record.title, index))
        .collect::<Vec<_>>();

    let primary = SimilarityMatrix::from_rows(read_json(&dir.join(PRIMARY_FILE)).await?)?;
    let secondary = SimilarityMatrix::from_rows(read_json(&dir.join(SECONDARY_FILE)).await?)?;

    tracing::info!(
        dir = %dir.display(),
        movies = items.len(),
        primary = primary.size(),
        secondary = secondary.size(),
        "Catalog loaded"
    );

    Ok(CatalogData {
        items,
        primary,
        secondary,
    })
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Failed to read catalog file");
        AppError::Io(e)
    })?;

    serde_json::from_str(&raw).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Failed to parse catalog file");
        AppError::Parse(e)
    })
}
