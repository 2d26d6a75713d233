use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A catalog movie
///
/// `index` is the row/column of this movie in both similarity matrices and
/// always equals its position in the catalog. `id` is the external (TMDB)
/// identifier used for poster lookups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: i64,
    pub title: String,
    pub index: usize,
}

impl Item {
    pub fn new(id: i64, title: impl Into<String>, index: usize) -> Self {
        Self {
            id,
            title: title.into(),
            index,
        }
    }
}

/// How a caller names a catalog movie
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemIdentity {
    /// Exact catalog title
    Title(String),
    /// External movie id
    Id(i64),
}

impl Display for ItemIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemIdentity::Title(title) => write!(f, "title '{}'", title),
            ItemIdentity::Id(id) => write!(f, "id {}", id),
        }
    }
}

impl From<&Item> for ItemIdentity {
    fn from(item: &Item) -> Self {
        ItemIdentity::Id(item.id)
    }
}
