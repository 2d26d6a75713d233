use serde::{Deserialize, Serialize};

mod item;

pub use item::{Item, ItemIdentity};

/// Poster reference for one movie
///
/// `placeholder` is set when the gateway could not produce a real poster and
/// `url` points at a stand-in image instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Poster {
    pub movie_id: i64,
    pub url: String,
    pub placeholder: bool,
}

impl Poster {
    pub fn found(movie_id: i64, url: String) -> Self {
        Self {
            movie_id,
            url,
            placeholder: false,
        }
    }

    pub fn placeholder(movie_id: i64, url: &str) -> Self {
        Self {
            movie_id,
            url: url.to_string(),
            placeholder: true,
        }
    }
}

/// A recommended movie as rendered to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieCard {
    pub id: i64,
    pub title: String,
    pub poster: String,
    pub poster_placeholder: bool,
}

impl MovieCard {
    pub fn new(item: &Item, poster: Poster) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            poster: poster.url,
            poster_placeholder: poster.placeholder,
        }
    }
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Subset of the TMDB `GET /3/movie/{id}` response
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    #[serde(default)]
    pub poster_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_card_from_placeholder() {
        let item = Item::new(11, "Star Wars", 0);
        let card = MovieCard::new(&item, Poster::placeholder(11, "https://placeholder"));

        assert_eq!(card.id, 11);
        assert_eq!(card.title, "Star Wars");
        assert_eq!(card.poster, "https://placeholder");
        assert!(card.poster_placeholder);
    }

    #[test]
    fn test_tmdb_movie_deserialization() {
        let json = r#"{
            "id": 19995,
            "title": "Avatar",
            "poster_path": "/kyeqWdyUXW608qlYkRqosgbbJyK.jpg"
        }"#;

        let movie: TmdbMovie = serde_json::from_str(json).unwrap();
        assert_eq!(
            movie.poster_path,
            Some("/kyeqWdyUXW608qlYkRqosgbbJyK.jpg".to_string())
        );
    }

    #[test]
    fn test_tmdb_movie_null_poster() {
        let movie: TmdbMovie = serde_json::from_str(r#"{"poster_path": null}"#).unwrap();
        assert_eq!(movie.poster_path, None);

        let movie: TmdbMovie = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(movie.poster_path, None);
    }
}
