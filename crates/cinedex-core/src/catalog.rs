//! Catalog records
//!
//! Genres, movies and reviews as they are stored in the document store.
//! Each record carries its own identifier field, which doubles as the
//! record key inside its collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::new_record_id;

/// Movie genre
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Genre {
    pub genre_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Genre {
    pub const COLLECTION: &'static str = "genre";

    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            genre_id: new_record_id(),
            name: name.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Catalog movie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Movie {
    pub movie_id: String,
    pub name: String,
    pub topic: String,
    /// Streaming or trailer location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movie_url: Option<String>,
    /// Genre this movie is filed under (may be empty)
    #[serde(default)]
    pub genre_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Movie {
    pub const COLLECTION: &'static str = "movie";

    pub fn new(
        name: impl Into<String>,
        topic: impl Into<String>,
        movie_url: Option<String>,
        genre_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            movie_id: new_record_id(),
            name: name.into(),
            topic: topic.into(),
            movie_url,
            genre_id: genre_id.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// User review of a movie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub review_id: String,
    pub review: String,
    pub movie_id: String,
    /// Subject id of the author
    pub reviewer_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    pub const COLLECTION: &'static str = "review";

    pub fn new(
        review: impl Into<String>,
        movie_id: impl Into<String>,
        reviewer_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            review_id: new_record_id(),
            review: review.into(),
            movie_id: movie_id.into(),
            reviewer_id: reviewer_id.into(),
            created_at: now,
            updated_at: now,
        }
    }
}
