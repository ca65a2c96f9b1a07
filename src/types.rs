//! Records exchanged with the catalog and the data service.
//!
//! Field names on the wire follow the backend collections (`searchTerm`,
//! `userName`, `comment`); the Rust side uses descriptive names and serde
//! renames at the boundary.

use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ReelError, Result};

/// Base path prepended to catalog poster paths
pub const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

/// Build a full poster URL from a catalog poster path
pub fn poster_url(poster_path: &str) -> String {
    format!("{POSTER_BASE_URL}{poster_path}")
}

/// Catalog movie identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(pub u64);

impl MovieId {
    /// Parse a movie id coming from navigation or user input.
    ///
    /// Only positive integers are accepted.
    pub fn parse(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u64>()
            .ok()
            .filter(|&n| n > 0)
            .map(MovieId)
            .ok_or_else(|| ReelError::InvalidMovieId(s.to_string()))
    }
}

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MovieId {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self> {
        MovieId::parse(s)
    }
}

/// Identifier of an authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The catalog sends `""` for unknown release dates
fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// A movie as returned by catalog list and search endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Average rating on a 0-10 scale
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
}

impl Movie {
    pub fn poster_url(&self) -> Option<String> {
        self.poster_path.as_deref().map(poster_url)
    }

    /// Year portion of the release date, if known
    pub fn release_year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .and_then(|d| d.split('-').next())
            .filter(|y| !y.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionCompany {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub logo_path: Option<String>,
    #[serde(default)]
    pub origin_country: Option<String>,
}

/// A movie with the extended fields only the detail endpoint returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub budget: u64,
    #[serde(default)]
    pub revenue: u64,
    #[serde(default)]
    pub production_companies: Vec<ProductionCompany>,
}

impl MovieDetails {
    pub fn budget_millions(&self) -> f64 {
        self.budget as f64 / 1_000_000.0
    }

    pub fn revenue_millions(&self) -> u64 {
        (self.revenue as f64 / 1_000_000.0).round() as u64
    }

    /// Genre names joined for display, `None` when the list is empty
    pub fn genre_names(&self) -> Option<String> {
        join_names(self.genres.iter().map(|g| g.name.as_str()))
    }

    pub fn company_names(&self) -> Option<String> {
        join_names(self.production_companies.iter().map(|c| c.name.as_str()))
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> Option<String> {
    let joined = names.collect::<Vec<_>>().join(" • ");
    if joined.is_empty() { None } else { Some(joined) }
}

/// A row of the search metrics table, read back as the trending list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingMovie {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "searchTerm")]
    pub search_term: String,
    pub movie_id: MovieId,
    pub title: String,
    #[serde(default)]
    pub poster_url: Option<String>,
    pub count: u64,
}

impl TrendingMovie {
    /// First metrics row for a search term, attributed to `movie`
    pub fn first_search(term: &str, movie: &Movie) -> Self {
        Self {
            id: None,
            search_term: term.to_string(),
            movie_id: movie.id,
            title: movie.title.clone(),
            poster_url: movie.poster_url(),
            count: 1,
        }
    }
}

/// Display fields copied into a saved-movie record at save time
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MovieSnapshot {
    pub title: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    pub release_date: Option<String>,
}

impl From<&Movie> for MovieSnapshot {
    fn from(movie: &Movie) -> Self {
        Self {
            title: Some(movie.title.clone()).filter(|t| !t.is_empty()),
            poster_path: movie.poster_path.clone(),
            vote_average: Some(movie.vote_average),
            release_date: movie.release_date.clone(),
        }
    }
}

impl From<&MovieDetails> for MovieSnapshot {
    fn from(details: &MovieDetails) -> Self {
        MovieSnapshot::from(&details.movie)
    }
}

/// The "movie saved by user" relation, with denormalized display fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedMovie {
    pub id: String,
    pub movie_id: MovieId,
    pub user_id: UserId,
    pub title: String,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    pub release_date: String,
    pub created_at: Timestamp,
}

impl SavedMovie {
    /// Build a new record with a fresh identifier
    pub fn new(id: String, movie_id: MovieId, user_id: UserId, snapshot: &MovieSnapshot) -> Self {
        Self {
            id,
            movie_id,
            user_id,
            title: snapshot
                .title
                .clone()
                .unwrap_or_else(|| "Unknown Title".to_string()),
            poster_url: snapshot.poster_path.as_deref().map(poster_url),
            vote_average: snapshot.vote_average.unwrap_or(0.0),
            release_date: snapshot
                .release_date
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
            created_at: Timestamp::now(),
        }
    }
}

/// A user comment on a movie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub movie_id: MovieId,
    pub user_id: UserId,
    #[serde(rename = "userName", default)]
    pub author_name: Option<String>,
    #[serde(rename = "comment")]
    pub body: String,
    pub created_at: Timestamp,
}

impl Comment {
    pub fn author_display(&self) -> &str {
        self.author_name.as_deref().unwrap_or("Unknown User")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Editable profile fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub phone: String,
    pub bio: String,
}
