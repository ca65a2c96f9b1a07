//! Remote clients for the movie catalog and the structured-data service.
//!
//! The synchronizers only talk to the traits defined here. Concrete
//! implementations live in submodules:
//! - [`catalog::TmdbCatalog`] for the read-only movie catalog
//! - [`postgrest::PostgrestClient`] for the data service and its auth endpoints
//! - [`memory::MemoryBackend`] for tests and local development

pub mod catalog;
pub mod error;
pub mod memory;
pub mod postgrest;

use async_trait::async_trait;

use crate::error::{ReelError, Result};
use crate::types::{
    Comment, Movie, MovieDetails, MovieId, ProfileUpdate, SavedMovie, TrendingMovie, UserId,
    UserProfile,
};

pub use catalog::TmdbCatalog;
pub use error::ApiError;
pub use memory::MemoryBackend;
pub use postgrest::PostgrestClient;

/// Outcome of a point lookup against the data service.
///
/// "No matching row" is a normal answer, distinct from a failure, so callers
/// never have to inspect backend error codes themselves.
#[derive(Debug)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    Failed(ReelError),
}

impl<T> Lookup<T> {
    /// Collapse into a `Result`, treating `NotFound` as `Ok(None)`
    pub fn into_result(self) -> Result<Option<T>> {
        match self {
            Lookup::Found(value) => Ok(Some(value)),
            Lookup::NotFound => Ok(None),
            Lookup::Failed(err) => Err(err),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::NotFound => Lookup::NotFound,
            Lookup::Failed(err) => Lookup::Failed(err),
        }
    }
}

/// One page of catalog results
#[derive(Debug, Clone, PartialEq)]
pub struct MoviePage {
    pub page: u32,
    pub total_pages: u32,
    pub results: Vec<Movie>,
}

/// Read-only movie catalog
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Search movies by free text
    async fn search_movies(&self, query: &str, page: u32) -> Result<MoviePage>;

    /// Popular movies, used when there is no query
    async fn discover_movies(&self, page: u32) -> Result<MoviePage>;

    /// Full details for a single movie
    async fn movie_details(&self, id: MovieId) -> Result<MovieDetails>;
}

/// Structured-data service holding saved movies, comments, metrics and profiles
#[async_trait]
pub trait DataClient: Send + Sync {
    async fn find_saved(&self, movie_id: MovieId, user_id: &UserId) -> Lookup<SavedMovie>;
    async fn insert_saved(&self, saved: &SavedMovie) -> Result<()>;
    /// Delete every saved record matching (movie, user)
    async fn delete_saved(&self, movie_id: MovieId, user_id: &UserId) -> Result<()>;
    async fn list_saved(&self, user_id: &UserId) -> Result<Vec<SavedMovie>>;
    async fn count_saved(&self, user_id: &UserId) -> Result<u64>;

    /// Comments for a movie, newest first
    async fn list_comments(&self, movie_id: MovieId) -> Result<Vec<Comment>>;
    async fn insert_comment(&self, comment: &Comment) -> Result<()>;
    async fn update_comment(&self, comment_id: &str, body: &str) -> Result<()>;
    async fn delete_comment(&self, comment_id: &str) -> Result<()>;

    async fn find_metric(&self, search_term: &str) -> Lookup<TrendingMovie>;
    async fn insert_metric(&self, metric: &TrendingMovie) -> Result<()>;
    async fn update_metric_count(&self, search_term: &str, count: u64) -> Result<()>;
    /// Metrics rows ordered by count, highest first
    async fn top_metrics(&self, limit: usize) -> Result<Vec<TrendingMovie>>;

    async fn find_profile(&self, user_id: &UserId) -> Lookup<UserProfile>;
    async fn find_profile_by_email(&self, email: &str) -> Lookup<UserProfile>;
    async fn insert_profile(&self, profile: &UserProfile) -> Result<()>;
    async fn update_profile(&self, user_id: &UserId, update: &ProfileUpdate) -> Result<()>;
}

/// Identity provider used by the session flows
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Sign in with email and password, returning the user id
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserId>;

    /// Register a new account, returning the new user id
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserId>;

    async fn sign_out(&self) -> Result<()>;
}
