//! In-process backend implementing every remote trait.
//!
//! Behaves like the PostgREST service for the operations the synchronizers
//! use (filters, ordering, "no rows" lookups, zero-row updates succeed) and
//! records each call so tests can assert on exactly what reached the backend.
//! Failures and per-query catalog latency can be injected.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{ReelError, Result};
use crate::types::{
    Comment, Movie, MovieDetails, MovieId, ProfileUpdate, SavedMovie, TrendingMovie, UserId,
    UserProfile,
};
use crate::utils::generate_uuid;

use super::{AuthClient, CatalogClient, DataClient, Lookup, MoviePage};

/// Catalog page size, matching the real catalog
pub const PAGE_SIZE: usize = 20;

/// A call that reached the backend
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    FindSaved { movie_id: MovieId, user_id: UserId },
    InsertSaved { id: String, movie_id: MovieId, user_id: UserId },
    DeleteSaved { movie_id: MovieId, user_id: UserId },
    ListSaved { user_id: UserId },
    CountSaved { user_id: UserId },
    ListComments { movie_id: MovieId },
    InsertComment { id: String },
    UpdateComment { id: String, body: String },
    DeleteComment { id: String },
    FindMetric { term: String },
    InsertMetric { term: String, movie_id: MovieId },
    UpdateMetric { term: String, count: u64 },
    TopMetrics { limit: usize },
    FindProfile { user_id: UserId },
    FindProfileByEmail { email: String },
    InsertProfile { user_id: UserId },
    UpdateProfile { user_id: UserId },
    SignIn { email: String },
    SignUp { email: String },
    SignOut,
    SearchMovies { query: String, page: u32 },
    DiscoverMovies { page: u32 },
    MovieDetails { id: MovieId },
}

impl BackendCall {
    /// True for calls that change backend state
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            BackendCall::InsertSaved { .. }
                | BackendCall::DeleteSaved { .. }
                | BackendCall::InsertComment { .. }
                | BackendCall::UpdateComment { .. }
                | BackendCall::DeleteComment { .. }
                | BackendCall::InsertMetric { .. }
                | BackendCall::UpdateMetric { .. }
                | BackendCall::InsertProfile { .. }
                | BackendCall::UpdateProfile { .. }
        )
    }
}

/// Which calls should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    #[default]
    None,
    /// Writes fail, reads succeed
    Writes,
    /// Every call fails
    All,
}

#[derive(Default)]
struct State {
    movies: Vec<MovieDetails>,
    saved: Vec<SavedMovie>,
    comments: Vec<Comment>,
    metrics: Vec<TrendingMovie>,
    profiles: Vec<UserProfile>,
    /// email -> (password, user id)
    accounts: HashMap<String, (String, UserId)>,
    signed_in: bool,
    failure: FailureMode,
    query_delays: HashMap<String, Duration>,
    calls: Vec<BackendCall>,
}

/// In-memory backend
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the catalog
    pub fn with_movies(self, movies: impl IntoIterator<Item = MovieDetails>) -> Self {
        self.state.lock().movies.extend(movies);
        self
    }

    pub fn add_comment(&self, comment: Comment) {
        self.state.lock().comments.push(comment);
    }

    pub fn add_saved(&self, saved: SavedMovie) {
        self.state.lock().saved.push(saved);
    }

    pub fn add_metric(&self, metric: TrendingMovie) {
        self.state.lock().metrics.push(metric);
    }

    pub fn add_profile(&self, profile: UserProfile) {
        self.state.lock().profiles.push(profile);
    }

    pub fn set_failure(&self, mode: FailureMode) {
        self.state.lock().failure = mode;
    }

    /// Delay catalog searches for one query
    pub fn set_query_delay(&self, query: &str, delay: Duration) {
        self.state.lock().query_delays.insert(query.to_string(), delay);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn saved_rows(&self) -> Vec<SavedMovie> {
        self.state.lock().saved.clone()
    }

    pub fn comment_rows(&self) -> Vec<Comment> {
        self.state.lock().comments.clone()
    }

    pub fn metric_rows(&self) -> Vec<TrendingMovie> {
        self.state.lock().metrics.clone()
    }

    pub fn profile_rows(&self) -> Vec<UserProfile> {
        self.state.lock().profiles.clone()
    }

    /// Record a call and report whether it must fail
    fn record(&self, call: BackendCall) -> Result<()> {
        let mut state = self.state.lock();
        let fails = match state.failure {
            FailureMode::None => false,
            FailureMode::Writes => call.is_write(),
            FailureMode::All => true,
        };
        state.calls.push(call);
        if fails {
            return Err(ReelError::Api("data API error (503): injected failure".to_string()));
        }
        Ok(())
    }

    fn page_of(movies: Vec<Movie>, page: u32) -> MoviePage {
        let page = page.max(1);
        let total_pages = movies.len().div_ceil(PAGE_SIZE) as u32;
        let results = movies
            .into_iter()
            .skip((page as usize - 1) * PAGE_SIZE)
            .take(PAGE_SIZE)
            .collect();
        MoviePage {
            page,
            total_pages,
            results,
        }
    }
}

#[async_trait]
impl CatalogClient for MemoryBackend {
    async fn search_movies(&self, query: &str, page: u32) -> Result<MoviePage> {
        self.record(BackendCall::SearchMovies {
            query: query.to_string(),
            page,
        })?;

        let delay = self.state.lock().query_delays.get(query).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let needle = query.to_lowercase();
        let matches: Vec<Movie> = self
            .state
            .lock()
            .movies
            .iter()
            .filter(|m| m.movie.title.to_lowercase().contains(&needle))
            .map(|m| m.movie.clone())
            .collect();
        Ok(Self::page_of(matches, page))
    }

    async fn discover_movies(&self, page: u32) -> Result<MoviePage> {
        self.record(BackendCall::DiscoverMovies { page })?;

        let movies: Vec<Movie> = self
            .state
            .lock()
            .movies
            .iter()
            .map(|m| m.movie.clone())
            .collect();
        Ok(Self::page_of(movies, page))
    }

    async fn movie_details(&self, id: MovieId) -> Result<MovieDetails> {
        self.record(BackendCall::MovieDetails { id })?;

        self.state
            .lock()
            .movies
            .iter()
            .find(|m| m.movie.id == id)
            .cloned()
            .ok_or_else(|| ReelError::MovieNotFound(id.to_string()))
    }
}

#[async_trait]
impl DataClient for MemoryBackend {
    async fn find_saved(&self, movie_id: MovieId, user_id: &UserId) -> Lookup<SavedMovie> {
        if let Err(e) = self.record(BackendCall::FindSaved {
            movie_id,
            user_id: user_id.clone(),
        }) {
            return Lookup::Failed(e);
        }

        match self
            .state
            .lock()
            .saved
            .iter()
            .find(|s| s.movie_id == movie_id && &s.user_id == user_id)
        {
            Some(saved) => Lookup::Found(saved.clone()),
            None => Lookup::NotFound,
        }
    }

    async fn insert_saved(&self, saved: &SavedMovie) -> Result<()> {
        self.record(BackendCall::InsertSaved {
            id: saved.id.clone(),
            movie_id: saved.movie_id,
            user_id: saved.user_id.clone(),
        })?;
        self.state.lock().saved.push(saved.clone());
        Ok(())
    }

    async fn delete_saved(&self, movie_id: MovieId, user_id: &UserId) -> Result<()> {
        self.record(BackendCall::DeleteSaved {
            movie_id,
            user_id: user_id.clone(),
        })?;
        self.state
            .lock()
            .saved
            .retain(|s| !(s.movie_id == movie_id && &s.user_id == user_id));
        Ok(())
    }

    async fn list_saved(&self, user_id: &UserId) -> Result<Vec<SavedMovie>> {
        self.record(BackendCall::ListSaved {
            user_id: user_id.clone(),
        })?;
        let mut rows: Vec<SavedMovie> = self
            .state
            .lock()
            .saved
            .iter()
            .filter(|s| &s.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn count_saved(&self, user_id: &UserId) -> Result<u64> {
        self.record(BackendCall::CountSaved {
            user_id: user_id.clone(),
        })?;
        Ok(self
            .state
            .lock()
            .saved
            .iter()
            .filter(|s| &s.user_id == user_id)
            .count() as u64)
    }

    async fn list_comments(&self, movie_id: MovieId) -> Result<Vec<Comment>> {
        self.record(BackendCall::ListComments { movie_id })?;
        let mut rows: Vec<Comment> = self
            .state
            .lock()
            .comments
            .iter()
            .filter(|c| c.movie_id == movie_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        self.record(BackendCall::InsertComment {
            id: comment.id.clone(),
        })?;
        self.state.lock().comments.push(comment.clone());
        Ok(())
    }

    async fn update_comment(&self, comment_id: &str, body: &str) -> Result<()> {
        self.record(BackendCall::UpdateComment {
            id: comment_id.to_string(),
            body: body.to_string(),
        })?;
        if let Some(comment) = self
            .state
            .lock()
            .comments
            .iter_mut()
            .find(|c| c.id == comment_id)
        {
            comment.body = body.to_string();
        }
        Ok(())
    }

    async fn delete_comment(&self, comment_id: &str) -> Result<()> {
        self.record(BackendCall::DeleteComment {
            id: comment_id.to_string(),
        })?;
        self.state.lock().comments.retain(|c| c.id != comment_id);
        Ok(())
    }

    async fn find_metric(&self, search_term: &str) -> Lookup<TrendingMovie> {
        if let Err(e) = self.record(BackendCall::FindMetric {
            term: search_term.to_string(),
        }) {
            return Lookup::Failed(e);
        }
        match self
            .state
            .lock()
            .metrics
            .iter()
            .find(|m| m.search_term == search_term)
        {
            Some(metric) => Lookup::Found(metric.clone()),
            None => Lookup::NotFound,
        }
    }

    async fn insert_metric(&self, metric: &TrendingMovie) -> Result<()> {
        self.record(BackendCall::InsertMetric {
            term: metric.search_term.clone(),
            movie_id: metric.movie_id,
        })?;
        let mut state = self.state.lock();
        let mut row = metric.clone();
        row.id = Some(state.metrics.len() as i64 + 1);
        state.metrics.push(row);
        Ok(())
    }

    async fn update_metric_count(&self, search_term: &str, count: u64) -> Result<()> {
        self.record(BackendCall::UpdateMetric {
            term: search_term.to_string(),
            count,
        })?;
        for metric in self
            .state
            .lock()
            .metrics
            .iter_mut()
            .filter(|m| m.search_term == search_term)
        {
            metric.count = count;
        }
        Ok(())
    }

    async fn top_metrics(&self, limit: usize) -> Result<Vec<TrendingMovie>> {
        self.record(BackendCall::TopMetrics { limit })?;
        let mut rows = self.state.lock().metrics.clone();
        rows.sort_by(|a, b| b.count.cmp(&a.count));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn find_profile(&self, user_id: &UserId) -> Lookup<UserProfile> {
        if let Err(e) = self.record(BackendCall::FindProfile {
            user_id: user_id.clone(),
        }) {
            return Lookup::Failed(e);
        }
        match self
            .state
            .lock()
            .profiles
            .iter()
            .find(|p| &p.user_id == user_id)
        {
            Some(profile) => Lookup::Found(profile.clone()),
            None => Lookup::NotFound,
        }
    }

    async fn find_profile_by_email(&self, email: &str) -> Lookup<UserProfile> {
        if let Err(e) = self.record(BackendCall::FindProfileByEmail {
            email: email.to_string(),
        }) {
            return Lookup::Failed(e);
        }
        match self
            .state
            .lock()
            .profiles
            .iter()
            .find(|p| p.email.as_deref() == Some(email))
        {
            Some(profile) => Lookup::Found(profile.clone()),
            None => Lookup::NotFound,
        }
    }

    async fn insert_profile(&self, profile: &UserProfile) -> Result<()> {
        self.record(BackendCall::InsertProfile {
            user_id: profile.user_id.clone(),
        })?;
        self.state.lock().profiles.push(profile.clone());
        Ok(())
    }

    async fn update_profile(&self, user_id: &UserId, update: &ProfileUpdate) -> Result<()> {
        self.record(BackendCall::UpdateProfile {
            user_id: user_id.clone(),
        })?;
        if let Some(profile) = self
            .state
            .lock()
            .profiles
            .iter_mut()
            .find(|p| &p.user_id == user_id)
        {
            profile.name = update.name.clone();
            profile.phone = Some(update.phone.clone());
            profile.bio = Some(update.bio.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl AuthClient for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserId> {
        self.record(BackendCall::SignIn {
            email: email.to_string(),
        })?;
        let mut state = self.state.lock();
        let user_id = match state.accounts.get(email) {
            Some((stored, user_id)) if stored == password => user_id.clone(),
            _ => return Err(ReelError::Auth("Invalid login credentials".to_string())),
        };
        state.signed_in = true;
        Ok(user_id)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<UserId> {
        self.record(BackendCall::SignUp {
            email: email.to_string(),
        })?;
        let mut state = self.state.lock();
        if state.accounts.contains_key(email) {
            return Err(ReelError::Auth("User already registered".to_string()));
        }
        let user_id = UserId::new(generate_uuid());
        state
            .accounts
            .insert(email.to_string(), (password.to_string(), user_id.clone()));
        Ok(user_id)
    }

    async fn sign_out(&self) -> Result<()> {
        self.record(BackendCall::SignOut)?;
        self.state.lock().signed_in = false;
        Ok(())
    }
}
