//! Saved-movie state for a single movie, plus the per-user saved list.
//!
//! Toggles are pessimistic: the local flag only moves after the data service
//! confirms the write.

use std::sync::Arc;

use crate::error::Result;
use crate::identity::IdentityContext;
use crate::remote::{DataClient, Lookup};
use crate::types::{MovieId, MovieSnapshot, SavedMovie, UserId};
use crate::utils::generate_uuid;

/// Saved flag of one movie for the current user
pub struct SavedItemSync {
    data: Arc<dyn DataClient>,
    movie_id: MovieId,
    saved: bool,
}

impl SavedItemSync {
    pub fn new(data: Arc<dyn DataClient>, movie_id: MovieId) -> Self {
        Self {
            data,
            movie_id,
            saved: false,
        }
    }

    pub fn movie_id(&self) -> MovieId {
        self.movie_id
    }

    /// Last confirmed saved flag
    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// Re-read the saved flag from the data service.
    ///
    /// Without a signed-in user the movie is simply not saved. A failed
    /// lookup leaves the flag as it was.
    pub async fn refresh(&mut self, identity: &IdentityContext) -> Result<bool> {
        let Some(user_id) = identity.user() else {
            self.saved = false;
            return Ok(false);
        };

        self.saved = match self.data.find_saved(self.movie_id, user_id).await {
            Lookup::Found(_) => true,
            Lookup::NotFound => false,
            Lookup::Failed(e) => {
                tracing::debug!(movie_id = %self.movie_id, error = %e, "saved lookup failed");
                return Err(e);
            }
        };
        Ok(self.saved)
    }

    /// Flip the saved state and return the new flag.
    ///
    /// Saving inserts a fresh record carrying `snapshot`; unsaving deletes
    /// every record for this movie and user.
    pub async fn toggle(
        &mut self,
        identity: &IdentityContext,
        snapshot: &MovieSnapshot,
    ) -> Result<bool> {
        let user_id = identity.require_user()?;

        if self.saved {
            self.data.delete_saved(self.movie_id, user_id).await?;
            tracing::debug!(movie_id = %self.movie_id, "movie unsaved");
        } else {
            let record = SavedMovie::new(generate_uuid(), self.movie_id, user_id.clone(), snapshot);
            self.data.insert_saved(&record).await?;
            tracing::debug!(movie_id = %self.movie_id, id = %record.id, "movie saved");
        }

        self.saved = !self.saved;
        Ok(self.saved)
    }
}

/// Read side of a user's saved movies
#[derive(Clone)]
pub struct SavedLibrary {
    data: Arc<dyn DataClient>,
}

impl SavedLibrary {
    pub fn new(data: Arc<dyn DataClient>) -> Self {
        Self { data }
    }

    /// Saved movies, most recently saved first
    pub async fn saved_movies(&self, user_id: &UserId) -> Result<Vec<SavedMovie>> {
        self.data.list_saved(user_id).await
    }

    pub async fn count_saved(&self, user_id: &UserId) -> Result<u64> {
        self.data.count_saved(user_id).await
    }
}
