//! User profile reads and edits.

use std::sync::Arc;

use crate::error::{ReelError, Result};
use crate::remote::{DataClient, Lookup};
use crate::types::{ProfileUpdate, UserId, UserProfile};

/// Profile plus the number of movies the user has saved
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSummary {
    pub profile: UserProfile,
    pub saved_count: u64,
}

#[derive(Clone)]
pub struct Profiles {
    data: Arc<dyn DataClient>,
}

impl Profiles {
    pub fn new(data: Arc<dyn DataClient>) -> Self {
        Self { data }
    }

    pub async fn profile(&self, user_id: &UserId) -> Result<UserProfile> {
        match self.data.find_profile(user_id).await {
            Lookup::Found(profile) => Ok(profile),
            Lookup::NotFound => Err(ReelError::ProfileNotFound(user_id.to_string())),
            Lookup::Failed(e) => Err(e),
        }
    }

    /// Profile screen data: the profile row and the saved-movie count
    pub async fn summary(&self, user_id: &UserId) -> Result<ProfileSummary> {
        let (profile, saved_count) = tokio::try_join!(
            self.profile(user_id),
            self.data.count_saved(user_id)
        )?;
        Ok(ProfileSummary {
            profile,
            saved_count,
        })
    }

    pub async fn update_profile(&self, user_id: &UserId, update: &ProfileUpdate) -> Result<()> {
        let update = ProfileUpdate {
            name: update.name.trim().to_string(),
            phone: update.phone.trim().to_string(),
            bio: update.bio.trim().to_string(),
        };
        if update.name.is_empty() {
            return Err(ReelError::Validation("name cannot be empty".to_string()));
        }
        self.data.update_profile(user_id, &update).await
    }

    /// Display name attached to new comments; `None` when the user has no
    /// profile row
    pub async fn author_name(&self, user_id: &UserId) -> Result<Option<String>> {
        Ok(self
            .data
            .find_profile(user_id)
            .await
            .into_result()?
            .map(|profile| profile.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryBackend;

    fn profile(user: &str, name: &str) -> UserProfile {
        UserProfile {
            user_id: UserId::new(user),
            name: name.to_string(),
            phone: None,
            email: Some(format!("{user}@example.com")),
            bio: None,
        }
    }

    #[tokio::test]
    async fn test_missing_profile() {
        let profiles = Profiles::new(Arc::new(MemoryBackend::new()));
        let err = profiles.profile(&UserId::new("ghost")).await.unwrap_err();
        assert!(matches!(err, ReelError::ProfileNotFound(_)));
        assert_eq!(
            profiles.author_name(&UserId::new("ghost")).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_update_and_summary() {
        let backend = Arc::new(MemoryBackend::new());
        backend.add_profile(profile("u1", "Ann"));
        let profiles = Profiles::new(backend);
        let user = UserId::new("u1");

        profiles
            .update_profile(
                &user,
                &ProfileUpdate {
                    name: " Ann Lee ".to_string(),
                    phone: "555".to_string(),
                    bio: "Film buff".to_string(),
                },
            )
            .await
            .unwrap();

        let summary = profiles.summary(&user).await.unwrap();
        assert_eq!(summary.profile.name, "Ann Lee");
        assert_eq!(summary.profile.bio.as_deref(), Some("Film buff"));
        assert_eq!(summary.saved_count, 0);
        assert_eq!(
            profiles.author_name(&user).await.unwrap().as_deref(),
            Some("Ann Lee")
        );
    }

    #[tokio::test]
    async fn test_update_rejects_blank_name() {
        let backend = Arc::new(MemoryBackend::new());
        let profiles = Profiles::new(backend.clone());
        let result = profiles
            .update_profile(&UserId::new("u1"), &ProfileUpdate::default())
            .await;
        assert!(matches!(result, Err(ReelError::Validation(_))));
        assert!(backend.calls().is_empty());
    }
}
