//! Sign-in, sign-up and sign-out flows.
//!
//! Input is validated locally before anything reaches the identity provider.
//! A successful sign-in writes the user id to the identity store and sign-out
//! removes it.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::{ReelError, Result};
use crate::identity::{IdentityContext, IdentityStore};
use crate::remote::{AuthClient, DataClient, Lookup};
use crate::types::{UserId, UserProfile};

const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.-]+@([A-Za-z0-9_-]+\.)+[A-Za-z0-9_-]{2,4}$")
        .expect("email regex should be valid")
});

pub fn validate_email(email: &str) -> Result<()> {
    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(ReelError::Validation("invalid email format".to_string()))
    }
}

/// At least 8 characters with one uppercase letter and one special character
pub fn validate_password(password: &str) -> Result<()> {
    let long_enough = password.chars().count() >= MIN_PASSWORD_LEN;
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_special = password.chars().any(|c| !c.is_ascii_alphanumeric());

    if long_enough && has_upper && has_special {
        Ok(())
    } else {
        Err(ReelError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters long and include an uppercase letter and a special character"
        )))
    }
}

/// Registration input
#[derive(Debug, Clone, Default)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignUpForm {
    pub fn validate(&self) -> Result<()> {
        let missing = [
            &self.name,
            &self.email,
            &self.password,
            &self.confirm_password,
        ]
        .iter()
        .any(|field| field.trim().is_empty());
        if missing {
            return Err(ReelError::Validation(
                "please fill in all the required fields".to_string(),
            ));
        }

        validate_email(&self.email)?;
        validate_password(&self.password)?;

        if self.password != self.confirm_password {
            return Err(ReelError::Validation(
                "password and confirmation do not match".to_string(),
            ));
        }
        Ok(())
    }
}

pub struct Session {
    auth: Arc<dyn AuthClient>,
    data: Arc<dyn DataClient>,
    store: Arc<dyn IdentityStore>,
}

impl Session {
    pub fn new(
        auth: Arc<dyn AuthClient>,
        data: Arc<dyn DataClient>,
        store: Arc<dyn IdentityStore>,
    ) -> Self {
        Self { auth, data, store }
    }

    /// Identity currently persisted in the store
    pub async fn current(&self) -> Result<IdentityContext> {
        IdentityContext::load(self.store.as_ref()).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<IdentityContext> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ReelError::Validation(
                "please enter your email and password".to_string(),
            ));
        }
        validate_email(email)?;

        let user_id = self.auth.sign_in(email, password).await?;
        self.store.set(&user_id).await?;
        tracing::info!(user_id = %user_id, "signed in");
        Ok(IdentityContext::signed_in(user_id))
    }

    /// Register an account and its profile row.
    ///
    /// The new user still has to log in afterwards.
    pub async fn sign_up(&self, form: &SignUpForm) -> Result<UserId> {
        form.validate()?;

        match self.data.find_profile_by_email(&form.email).await {
            Lookup::Found(_) => return Err(ReelError::AlreadyRegistered(form.email.clone())),
            Lookup::NotFound => {}
            Lookup::Failed(e) => return Err(e),
        }

        let user_id = self.auth.sign_up(&form.email, &form.password).await?;
        self.data
            .insert_profile(&UserProfile {
                user_id: user_id.clone(),
                name: form.name.trim().to_string(),
                phone: None,
                email: Some(form.email.clone()),
                bio: None,
            })
            .await?;

        tracing::info!(user_id = %user_id, "account registered");
        Ok(user_id)
    }

    /// Sign out remotely, then forget the local identity.
    ///
    /// If the remote sign-out fails the local identity is kept.
    pub async fn logout(&self) -> Result<()> {
        self.auth.sign_out().await?;
        self.store.clear().await?;
        tracing::info!("signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MemoryIdentityStore;
    use crate::remote::MemoryBackend;
    use crate::remote::memory::{BackendCall, FailureMode};

    fn form() -> SignUpForm {
        SignUpForm {
            name: "Ann".to_string(),
            email: "ann@example.com".to_string(),
            password: "Secret!123".to_string(),
            confirm_password: "Secret!123".to_string(),
        }
    }

    fn session() -> (Arc<MemoryBackend>, Arc<MemoryIdentityStore>, Session) {
        let backend = Arc::new(MemoryBackend::new());
        let store = Arc::new(MemoryIdentityStore::new());
        let session = Session::new(backend.clone(), backend.clone(), store.clone());
        (backend, store, session)
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ann@example.com").is_ok());
        assert!(validate_email("a.b-c@mail.co.uk").is_ok());
        assert!(validate_email("ann@example").is_err());
        assert!(validate_email("ann example.com").is_err());
        assert!(validate_email("ann@example.museum").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Secret!123").is_ok());
        assert!(validate_password("Secret_12").is_ok());
        assert!(validate_password("Sh0rt!").is_err());
        assert!(validate_password("nouppercase!").is_err());
        assert!(validate_password("NoSpecial123").is_err());
    }

    #[test]
    fn test_form_validation_order() {
        let mut missing = form();
        missing.name = "  ".to_string();
        assert!(matches!(missing.validate(), Err(ReelError::Validation(m)) if m.contains("required")));

        let mut mismatch = form();
        mismatch.confirm_password = "Secret!124".to_string();
        assert!(matches!(mismatch.validate(), Err(ReelError::Validation(m)) if m.contains("match")));

        assert!(form().validate().is_ok());
    }

    #[tokio::test]
    async fn test_sign_up_creates_profile_then_login_persists_identity() {
        let (backend, store, session) = session();

        let user_id = session.sign_up(&form()).await.unwrap();
        let profiles = backend.profile_rows();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].user_id, user_id);
        assert_eq!(store.get().await.unwrap(), None);

        let identity = session.login("ann@example.com", "Secret!123").await.unwrap();
        assert_eq!(identity.user(), Some(&user_id));
        assert_eq!(store.get().await.unwrap(), Some(user_id));
    }

    #[tokio::test]
    async fn test_sign_up_rejects_registered_email() {
        let (backend, _, session) = session();
        session.sign_up(&form()).await.unwrap();
        backend.clear_calls();

        let err = session.sign_up(&form()).await.unwrap_err();
        assert!(matches!(err, ReelError::AlreadyRegistered(_)));
        assert_eq!(
            backend.calls(),
            vec![BackendCall::FindProfileByEmail {
                email: "ann@example.com".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_login_validates_before_network() {
        let (backend, _, session) = session();
        assert!(session.login("", "x").await.is_err());
        assert!(session.login("not-an-email", "x").await.is_err());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_logout_clears_identity() {
        let (_, store, session) = session();
        store.set(&UserId::new("u1")).await.unwrap();

        session.logout().await.unwrap();
        assert_eq!(session.current().await.unwrap(), IdentityContext::anonymous());
    }

    #[tokio::test]
    async fn test_failed_logout_keeps_identity() {
        let (backend, store, session) = session();
        store.set(&UserId::new("u1")).await.unwrap();
        backend.set_failure(FailureMode::All);

        assert!(session.logout().await.is_err());
        assert_eq!(store.get().await.unwrap(), Some(UserId::new("u1")));
    }
}
