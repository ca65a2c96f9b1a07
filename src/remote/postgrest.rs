//! Data service client for a PostgREST backend with GoTrue auth (Supabase layout).
//!
//! Tables live under `/rest/v1/<table>` and are filtered with PostgREST
//! operators (`movie_id=eq.27205`). Point lookups request the single-object
//! media type so the backend answers "no rows" with
//! [`NO_ROWS_CODE`](super::error::NO_ROWS_CODE), which is
//! mapped to [`Lookup::NotFound`] here and nowhere else.
//!
//! Every request carries the project `apikey` header. The bearer token is the
//! signed-in user's access token when there is one, the anon key otherwise.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, Method, RequestBuilder, Response, header};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::Config;
use crate::error::{ReelError, Result};
use crate::types::{
    Comment, MovieId, ProfileUpdate, SavedMovie, TrendingMovie, UserId, UserProfile,
};

use super::{ApiError, AuthClient, DataClient, Lookup};

const PROVIDER: &str = "data";
const AUTH_PROVIDER: &str = "auth";

const SAVED_TABLE: &str = "savedMovie";
const COMMENT_TABLE: &str = "comment";
const METRICS_TABLE: &str = "metrics";
const USER_TABLE: &str = "User";

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Filter or modifier pairs appended to a table URL
type Params = Vec<(&'static str, String)>;

fn eq(value: impl ToString) -> String {
    format!("eq.{}", value.to_string())
}

/// Data service client
pub struct PostgrestClient {
    client: Client,
    base_url: Url,
    api_key: SecretString,
    access_token: RwLock<Option<SecretString>>,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<AuthUser>,
    /// Sign-up without a session returns the user at the top level
    #[serde(default)]
    id: Option<String>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct BodyPatch<'a> {
    comment: &'a str,
}

#[derive(Serialize)]
struct CountPatch {
    count: u64,
}

impl PostgrestClient {
    /// Create a client from configuration
    ///
    /// Configures the HTTP client with a 10s connect timeout and the
    /// configured total timeout.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.backend_url()?,
            config.backend_key()?,
            config.remote_timeout(),
        )
    }

    pub fn new(base_url: &str, api_key: SecretString, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };

        Ok(Self {
            client,
            base_url: Url::parse(&normalized)?,
            api_key,
            access_token: RwLock::new(None),
        })
    }

    pub fn is_signed_in(&self) -> bool {
        self.access_token.read().is_some()
    }

    fn table_url(&self, table: &str, params: &[(&'static str, String)]) -> Result<Url> {
        let mut url = self.base_url.join(&format!("rest/v1/{table}"))?;
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    fn auth_url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(&format!("auth/v1/{path}"))?)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self
            .access_token
            .read()
            .as_ref()
            .map(|t| t.expose_secret().to_string())
            .unwrap_or_else(|| self.api_key.expose_secret().to_string());

        self.client
            .request(method, url)
            .header("apikey", self.api_key.expose_secret())
            .bearer_auth(bearer)
    }

    async fn send(&self, builder: RequestBuilder, provider: &'static str) -> Result<Response> {
        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response(response, provider).await.into());
        }
        Ok(response)
    }

    async fn select_one<T: DeserializeOwned>(&self, table: &str, params: Params) -> Lookup<T> {
        tracing::debug!(table, "point select");

        let url = match self.table_url(table, &params) {
            Ok(url) => url,
            Err(e) => return Lookup::Failed(e),
        };
        let response = match self
            .request(Method::GET, url)
            .header(header::ACCEPT, SINGLE_OBJECT)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Lookup::Failed(e.into()),
        };

        if !response.status().is_success() {
            let error = ApiError::from_response(response, PROVIDER).await;
            if error.is_no_rows() {
                return Lookup::NotFound;
            }
            return Lookup::Failed(error.into());
        }

        match response.json().await {
            Ok(row) => Lookup::Found(row),
            Err(e) => Lookup::Failed(e.into()),
        }
    }

    async fn select_many<T: DeserializeOwned>(&self, table: &str, params: Params) -> Result<Vec<T>> {
        tracing::debug!(table, "select");

        let url = self.table_url(table, &params)?;
        let response = self
            .send(
                self.request(Method::GET, url)
                    .header(header::ACCEPT, "application/json"),
                PROVIDER,
            )
            .await?;
        Ok(response.json().await?)
    }

    async fn insert<T: Serialize + ?Sized>(&self, table: &str, row: &T) -> Result<()> {
        tracing::debug!(table, "insert");

        let url = self.table_url(table, &[])?;
        self.send(
            self.request(Method::POST, url)
                .header("Prefer", "return=minimal")
                .json(&[row]),
            PROVIDER,
        )
        .await?;
        Ok(())
    }

    async fn update<T: Serialize>(&self, table: &str, params: Params, patch: &T) -> Result<()> {
        tracing::debug!(table, "update");

        let url = self.table_url(table, &params)?;
        self.send(
            self.request(Method::PATCH, url)
                .header("Prefer", "return=minimal")
                .json(patch),
            PROVIDER,
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, table: &str, params: Params) -> Result<()> {
        tracing::debug!(table, "delete");

        let url = self.table_url(table, &params)?;
        self.send(
            self.request(Method::DELETE, url)
                .header("Prefer", "return=minimal"),
            PROVIDER,
        )
        .await?;
        Ok(())
    }

    async fn count(&self, table: &str, params: Params) -> Result<u64> {
        let url = self.table_url(table, &params)?;
        let response = self
            .send(
                self.request(Method::HEAD, url)
                    .header("Prefer", "count=exact"),
                PROVIDER,
            )
            .await?;

        response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| ReelError::Api("data service returned no row count".to_string()))
    }

    async fn start_session(&self, path: &str, email: &str, password: &str) -> Result<UserId> {
        let url = self.auth_url(path)?;
        let response = self
            .send(
                self.request(Method::POST, url)
                    .json(&Credentials { email, password }),
                AUTH_PROVIDER,
            )
            .await?;
        let session: SessionResponse = response.json().await?;

        let user_id = session
            .user
            .map(|u| u.id)
            .or(session.id)
            .ok_or_else(|| ReelError::Auth("auth service returned no user".to_string()))?;

        if let Some(token) = session.access_token {
            *self.access_token.write() = Some(SecretString::from(token));
        }

        Ok(UserId::new(user_id))
    }
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}

#[async_trait]
impl DataClient for PostgrestClient {
    async fn find_saved(&self, movie_id: MovieId, user_id: &UserId) -> Lookup<SavedMovie> {
        self.select_one(
            SAVED_TABLE,
            vec![
                ("select", "*".to_string()),
                ("movie_id", eq(movie_id)),
                ("user_id", eq(user_id)),
                ("limit", "1".to_string()),
            ],
        )
        .await
    }

    async fn insert_saved(&self, saved: &SavedMovie) -> Result<()> {
        self.insert(SAVED_TABLE, saved).await
    }

    async fn delete_saved(&self, movie_id: MovieId, user_id: &UserId) -> Result<()> {
        self.delete(
            SAVED_TABLE,
            vec![("movie_id", eq(movie_id)), ("user_id", eq(user_id))],
        )
        .await
    }

    async fn list_saved(&self, user_id: &UserId) -> Result<Vec<SavedMovie>> {
        self.select_many(
            SAVED_TABLE,
            vec![
                ("select", "*".to_string()),
                ("user_id", eq(user_id)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn count_saved(&self, user_id: &UserId) -> Result<u64> {
        self.count(
            SAVED_TABLE,
            vec![("select", "id".to_string()), ("user_id", eq(user_id))],
        )
        .await
    }

    async fn list_comments(&self, movie_id: MovieId) -> Result<Vec<Comment>> {
        self.select_many(
            COMMENT_TABLE,
            vec![
                ("select", "*".to_string()),
                ("movie_id", eq(movie_id)),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        self.insert(COMMENT_TABLE, comment).await
    }

    async fn update_comment(&self, comment_id: &str, body: &str) -> Result<()> {
        self.update(
            COMMENT_TABLE,
            vec![("id", eq(comment_id))],
            &BodyPatch { comment: body },
        )
        .await
    }

    async fn delete_comment(&self, comment_id: &str) -> Result<()> {
        self.delete(COMMENT_TABLE, vec![("id", eq(comment_id))]).await
    }

    async fn find_metric(&self, search_term: &str) -> Lookup<TrendingMovie> {
        self.select_one(
            METRICS_TABLE,
            vec![
                ("select", "*".to_string()),
                ("searchTerm", eq(search_term)),
                ("limit", "1".to_string()),
            ],
        )
        .await
    }

    async fn insert_metric(&self, metric: &TrendingMovie) -> Result<()> {
        self.insert(METRICS_TABLE, metric).await
    }

    async fn update_metric_count(&self, search_term: &str, count: u64) -> Result<()> {
        self.update(
            METRICS_TABLE,
            vec![("searchTerm", eq(search_term))],
            &CountPatch { count },
        )
        .await
    }

    async fn top_metrics(&self, limit: usize) -> Result<Vec<TrendingMovie>> {
        self.select_many(
            METRICS_TABLE,
            vec![
                ("select", "*".to_string()),
                ("order", "count.desc".to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn find_profile(&self, user_id: &UserId) -> Lookup<UserProfile> {
        self.select_one(
            USER_TABLE,
            vec![("select", "*".to_string()), ("user_id", eq(user_id))],
        )
        .await
    }

    async fn find_profile_by_email(&self, email: &str) -> Lookup<UserProfile> {
        self.select_one(
            USER_TABLE,
            vec![
                ("select", "*".to_string()),
                ("email", eq(email)),
                ("limit", "1".to_string()),
            ],
        )
        .await
    }

    async fn insert_profile(&self, profile: &UserProfile) -> Result<()> {
        self.insert(USER_TABLE, profile).await
    }

    async fn update_profile(&self, user_id: &UserId, update: &ProfileUpdate) -> Result<()> {
        self.update(USER_TABLE, vec![("user_id", eq(user_id))], update)
            .await
    }
}

#[async_trait]
impl AuthClient for PostgrestClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserId> {
        self.start_session("token?grant_type=password", email, password)
            .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<UserId> {
        self.start_session("signup", email, password).await
    }

    async fn sign_out(&self) -> Result<()> {
        if !self.is_signed_in() {
            return Ok(());
        }

        let url = self.auth_url("logout")?;
        self.send(self.request(Method::POST, url), AUTH_PROVIDER)
            .await?;
        *self.access_token.write() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PostgrestClient {
        PostgrestClient::new(
            "https://project.supabase.co",
            SecretString::from("anon".to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_table_url_with_filters() {
        let url = client()
            .table_url(
                SAVED_TABLE,
                &[("movie_id", eq(MovieId(27205))), ("user_id", eq("u-1"))],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://project.supabase.co/rest/v1/savedMovie?movie_id=eq.27205&user_id=eq.u-1"
        );
    }

    #[test]
    fn test_table_url_encodes_search_term() {
        let url = client()
            .table_url(METRICS_TABLE, &[("searchTerm", eq("star wars & co"))])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://project.supabase.co/rest/v1/metrics?searchTerm=eq.star+wars+%26+co"
        );
    }

    #[test]
    fn test_auth_url() {
        let url = client().auth_url("token?grant_type=password").unwrap();
        assert_eq!(
            url.as_str(),
            "https://project.supabase.co/auth/v1/token?grant_type=password"
        );
    }

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-24/*"), None);
    }

    #[test]
    fn test_session_response_shapes() {
        let with_session: SessionResponse = serde_json::from_str(
            r#"{"access_token": "jwt", "user": {"id": "u-1", "email": "a@b.co"}}"#,
        )
        .unwrap();
        assert_eq!(with_session.user.unwrap().id, "u-1");

        let without_session: SessionResponse =
            serde_json::from_str(r#"{"id": "u-2", "email": "a@b.co"}"#).unwrap();
        assert_eq!(without_session.id.as_deref(), Some("u-2"));
        assert!(without_session.access_token.is_none());
    }

    #[test]
    fn test_new_client_is_signed_out() {
        assert!(!client().is_signed_in());
    }
}
