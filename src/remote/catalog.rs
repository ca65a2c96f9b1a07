//! Movie catalog client for the TMDB v3 REST API.
//!
//! The API token is sent as a bearer header and kept in a [`SecretString`] so
//! it never shows up in `Debug` output or logs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use crate::config::Config;
use crate::error::{ReelError, Result};
use crate::types::{Movie, MovieDetails, MovieId};

use super::{ApiError, CatalogClient, Lookup, MoviePage};

const PROVIDER: &str = "catalog";

#[derive(Debug, Deserialize)]
struct PageResponse {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    total_pages: u32,
    #[serde(default)]
    results: Vec<Movie>,
}

impl From<PageResponse> for MoviePage {
    fn from(response: PageResponse) -> Self {
        MoviePage {
            page: response.page,
            total_pages: response.total_pages,
            results: response.results,
        }
    }
}

/// TMDB catalog client
pub struct TmdbCatalog {
    client: Client,
    base_url: Url,
    token: SecretString,
}

impl TmdbCatalog {
    /// Create a catalog client from configuration
    ///
    /// Configures the HTTP client with a 10s connect timeout and the
    /// configured total timeout.
    pub fn from_config(config: &Config) -> Result<Self> {
        let token = config.catalog_api_key()?;
        Self::new(&config.catalog.base_url, token, config.remote_timeout())
    }

    pub fn new(base_url: &str, token: SecretString, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            token,
        })
    }

    /// Build an endpoint URL under the API base
    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<Url> {
        let mut url = self.base_url.join(path.trim_start_matches('/'))?;
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// GET a JSON resource; a 404 from the catalog is reported as `NotFound`
    async fn fetch_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Lookup<T> {
        tracing::debug!(path = url.path(), "catalog request");

        let response = match self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Lookup::Failed(e.into()),
        };

        if response.status() == StatusCode::NOT_FOUND {
            return Lookup::NotFound;
        }
        if !response.status().is_success() {
            return Lookup::Failed(ApiError::from_response(response, PROVIDER).await.into());
        }

        match response.json().await {
            Ok(value) => Lookup::Found(value),
            Err(e) => Lookup::Failed(e.into()),
        }
    }

    async fn fetch_page(&self, url: Url) -> Result<MoviePage> {
        let path = url.path().to_string();
        let response: PageResponse = self
            .fetch_json(url)
            .await
            .into_result()?
            .ok_or_else(|| ReelError::Api(format!("catalog endpoint {path} not found")))?;
        Ok(response.into())
    }
}

/// Parse the base URL, making sure relative joins keep its last path segment
fn parse_base_url(base_url: &str) -> Result<Url> {
    let normalized = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    };
    Ok(Url::parse(&normalized)?)
}

#[async_trait]
impl CatalogClient for TmdbCatalog {
    async fn search_movies(&self, query: &str, page: u32) -> Result<MoviePage> {
        let url = self.endpoint(
            "search/movie",
            &[
                ("query", query.to_string()),
                ("page", page.max(1).to_string()),
            ],
        )?;
        self.fetch_page(url).await
    }

    async fn discover_movies(&self, page: u32) -> Result<MoviePage> {
        let url = self.endpoint(
            "discover/movie",
            &[
                ("sort_by", "popularity.desc".to_string()),
                ("page", page.max(1).to_string()),
            ],
        )?;
        self.fetch_page(url).await
    }

    async fn movie_details(&self, id: MovieId) -> Result<MovieDetails> {
        let url = self.endpoint(&format!("movie/{id}"), &[])?;
        match self.fetch_json(url).await {
            Lookup::Found(details) => Ok(details),
            Lookup::NotFound => Err(ReelError::MovieNotFound(id.to_string())),
            Lookup::Failed(e) => Err(e),
        }
    }
}
