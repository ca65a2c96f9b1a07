//! Command implementations behind the `reelsync` binary.
//!
//! Each `cmd_*` function loads what it needs from [`App`], runs one library
//! operation and prints either text or JSON.

mod account;
mod comments;
mod config;
mod movies;
mod saved;

pub use account::{cmd_login, cmd_logout, cmd_profile_set, cmd_profile_show, cmd_signup, cmd_whoami};
pub use comments::{cmd_comment_add, cmd_comment_delete, cmd_comment_edit, cmd_comments};
pub use config::{cmd_config_get, cmd_config_set, cmd_config_show};
pub use movies::{cmd_details, cmd_home, cmd_search, cmd_search_interactive, cmd_trending};
pub use saved::{cmd_save, cmd_saved};

use std::sync::Arc;

use serde_json::Value;

use crate::config::Config;
use crate::error::Result;
use crate::identity::{FileIdentityStore, IdentityContext};
use crate::metrics::SearchMetrics;
use crate::remote::{PostgrestClient, TmdbCatalog};
use crate::session::Session;

/// Clients and settings shared by the commands
pub struct App {
    pub config: Config,
    identity_store: Arc<FileIdentityStore>,
}

impl App {
    pub fn load() -> Result<Self> {
        Ok(Self {
            config: Config::load()?,
            identity_store: Arc::new(FileIdentityStore::new()),
        })
    }

    pub fn catalog(&self) -> Result<Arc<TmdbCatalog>> {
        Ok(Arc::new(TmdbCatalog::from_config(&self.config)?))
    }

    pub fn data(&self) -> Result<Arc<PostgrestClient>> {
        Ok(Arc::new(PostgrestClient::from_config(&self.config)?))
    }

    pub fn metrics(&self) -> Result<SearchMetrics> {
        Ok(SearchMetrics::new(self.data()?))
    }

    pub async fn identity(&self) -> Result<IdentityContext> {
        IdentityContext::load(self.identity_store.as_ref()).await
    }

    pub fn session(&self) -> Result<Session> {
        let data = self.data()?;
        Ok(Session::new(
            data.clone(),
            data,
            self.identity_store.clone(),
        ))
    }
}

/// Print a JSON value to stdout
pub fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Shorten `text` to at most `max` characters, marking the cut with an ellipsis
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}
