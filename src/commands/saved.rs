//! Saved-movie commands.

use owo_colors::OwoColorize;
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::{App, print_json, truncate};
use crate::error::{ReelError, Result};
use crate::feeds::SavedFeed;
use crate::fetch::Settled;
use crate::remote::CatalogClient;
use crate::saved::SavedItemSync;
use crate::types::{MovieId, MovieSnapshot, SavedMovie};

#[derive(Tabled)]
struct SavedRow {
    #[tabled(rename = "ID")]
    movie_id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Released")]
    release_date: String,
    #[tabled(rename = "Rating")]
    rating: String,
}

impl From<&SavedMovie> for SavedRow {
    fn from(saved: &SavedMovie) -> Self {
        SavedRow {
            movie_id: saved.movie_id.to_string(),
            title: truncate(&saved.title, 48),
            release_date: saved.release_date.clone(),
            rating: format!("{:.1}", saved.vote_average),
        }
    }
}

/// Toggle the saved state of a movie for the signed-in user
pub async fn cmd_save(movie_id: &str, output_json: bool) -> Result<()> {
    let movie_id = MovieId::parse(movie_id)?;
    let app = App::load()?;
    let identity = app.identity().await?;
    identity.require_user()?;

    let mut sync = SavedItemSync::new(app.data()?, movie_id);
    sync.refresh(&identity).await?;

    // Saving copies the display fields, so only look the movie up when needed
    let snapshot = if sync.is_saved() {
        MovieSnapshot::default()
    } else {
        let details = app.catalog()?.movie_details(movie_id).await?;
        MovieSnapshot::from(&details)
    };

    let saved = sync.toggle(&identity, &snapshot).await?;

    if output_json {
        return print_json(&json!({
            "action": "save_toggle",
            "movie_id": movie_id,
            "saved": saved,
        }));
    }

    if saved {
        println!("{} movie {}", "Saved".green(), movie_id.to_string().cyan());
    } else {
        println!("{} movie {}", "Removed".yellow(), movie_id.to_string().cyan());
    }
    Ok(())
}

/// List the signed-in user's saved movies
pub async fn cmd_saved(output_json: bool) -> Result<()> {
    let app = App::load()?;
    let identity = app.identity().await?;
    identity.require_user()?;

    let feed = SavedFeed::new(app.data()?);
    let movies = match feed.on_focus(&identity).await {
        Settled::Applied(movies) => movies,
        Settled::Failed(message) => return Err(ReelError::Api(message)),
        Settled::Superseded => Vec::new(),
    };

    if output_json {
        return print_json(&serde_json::to_value(&movies)?);
    }

    if movies.is_empty() {
        println!("No saved movies yet.");
        return Ok(());
    }
    let rows: Vec<SavedRow> = movies.iter().map(SavedRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}
