//! Catalog commands: search, trending, the home view and movie details.

use owo_colors::OwoColorize;
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{App, print_json, truncate};
use crate::error::{ReelError, Result};
use crate::feeds::{DetailFeed, HomeFeed};
use crate::fetch::Settled;
use crate::search::DebouncedSearchController;
use crate::types::{Movie, MovieDetails, MovieId, TrendingMovie};

/// A row in a movie list table
#[derive(Tabled)]
struct MovieRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Year")]
    year: String,
    #[tabled(rename = "Rating")]
    rating: String,
}

impl From<&Movie> for MovieRow {
    fn from(movie: &Movie) -> Self {
        MovieRow {
            id: movie.id.to_string(),
            title: truncate(&movie.title, 48),
            year: movie.release_year().unwrap_or("N/A").to_string(),
            rating: format!("{:.1}", movie.vote_average),
        }
    }
}

#[derive(Tabled)]
struct TrendingRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Search")]
    term: String,
    #[tabled(rename = "Movie")]
    title: String,
    #[tabled(rename = "Count")]
    count: u64,
}

fn movie_json(movie: &Movie) -> serde_json::Value {
    json!({
        "id": movie.id,
        "title": movie.title,
        "release_date": movie.release_date,
        "vote_average": movie.vote_average,
        "poster_url": movie.poster_url(),
    })
}

fn print_movies(movies: &[Movie]) {
    if movies.is_empty() {
        println!("No movies found.");
        return;
    }
    let rows: Vec<MovieRow> = movies.iter().map(MovieRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

/// Search the catalog once and record the search
pub async fn cmd_search(query: &str, output_json: bool) -> Result<()> {
    if query.trim().is_empty() {
        return Err(ReelError::Validation(
            "search query cannot be empty".to_string(),
        ));
    }

    let app = App::load()?;
    let search = DebouncedSearchController::from_config(
        app.catalog()?,
        app.metrics()?,
        &app.config.search,
    );

    let movies = match search.search_now(query).await {
        Settled::Applied(movies) => movies,
        Settled::Failed(message) => return Err(ReelError::Api(message)),
        Settled::Superseded => Vec::new(),
    };

    if output_json {
        let results: Vec<_> = movies.iter().map(movie_json).collect();
        return print_json(&json!({ "query": query.trim(), "results": results }));
    }

    println!("Search results for: \"{}\"\n", query.trim());
    print_movies(&movies);
    Ok(())
}

/// Read queries from stdin line by line and search after each pause in typing
pub async fn cmd_search_interactive() -> Result<()> {
    let app = App::load()?;
    let search = DebouncedSearchController::from_config(
        app.catalog()?,
        app.metrics()?,
        &app.config.search,
    );

    let mut updates = search.subscribe();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            if state.loading {
                continue;
            }
            if let Some(error) = state.error {
                eprintln!("{} {error}", "error:".red());
            } else if let Some(movies) = state.data {
                print_movies(&movies);
            }
        }
    });

    eprintln!(
        "{}",
        format!(
            "Type a query; results appear {}ms after you stop. Ctrl-D to quit.",
            search.delay().as_millis()
        )
        .dimmed()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        search.set_query(&line);
    }

    // Finish the search armed by the last line, metrics included
    search.flush().await;
    // Dropping the controller closes the results channel, which ends the printer
    drop(search);
    if let Err(e) = printer.await {
        tracing::warn!(error = %e, "result printer failed");
    }
    Ok(())
}

/// Most searched terms
pub async fn cmd_trending(limit: Option<usize>, output_json: bool) -> Result<()> {
    let app = App::load()?;
    let limit = limit.unwrap_or(app.config.search.trending_limit);
    let trending = app.metrics()?.trending(limit).await?;

    if output_json {
        return print_json(&serde_json::to_value(&trending)?);
    }

    if trending.is_empty() {
        println!("No searches recorded yet.");
        return Ok(());
    }
    let rows: Vec<TrendingRow> = trending
        .iter()
        .enumerate()
        .map(|(i, t): (usize, &TrendingMovie)| TrendingRow {
            rank: i + 1,
            term: t.search_term.clone(),
            title: truncate(&t.title, 40),
            count: t.count,
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

/// Landing view: trending searches and popular movies
pub async fn cmd_home(output_json: bool) -> Result<()> {
    let app = App::load()?;
    let home = HomeFeed::new(app.catalog()?, app.metrics()?, app.config.search.trending_limit);
    let (trending, popular) = tokio::join!(home.trending.settled(), home.popular.settled());

    if let Some(error) = popular.error.or(trending.error) {
        return Err(ReelError::Api(error));
    }
    let trending = trending.data.unwrap_or_default();
    let popular = popular.data.unwrap_or_default();

    if output_json {
        let popular: Vec<_> = popular.iter().map(movie_json).collect();
        return print_json(&json!({
            "trending": serde_json::to_value(&trending)?,
            "popular": popular,
        }));
    }

    println!("{}", "Trending searches".cyan().bold());
    if trending.is_empty() {
        println!("No searches recorded yet.");
    } else {
        for (i, t) in trending.iter().enumerate() {
            println!("{:>2}. {} {}", i + 1, t.title, format!("({})", t.search_term).dimmed());
        }
    }

    println!("\n{}", "Popular movies".cyan().bold());
    print_movies(&popular);
    Ok(())
}

fn details_text(details: &MovieDetails) -> String {
    let movie = &details.movie;
    let mut text = format!("{}\n", movie.title.cyan().bold());

    let year = movie.release_year().unwrap_or("N/A");
    let runtime = details
        .runtime
        .map(|m| format!("{m}m"))
        .unwrap_or_else(|| "N/A".to_string());
    text.push_str(&format!("{year} • {runtime}\n"));
    text.push_str(&format!(
        "{} {:.1}/10 ({} votes)\n\n",
        "Rating:".dimmed(),
        movie.vote_average,
        details.vote_count
    ));

    text.push_str(&format!(
        "{}\n{}\n\n",
        "Overview".cyan(),
        movie.overview.as_deref().unwrap_or("N/A")
    ));
    text.push_str(&format!(
        "{} {}\n",
        "Genres:".dimmed(),
        details.genre_names().unwrap_or_else(|| "N/A".to_string())
    ));
    text.push_str(&format!(
        "{} ${:.0} million\n",
        "Budget:".dimmed(),
        details.budget_millions()
    ));
    text.push_str(&format!(
        "{} ${} million\n",
        "Revenue:".dimmed(),
        details.revenue_millions()
    ));
    text.push_str(&format!(
        "{} {}",
        "Production:".dimmed(),
        details.company_names().unwrap_or_else(|| "N/A".to_string())
    ));
    if let Some(poster) = movie.poster_url() {
        text.push_str(&format!("\n{}", poster.dimmed()));
    }
    text
}

/// Full details of one movie
pub async fn cmd_details(movie_id: &str, output_json: bool) -> Result<()> {
    let movie_id = MovieId::parse(movie_id)?;
    let app = App::load()?;
    let feed = DetailFeed::new(app.catalog()?, movie_id);
    let state = feed.details.settled().await;

    let details = match (state.data, state.error) {
        (Some(details), _) => details,
        (None, Some(error)) => return Err(ReelError::Api(error)),
        (None, None) => return Err(ReelError::MovieNotFound(feed.movie_id().to_string())),
    };

    if output_json {
        return print_json(&serde_json::to_value(&details)?);
    }
    println!("{}", details_text(&details));
    Ok(())
}
