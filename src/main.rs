use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use reelsync::cli::{Cli, Commands, CommentAction, ConfigAction, ProfileAction};
use reelsync::commands::{
    cmd_comment_add, cmd_comment_delete, cmd_comment_edit, cmd_comments, cmd_config_get,
    cmd_config_set, cmd_config_show, cmd_details, cmd_home, cmd_login, cmd_logout,
    cmd_profile_set, cmd_profile_show, cmd_save, cmd_saved, cmd_search, cmd_search_interactive,
    cmd_signup, cmd_trending, cmd_whoami,
};

/// Log to stderr, filtered by `RUST_LOG` (default: warn)
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Search { query, json } => match query {
            Some(query) => cmd_search(&query, json).await,
            None => cmd_search_interactive().await,
        },
        Commands::Home { json } => cmd_home(json).await,
        Commands::Trending { limit, json } => cmd_trending(limit, json).await,
        Commands::Details { movie_id, json } => cmd_details(&movie_id, json).await,
        Commands::Save { movie_id, json } => cmd_save(&movie_id, json).await,
        Commands::Saved { json } => cmd_saved(json).await,
        Commands::Comments { movie_id, json } => cmd_comments(&movie_id, json).await,

        Commands::Comment { action } => match action {
            CommentAction::Add {
                movie_id,
                body,
                json,
            } => cmd_comment_add(&movie_id, &body, json).await,
            CommentAction::Edit {
                movie_id,
                comment_id,
                body,
                json,
            } => cmd_comment_edit(&movie_id, &comment_id, &body, json).await,
            CommentAction::Delete {
                movie_id,
                comment_id,
                json,
            } => cmd_comment_delete(&movie_id, &comment_id, json).await,
        },

        Commands::Login {
            email,
            password,
            json,
        } => cmd_login(&email, password, json).await,
        Commands::Signup {
            name,
            email,
            password,
            confirm,
            json,
        } => cmd_signup(&name, &email, password, confirm, json).await,
        Commands::Logout { json } => cmd_logout(json).await,
        Commands::Whoami { json } => cmd_whoami(json).await,

        Commands::Profile { action, json } => match action {
            None => cmd_profile_show(json).await,
            Some(ProfileAction::Set { name, phone, bio }) => {
                cmd_profile_set(name, phone, bio, json).await
            }
        },

        Commands::Config { action } => match action {
            ConfigAction::Show { json } => cmd_config_show(json),
            ConfigAction::Set { key, value, json } => cmd_config_set(&key, &value, json),
            ConfigAction::Get { key, json } => cmd_config_get(&key, json),
        },
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
