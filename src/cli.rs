use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "reelsync")]
#[command(about = "Movie discovery from the terminal: search, save and discuss movies")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search the catalog; without a query, read queries from stdin as you type
    #[command(visible_alias = "s")]
    Search {
        /// Search text
        query: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Trending searches and popular movies
    Home {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Most searched terms
    Trending {
        /// Number of rows (default: search.trending_limit)
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show movie details
    #[command(visible_alias = "d")]
    Details {
        /// Catalog movie ID
        movie_id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Save a movie, or remove it if already saved
    Save {
        /// Catalog movie ID
        movie_id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List saved movies
    Saved {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List comments on a movie
    Comments {
        /// Catalog movie ID
        movie_id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Post, edit or delete comments
    Comment {
        #[command(subcommand)]
        action: CommentAction,
    },

    /// Sign in
    Login {
        email: String,

        /// Password (prompted on stdin when omitted)
        #[arg(long)]
        password: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create an account
    Signup {
        /// Display name
        #[arg(long)]
        name: String,

        email: String,

        /// Password (prompted on stdin when omitted)
        #[arg(long)]
        password: Option<String>,

        /// Password confirmation (prompted on stdin when omitted)
        #[arg(long)]
        confirm: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sign out and forget the local identity
    Logout {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the signed-in user ID
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or edit your profile
    Profile {
        #[command(subcommand)]
        action: Option<ProfileAction>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum CommentAction {
    /// Post a comment
    Add {
        movie_id: String,
        body: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit one of your comments
    Edit {
        movie_id: String,
        comment_id: String,
        body: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete one of your comments
    #[command(visible_alias = "rm")]
    Delete {
        movie_id: String,
        comment_id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Update profile fields
    Set {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        bio: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set a configuration value
    Set {
        /// Key (e.g. backend.url, catalog.api_key, search.debounce_ms)
        key: String,
        value: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Get a configuration value
    Get {
        key: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
