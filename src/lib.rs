pub mod cli;
pub mod comments;
pub mod commands;
pub mod config;
pub mod error;
pub mod feeds;
pub mod fetch;
pub mod identity;
pub mod metrics;
pub mod paths;
pub mod profile;
pub mod remote;
pub mod saved;
pub mod search;
pub mod session;
pub mod types;
pub mod utils;

pub use comments::{CommentSync, ComposeMode, MenuAction};
pub use config::Config;
pub use error::{ReelError, Result};
pub use feeds::{DetailFeed, HomeFeed, SavedFeed};
pub use fetch::{FetchController, FetchState, Settled, StartMode};
pub use identity::{FileIdentityStore, IdentityContext, IdentityStore, MemoryIdentityStore};
pub use metrics::SearchMetrics;
pub use profile::{ProfileSummary, Profiles};
pub use remote::{AuthClient, CatalogClient, DataClient, Lookup, MoviePage};
pub use saved::{SavedItemSync, SavedLibrary};
pub use search::{DebouncedSearchController, SearchState};
pub use session::{Session, SignUpForm};
pub use types::{
    Comment, Movie, MovieDetails, MovieId, MovieSnapshot, ProfileUpdate, SavedMovie,
    TrendingMovie, UserId, UserProfile,
};
