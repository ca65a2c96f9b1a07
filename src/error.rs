use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReelError {
    #[error("invalid movie id '{0}'")]
    InvalidMovieId(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("no user is signed in")]
    NotSignedIn,

    #[error("comment '{0}' not found")]
    CommentNotFound(String),

    #[error("comment '{0}' belongs to another user")]
    NotAuthor(String),

    #[error("movie '{0}' not found")]
    MovieNotFound(String),

    #[error("profile for user '{0}' not found")]
    ProfileNotFound(String),

    #[error("email '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ReelError>;
