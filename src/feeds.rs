//! Screen-level data sources built on [`FetchController`].

use std::sync::Arc;

use crate::error::{ReelError, Result};
use crate::fetch::{FetchController, FetchState, Settled, StartMode};
use crate::identity::IdentityContext;
use crate::metrics::SearchMetrics;
use crate::remote::{CatalogClient, DataClient};
use crate::types::{Movie, MovieDetails, MovieId, SavedMovie, TrendingMovie, UserId};

/// Landing screen: trending searches and popular movies, both loaded on creation
pub struct HomeFeed {
    pub trending: FetchController<Vec<TrendingMovie>>,
    pub popular: FetchController<Vec<Movie>>,
}

impl HomeFeed {
    pub fn new(catalog: Arc<dyn CatalogClient>, metrics: SearchMetrics, trending_limit: usize) -> Self {
        let trending = FetchController::new(
            move || {
                let metrics = metrics.clone();
                async move { metrics.trending(trending_limit).await }
            },
            StartMode::Immediate,
        );

        let popular = FetchController::new(
            move || {
                let catalog = Arc::clone(&catalog);
                async move {
                    let page = catalog.discover_movies(1).await?;
                    Ok::<_, ReelError>(page.results)
                }
            },
            StartMode::Immediate,
        );

        Self { trending, popular }
    }
}

/// The signed-in user's saved movies, reloaded whenever the screen gains focus
pub struct SavedFeed {
    movies: FetchController<Vec<SavedMovie>, UserId>,
}

impl SavedFeed {
    pub fn new(data: Arc<dyn DataClient>) -> Self {
        let movies = FetchController::with_arg(move |user_id: UserId| {
            let data = Arc::clone(&data);
            async move { data.list_saved(&user_id).await }
        });
        Self { movies }
    }

    /// Screen focus: reload for the current user, or clear when signed out
    pub async fn on_focus(&self, identity: &IdentityContext) -> Settled<Vec<SavedMovie>> {
        match identity.user() {
            Some(user_id) => self.movies.refetch_with(user_id.clone()).await,
            None => {
                self.movies.reset();
                Settled::Superseded
            }
        }
    }

    pub fn state(&self) -> FetchState<Vec<SavedMovie>> {
        self.movies.state()
    }
}

/// Details of one movie, loaded on creation
pub struct DetailFeed {
    movie_id: MovieId,
    pub details: FetchController<MovieDetails>,
}

impl DetailFeed {
    pub fn new(catalog: Arc<dyn CatalogClient>, movie_id: MovieId) -> Self {
        let details = FetchController::new(
            move || {
                let catalog = Arc::clone(&catalog);
                async move { catalog.movie_details(movie_id).await }
            },
            StartMode::Immediate,
        );
        Self { movie_id, details }
    }

    /// Build from a movie id received as navigation text
    pub fn for_route(catalog: Arc<dyn CatalogClient>, movie_id: &str) -> Result<Self> {
        Ok(Self::new(catalog, MovieId::parse(movie_id)?))
    }

    pub fn movie_id(&self) -> MovieId {
        self.movie_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryBackend;
    use crate::saved::SavedItemSync;
    use crate::types::MovieSnapshot;

    fn details(id: u64, title: &str) -> MovieDetails {
        MovieDetails {
            movie: Movie {
                id: MovieId(id),
                title: title.to_string(),
                poster_path: None,
                vote_average: 7.0,
                release_date: Some("2010-07-15".to_string()),
                overview: None,
            },
            vote_count: 10,
            runtime: Some(148),
            genres: Vec::new(),
            budget: 0,
            revenue: 0,
            production_companies: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_home_feed_loads_on_creation() {
        let backend = Arc::new(MemoryBackend::new().with_movies([details(1, "Up")]));
        let home = HomeFeed::new(backend.clone(), SearchMetrics::new(backend.clone()), 5);

        let popular = home.popular.settled().await;
        assert_eq!(popular.data.unwrap()[0].title, "Up");
        let trending = home.trending.settled().await;
        assert_eq!(trending.data, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_detail_feed_missing_movie_sets_error() {
        let backend = Arc::new(MemoryBackend::new());
        let feed = DetailFeed::new(backend, MovieId(404));
        let state = feed.details.settled().await;
        assert!(state.data.is_none());
        assert!(state.error.unwrap().contains("404"));
    }

    #[tokio::test]
    async fn test_detail_feed_for_route_validates_id() {
        let backend = Arc::new(MemoryBackend::new());
        assert!(DetailFeed::for_route(backend, "twelve").is_err());
    }

    #[tokio::test]
    async fn test_saved_feed_follows_focus_and_identity() {
        let backend = Arc::new(MemoryBackend::new());
        let identity = IdentityContext::signed_in(UserId::new("u1"));
        let mut sync = SavedItemSync::new(backend.clone(), MovieId(27205));
        sync.toggle(&identity, &MovieSnapshot::default()).await.unwrap();

        let feed = SavedFeed::new(backend);
        assert!(feed.state().is_idle());

        let settled = feed.on_focus(&identity).await;
        assert!(matches!(settled, Settled::Applied(ref rows) if rows.len() == 1));

        feed.on_focus(&IdentityContext::anonymous()).await;
        assert!(feed.state().is_idle());
    }

    #[tokio::test]
    async fn test_saved_feed_lists_rows_of_focused_user() {
        let backend = Arc::new(MemoryBackend::new());
        let ann = IdentityContext::signed_in(UserId::new("ann"));
        let bob = IdentityContext::signed_in(UserId::new("bob"));
        SavedItemSync::new(backend.clone(), MovieId(1))
            .toggle(&ann, &MovieSnapshot::default())
            .await
            .unwrap();

        let feed = SavedFeed::new(backend);
        let for_ann = feed.on_focus(&ann).await;
        assert!(matches!(for_ann, Settled::Applied(ref rows) if rows.len() == 1));

        assert_eq!(feed.on_focus(&bob).await, Settled::Applied(Vec::new()));
        assert_eq!(feed.state().data, Some(Vec::new()));
    }
}
