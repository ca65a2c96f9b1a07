//! Search metrics: the per-term search counter and the trending list built
//! from it.

use std::sync::Arc;

use crate::error::Result;
use crate::remote::{DataClient, Lookup};
use crate::types::{Movie, TrendingMovie};

/// Default number of trending rows
pub const DEFAULT_TRENDING_LIMIT: usize = 5;

#[derive(Clone)]
pub struct SearchMetrics {
    data: Arc<dyn DataClient>,
}

impl SearchMetrics {
    pub fn new(data: Arc<dyn DataClient>) -> Self {
        Self { data }
    }

    /// Count one search for `term`, attributing a new row to `movie`.
    ///
    /// An existing row only has its count bumped; the movie it points at is
    /// the one recorded by the first search for that term.
    pub async fn record_search(&self, term: &str, movie: &Movie) -> Result<()> {
        match self.data.find_metric(term).await {
            Lookup::Found(existing) => {
                tracing::debug!(term, count = existing.count + 1, "bumping search count");
                self.data
                    .update_metric_count(term, existing.count + 1)
                    .await
            }
            Lookup::NotFound => {
                tracing::debug!(term, movie_id = %movie.id, "recording first search");
                self.data
                    .insert_metric(&TrendingMovie::first_search(term, movie))
                    .await
            }
            Lookup::Failed(e) => Err(e),
        }
    }

    /// Most searched terms, highest count first
    pub async fn trending(&self, limit: usize) -> Result<Vec<TrendingMovie>> {
        self.data.top_metrics(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryBackend;
    use crate::remote::memory::{BackendCall, FailureMode};
    use crate::types::MovieId;

    fn movie(id: u64, title: &str) -> Movie {
        Movie {
            id: MovieId(id),
            title: title.to_string(),
            poster_path: Some(format!("/{id}.jpg")),
            vote_average: 7.0,
            release_date: None,
            overview: None,
        }
    }

    #[tokio::test]
    async fn test_first_search_inserts_row() {
        let backend = Arc::new(MemoryBackend::new());
        let metrics = SearchMetrics::new(backend.clone());

        metrics
            .record_search("batman", &movie(268, "Batman"))
            .await
            .unwrap();

        let rows = backend.metric_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].search_term, "batman");
        assert_eq!(rows[0].movie_id, MovieId(268));
        assert_eq!(rows[0].count, 1);
        assert_eq!(
            rows[0].poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/268.jpg")
        );
    }

    #[tokio::test]
    async fn test_repeat_search_bumps_count_only() {
        let backend = Arc::new(MemoryBackend::new());
        let metrics = SearchMetrics::new(backend.clone());

        metrics
            .record_search("batman", &movie(268, "Batman"))
            .await
            .unwrap();
        metrics
            .record_search("batman", &movie(414906, "The Batman"))
            .await
            .unwrap();

        let rows = backend.metric_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].movie_id, MovieId(268));
        assert!(backend.calls().contains(&BackendCall::UpdateMetric {
            term: "batman".to_string(),
            count: 2,
        }));
    }

    #[tokio::test]
    async fn test_lookup_failure_is_an_error() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_failure(FailureMode::All);
        let metrics = SearchMetrics::new(backend.clone());

        assert!(
            metrics
                .record_search("batman", &movie(268, "Batman"))
                .await
                .is_err()
        );
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_trending_ordered_by_count() {
        let backend = Arc::new(MemoryBackend::new());
        for (term, count) in [("a", 3), ("b", 9), ("c", 1)] {
            let mut row = TrendingMovie::first_search(term, &movie(1, "M"));
            row.count = count;
            backend.add_metric(row);
        }
        let metrics = SearchMetrics::new(backend);

        let terms: Vec<String> = metrics
            .trending(2)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.search_term)
            .collect();
        assert_eq!(terms, vec!["b", "a"]);
    }
}
