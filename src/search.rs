//! Incremental movie search with a debounce window.
//!
//! Each edit re-arms a single timer task. When the window passes without
//! further edits the trimmed query is searched, and a search that lands as
//! the current result records one metrics hit for its first movie.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::SearchConfig;
use crate::error::ReelError;
use crate::fetch::{FetchController, FetchState, Settled};
use crate::metrics::SearchMetrics;
use crate::remote::CatalogClient;
use crate::types::Movie;

/// Search results state for the current query
pub type SearchState = FetchState<Vec<Movie>>;

/// Debounced catalog search bound to one search field
pub struct DebouncedSearchController {
    /// Results keyed by the trimmed query each run was started with
    results: FetchController<Vec<Movie>, String>,
    /// Text as last typed
    query: Mutex<String>,
    pending: Mutex<Option<JoinHandle<()>>>,
    /// Searches fired by the timer that may still be running
    fired: Arc<Mutex<Vec<JoinHandle<()>>>>,
    metrics: SearchMetrics,
    delay: Duration,
}

impl DebouncedSearchController {
    pub fn new(catalog: Arc<dyn CatalogClient>, metrics: SearchMetrics, delay: Duration) -> Self {
        let results = FetchController::with_arg(move |query: String| {
            let catalog = Arc::clone(&catalog);
            async move {
                tracing::debug!(query = %query, "searching catalog");
                let page = catalog.search_movies(&query, 1).await?;
                Ok::<_, ReelError>(page.results)
            }
        });

        Self {
            results,
            query: Mutex::new(String::new()),
            pending: Mutex::new(None),
            fired: Arc::new(Mutex::new(Vec::new())),
            metrics,
            delay,
        }
    }

    pub fn from_config(
        catalog: Arc<dyn CatalogClient>,
        metrics: SearchMetrics,
        config: &SearchConfig,
    ) -> Self {
        Self::new(catalog, metrics, config.debounce())
    }

    /// Record an edit of the search field and restart the debounce window
    pub fn set_query(&self, text: &str) {
        *self.query.lock() = text.to_string();

        let search = self.search_task(text.trim().to_string());
        let delay = self.delay;
        let fired = Arc::clone(&self.fired);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Detach the search itself so a later edit only cancels timers
            let handle = tokio::spawn(async move {
                search.run().await;
            });
            let mut fired = fired.lock();
            fired.retain(|h| !h.is_finished());
            fired.push(handle);
        });

        if let Some(previous) = self.pending.lock().replace(timer) {
            previous.abort();
        }
    }

    /// Search `text` right away, skipping the debounce window
    pub async fn search_now(&self, text: &str) -> Settled<Vec<Movie>> {
        *self.query.lock() = text.to_string();
        if let Some(previous) = self.pending.lock().take() {
            previous.abort();
        }
        self.search_task(text.trim().to_string()).run().await
    }

    /// Wait for the armed timer to fire and for every fired search to
    /// finish, metrics writes included
    pub async fn flush(&self) {
        let timer = self.pending.lock().take();
        if let Some(timer) = timer {
            // An aborted timer never fired, nothing to wait for
            let _ = timer.await;
        }
        let fired = std::mem::take(&mut *self.fired.lock());
        for search in fired {
            if let Err(e) = search.await {
                tracing::warn!(error = %e, "search task failed");
            }
        }
    }

    /// Text as last typed
    pub fn query(&self) -> String {
        self.query.lock().clone()
    }

    pub fn state(&self) -> SearchState {
        self.results.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.results.subscribe()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// True while a debounce timer is armed and has not fired yet
    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }

    fn search_task(&self, query: String) -> SearchTask {
        SearchTask {
            results: self.results.clone(),
            metrics: self.metrics.clone(),
            query,
        }
    }
}

impl Drop for DebouncedSearchController {
    fn drop(&mut self) {
        if let Some(timer) = self.pending.lock().take() {
            timer.abort();
        }
    }
}

/// One fired search, carrying the query that triggered it
struct SearchTask {
    results: FetchController<Vec<Movie>, String>,
    metrics: SearchMetrics,
    query: String,
}

impl SearchTask {
    /// An empty query clears the results and reports `Superseded`
    async fn run(self) -> Settled<Vec<Movie>> {
        if self.query.is_empty() {
            self.results.reset();
            return Settled::Superseded;
        }

        let settled = self.results.refetch_with(self.query.clone()).await;

        if let Settled::Applied(movies) = &settled
            && let Some(first) = movies.first()
            && let Err(e) = self.metrics.record_search(&self.query, first).await
        {
            tracing::warn!(query = %self.query, error = %e, "failed to record search metrics");
        }

        settled
    }
}
