//! Generic async fetch state with last-started-wins resolution.
//!
//! A [`FetchController`] wraps an async producer and exposes its latest
//! outcome as a [`FetchState`]. The producer takes one argument per run
//! (`()` for plain fetches), bound when the run starts. Runs may overlap. Each call takes a new generation when it starts and only the
//! newest generation is allowed to write its result; anything older is
//! discarded when it resolves.
//!
//! The generation counter is only touched inside the `watch` channel's
//! modify closures, so advancing it and comparing against it happen under
//! the same lock as the state it guards.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::watch;

use crate::error::Result;

type Producer<T, A> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// Observable state of a fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> FetchState<T> {
    pub fn is_idle(&self) -> bool {
        !self.loading && self.data.is_none() && self.error.is_none()
    }
}

/// When the producer first runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// Run once as soon as the controller is created
    Immediate,
    /// Wait for the first explicit refetch
    Lazy,
}

/// What happened to one refetch call
#[derive(Debug, Clone, PartialEq)]
pub enum Settled<T> {
    /// The result became the current data
    Applied(T),
    /// The producer failed and the error became the current error
    Failed(String),
    /// A newer refetch or a reset started first; the result was dropped
    Superseded,
}

impl<T> Settled<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Settled::Applied(_))
    }
}

struct Inner<T, A> {
    producer: Producer<T, A>,
    state: watch::Sender<FetchState<T>>,
    generation: AtomicU64,
}

impl<T, A> Inner<T, A> {
    /// Clear `loading` if `generation` is still the newest run
    fn abandon(&self, generation: u64) {
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation || !state.loading {
                return false;
            }
            state.loading = false;
            true
        });
    }
}

/// Clears `loading` when a run is dropped before it settles
struct RunGuard<'a, T, A> {
    inner: &'a Inner<T, A>,
    generation: u64,
    armed: bool,
}

impl<T, A> Drop for RunGuard<'_, T, A> {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!(generation = self.generation, "fetch dropped before settling");
            self.inner.abandon(self.generation);
        }
    }
}

/// Async data holder driven by a producer
pub struct FetchController<T, A = ()> {
    inner: Arc<Inner<T, A>>,
}

impl<T, A> Clone for FetchController<T, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> FetchController<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a controller around a zero-argument `producer`.
    ///
    /// With [`StartMode::Immediate`] the first run is spawned on the current
    /// tokio runtime and the state is already `loading` when this returns.
    pub fn new<F, Fut>(producer: F, mode: StartMode) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let controller = Self::with_arg(move |()| producer());

        if mode == StartMode::Immediate {
            let (generation, run) = controller.begin(());
            let runner = controller.clone();
            tokio::spawn(async move {
                runner.run(generation, run).await;
            });
        }

        controller
    }

    /// Run the producer and apply its result unless a newer call started
    pub async fn refetch(&self) -> Settled<T> {
        self.refetch_with(()).await
    }
}

impl<T, A> FetchController<T, A>
where
    T: Clone + Send + Sync + 'static,
    A: Send + 'static,
{
    /// Create a lazy controller whose producer takes an argument per run
    pub fn with_arg<F, Fut>(producer: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let (state, _) = watch::channel(FetchState::default());
        Self {
            inner: Arc::new(Inner {
                producer: Arc::new(move |arg| producer(arg).boxed()),
                state,
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Run the producer with `arg` and apply its result unless a newer call
    /// started.
    ///
    /// The producer is called before the first await, so `arg` is exactly
    /// what this run fetches. Dropping the returned future before it
    /// resolves clears `loading` if no newer run has started.
    pub async fn refetch_with(&self, arg: A) -> Settled<T> {
        let (generation, run) = self.begin(arg);
        self.run(generation, run).await
    }

    /// Clear data and error and drop whatever is in flight
    pub fn reset(&self) {
        self.inner.state.send_modify(|state| {
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            *state = FetchState::default();
        });
    }

    /// Snapshot of the current state
    pub fn state(&self) -> FetchState<T> {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every state transition
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.inner.state.subscribe()
    }

    /// Wait until no fetch is loading and return that state
    pub async fn settled(&self) -> FetchState<T> {
        let mut rx = self.subscribe();
        match rx.wait_for(|state| !state.loading).await {
            Ok(state) => state.clone(),
            // The sender lives in `self`, so the channel cannot be closed here
            Err(_) => self.state(),
        }
    }

    /// Take a new generation, mark the state as loading and start the producer
    fn begin(&self, arg: A) -> (u64, BoxFuture<'static, Result<T>>) {
        let mut generation = 0;
        self.inner.state.send_modify(|state| {
            generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.loading = true;
            state.error = None;
        });
        (generation, (self.inner.producer)(arg))
    }

    async fn run(&self, generation: u64, run: BoxFuture<'static, Result<T>>) -> Settled<T> {
        let mut guard = RunGuard {
            inner: &self.inner,
            generation,
            armed: true,
        };
        let outcome = run.await;
        guard.armed = false;

        let mut settled = Settled::Superseded;
        self.inner.state.send_if_modified(|state| {
            if self.inner.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            state.loading = false;
            match &outcome {
                Ok(data) => {
                    state.data = Some(data.clone());
                    state.error = None;
                    settled = Settled::Applied(data.clone());
                }
                Err(e) => {
                    state.error = Some(e.to_string());
                    settled = Settled::Failed(e.to_string());
                }
            }
            true
        });

        if matches!(settled, Settled::Superseded) {
            tracing::debug!(generation, "discarding stale fetch result");
        }
        settled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReelError;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test]
    async fn test_lazy_does_not_run_until_refetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let controller = FetchController::new(
            move || {
                let counter = counter.clone();
                async move { Ok(counter.fetch_add(1, Ordering::SeqCst) + 1) }
            },
            StartMode::Lazy,
        );

        tokio::task::yield_now().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(controller.state().is_idle());

        assert_eq!(controller.refetch().await, Settled::Applied(1));
        assert_eq!(controller.state().data, Some(1));
    }

    #[tokio::test]
    async fn test_immediate_runs_once_and_starts_loading() {
        let controller = FetchController::new(|| async { Ok("ready") }, StartMode::Immediate);
        assert!(controller.state().loading);

        let state = controller.settled().await;
        assert_eq!(state.data, Some("ready"));
        assert!(!state.loading);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn test_error_keeps_previous_data() {
        let fail = Arc::new(AtomicUsize::new(0));
        let flag = fail.clone();
        let controller = FetchController::new(
            move || {
                let flag = flag.clone();
                async move {
                    if flag.load(Ordering::SeqCst) == 1 {
                        Err(ReelError::Api("offline".to_string()))
                    } else {
                        Ok(7)
                    }
                }
            },
            StartMode::Lazy,
        );

        controller.refetch().await;
        fail.store(1, Ordering::SeqCst);
        let settled = controller.refetch().await;

        assert!(matches!(settled, Settled::Failed(ref msg) if msg.contains("offline")));
        let state = controller.state();
        assert_eq!(state.data, Some(7));
        assert!(state.error.unwrap().contains("offline"));
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_started_wins_over_slower_earlier_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let controller = FetchController::new(
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    // First call is slow, second is fast
                    let delay = if n == 0 { 500 } else { 100 };
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    Ok(n)
                }
            },
            StartMode::Lazy,
        );

        let slow = controller.clone();
        let first = tokio::spawn(async move { slow.refetch().await });
        tokio::task::yield_now().await;
        let second = controller.refetch().await;

        assert_eq!(second, Settled::Applied(1));
        assert_eq!(first.await.unwrap(), Settled::Superseded);
        assert_eq!(controller.state().data, Some(1));
        assert!(!controller.state().loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_discards_in_flight_result() {
        let controller = FetchController::new(
            || async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(1)
            },
            StartMode::Lazy,
        );

        let runner = controller.clone();
        let pending = tokio::spawn(async move { runner.refetch().await });
        tokio::task::yield_now().await;
        assert!(controller.state().loading);

        controller.reset();
        assert!(controller.state().is_idle());

        assert_eq!(pending.await.unwrap(), Settled::Superseded);
        assert!(controller.state().is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_never_shows_stale_error() {
        let controller = FetchController::<u8>::new(
            || async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Err(ReelError::Api("down".to_string()))
            },
            StartMode::Lazy,
        );
        controller.refetch().await;
        assert!(controller.state().error.is_some());

        let mut rx = controller.subscribe();
        let runner = controller.clone();
        let task = tokio::spawn(async move { runner.refetch().await });

        rx.wait_for(|s| s.loading).await.unwrap();
        assert_eq!(rx.borrow().error, None);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_refetch_clears_loading() {
        let controller = FetchController::new(
            || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(1)
            },
            StartMode::Lazy,
        );

        let timed_out =
            tokio::time::timeout(Duration::from_millis(100), controller.refetch()).await;
        assert!(timed_out.is_err());

        let state = controller.state();
        assert!(!state.loading);
        assert_eq!(state.data, None);
        assert_eq!(
            tokio::time::timeout(Duration::from_millis(10), controller.settled())
                .await
                .unwrap(),
            state
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_older_refetch_keeps_newer_loading() {
        let controller = FetchController::with_arg(|delay: u64| async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(delay)
        });

        let runner = controller.clone();
        let newer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            runner.refetch_with(300).await
        });
        let older =
            tokio::time::timeout(Duration::from_millis(50), controller.refetch_with(1000)).await;
        assert!(older.is_err());
        assert!(controller.state().loading);

        assert_eq!(newer.await.unwrap(), Settled::Applied(300));
        assert!(!controller.state().loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetch_with_binds_argument_at_start() {
        let controller = FetchController::with_arg(|query: String| async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok::<_, ReelError>(query.to_uppercase())
        });

        let (first, second) = tokio::join!(
            controller.refetch_with("bat".to_string()),
            controller.refetch_with("inception".to_string())
        );
        assert_eq!(first, Settled::Superseded);
        assert_eq!(second, Settled::Applied("INCEPTION".to_string()));
        assert_eq!(controller.state().data.as_deref(), Some("INCEPTION"));
    }
}
