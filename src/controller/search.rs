use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CatalogError;
use crate::models::SearchResult;
use crate::omdb::CatalogApi;

/// Queries shorter than this (in characters) never reach the catalog.
pub const MIN_QUERY_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub status: FetchStatus,
    pub results: Vec<SearchResult>,
    /// Empty unless `status` is `Failed`.
    pub error: String,
    generation: u64,
}

impl SearchState {
    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }
}

#[derive(Default)]
struct InFlight {
    query: Option<String>,
    cancel: Option<CancellationToken>,
}

/// Keeps search results in step with a query that changes under it.
///
/// Each accepted query bumps a generation number and gets its own
/// cancellation token; the previous token is cancelled. A finished request
/// only touches the published state if its generation is still the current
/// one, so a late response for an old query is dropped no matter when it
/// arrives.
///
/// `set_query` spawns onto the current Tokio runtime.
pub struct QueryFetchController {
    catalog: Arc<dyn CatalogApi>,
    state: Arc<watch::Sender<SearchState>>,
    inflight: Mutex<InFlight>,
}

impl QueryFetchController {
    pub fn new(catalog: Arc<dyn CatalogApi>) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            catalog,
            state: Arc::new(state),
            inflight: Mutex::new(InFlight::default()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SearchState {
        self.state.borrow().clone()
    }

    /// Waits until no search is loading and returns that state.
    pub async fn settled(&self) -> SearchState {
        let mut rx = self.state.subscribe();
        let settled = match rx.wait_for(|s| !s.is_loading()).await {
            Ok(state) => (*state).clone(),
            Err(_) => self.snapshot(),
        };
        settled
    }

    pub fn set_query(&self, query: &str) {
        let mut inflight = self.lock_inflight();

        if query.chars().count() < MIN_QUERY_CHARS {
            if let Some(prev) = inflight.cancel.take() {
                prev.cancel();
            }
            inflight.query = None;
            self.state.send_modify(|s| {
                s.generation += 1;
                s.query = query.to_string();
                s.status = FetchStatus::Idle;
                s.results.clear();
                s.error.clear();
            });
            return;
        }

        if inflight.query.as_deref() == Some(query) {
            return;
        }

        if let Some(prev) = inflight.cancel.take() {
            prev.cancel();
        }
        let cancel = CancellationToken::new();
        inflight.query = Some(query.to_string());
        inflight.cancel = Some(cancel.clone());

        let mut generation = 0;
        self.state.send_modify(|s| {
            s.generation += 1;
            generation = s.generation;
            s.query = query.to_string();
            s.status = FetchStatus::Loading;
            s.error.clear();
        });

        debug!(query, generation, "Searching catalog");
        tokio::spawn(run_search(
            self.catalog.clone(),
            self.state.clone(),
            query.to_string(),
            generation,
            cancel,
        ));
    }

    /// Cancels the in-flight search, if any. Also runs on drop.
    pub fn shutdown(&self) {
        let mut inflight = self.lock_inflight();
        inflight.query = None;
        if let Some(cancel) = inflight.cancel.take() {
            cancel.cancel();
            self.state.send_if_modified(|s| {
                if !s.is_loading() {
                    return false;
                }
                s.generation += 1;
                s.status = FetchStatus::Idle;
                true
            });
        }
    }

    fn lock_inflight(&self) -> MutexGuard<'_, InFlight> {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for QueryFetchController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_search(
    catalog: Arc<dyn CatalogApi>,
    state: Arc<watch::Sender<SearchState>>,
    query: String,
    generation: u64,
    cancel: CancellationToken,
) {
    let outcome = catalog.search(&query, &cancel).await;

    state.send_if_modified(|s| {
        if s.generation != generation || cancel.is_cancelled() {
            debug!(query = %query, generation, "Discarding stale search response");
            return false;
        }
        match outcome {
            Ok(results) => {
                debug!(query = %query, count = results.len(), "Search loaded");
                s.status = FetchStatus::Loaded;
                s.results = results;
                s.error.clear();
                true
            }
            Err(CatalogError::Cancelled) => {
                debug!(query = %query, "Search gave up without a result");
                s.status = FetchStatus::Idle;
                true
            }
            Err(e) => {
                warn!(query = %query, "Search failed: {}", e);
                s.status = FetchStatus::Failed;
                s.results.clear();
                s.error = e.to_string();
                true
            }
        }
    });
}
