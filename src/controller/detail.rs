use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CatalogError;
use crate::models::MovieDetail;
use crate::omdb::CatalogApi;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailState {
    pub id: Option<String>,
    pub movie: MovieDetail,
    pub is_loading: bool,
    pub error: String,
}

/// Fetches the full record for whichever id is selected.
///
/// Selecting another id cancels the previous request, and a completion is
/// only applied while its id is still the selected one, so the record on
/// screen always belongs to `id`.
pub struct DetailFetchController {
    catalog: Arc<dyn CatalogApi>,
    state: Arc<watch::Sender<DetailState>>,
    current: Mutex<Option<CancellationToken>>,
}

impl DetailFetchController {
    pub fn new(catalog: Arc<dyn CatalogApi>) -> Self {
        let (state, _) = watch::channel(DetailState::default());
        Self {
            catalog,
            state: Arc::new(state),
            current: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DetailState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> DetailState {
        self.state.borrow().clone()
    }

    pub async fn settled(&self) -> DetailState {
        let mut rx = self.state.subscribe();
        let settled = match rx.wait_for(|s| !s.is_loading).await {
            Ok(state) => (*state).clone(),
            Err(_) => self.snapshot(),
        };
        settled
    }

    /// Starts a fetch when `id` differs from the current one.
    pub fn select(&self, id: &str) {
        let mut current = self.lock_current();
        let changed = self.state.send_if_modified(|s| {
            if s.id.as_deref() == Some(id) {
                return false;
            }
            s.id = Some(id.to_string());
            s.is_loading = true;
            s.error.clear();
            true
        });
        if !changed {
            return;
        }

        if let Some(prev) = current.take() {
            prev.cancel();
        }
        let cancel = CancellationToken::new();
        *current = Some(cancel.clone());

        debug!(id, "Fetching movie detail");
        tokio::spawn(run_detail(
            self.catalog.clone(),
            self.state.clone(),
            id.to_string(),
            cancel,
        ));
    }

    /// Forgets the current id and cancels its request.
    pub fn clear(&self) {
        let mut current = self.lock_current();
        if let Some(cancel) = current.take() {
            cancel.cancel();
        }
        self.state.send_modify(|s| {
            s.id = None;
            s.is_loading = false;
            s.error.clear();
        });
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for DetailFetchController {
    fn drop(&mut self) {
        if let Some(cancel) = self.lock_current().take() {
            cancel.cancel();
        }
    }
}

async fn run_detail(
    catalog: Arc<dyn CatalogApi>,
    state: Arc<watch::Sender<DetailState>>,
    id: String,
    cancel: CancellationToken,
) {
    let outcome = catalog.fetch_detail(&id, &cancel).await;

    state.send_if_modified(|s| {
        if s.id.as_deref() != Some(id.as_str()) || cancel.is_cancelled() {
            debug!(id = %id, "Discarding detail for an id no longer selected");
            return false;
        }
        s.is_loading = false;
        match outcome {
            Ok(movie) => {
                s.movie = movie;
                s.error.clear();
            }
            Err(CatalogError::Cancelled) => {
                debug!(id = %id, "Detail request gave up");
            }
            Err(e) => {
                warn!(id = %id, "Detail fetch failed: {}", e);
                s.error = e.to_string();
            }
        }
        true
    });
}
