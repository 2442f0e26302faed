use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::info;

use crate::controller::{DetailFetchController, QueryFetchController};
use crate::error::SessionError;
use crate::models::WatchedEntry;
use crate::omdb::CatalogApi;
use crate::rating::RatingDraft;
use crate::watched::{WatchedList, WatchedStore};

/// Everything one user sees: the search box, the open movie and the watched list.
pub struct Session<S: WatchedStore> {
    search: QueryFetchController,
    detail: DetailFetchController,
    watched: WatchedList<S>,
    selected: Option<String>,
    draft: RatingDraft,
}

impl<S: WatchedStore> Session<S> {
    pub fn new(catalog: Arc<dyn CatalogApi>, watched: WatchedList<S>) -> Self {
        Self {
            search: QueryFetchController::new(catalog.clone()),
            detail: DetailFetchController::new(catalog),
            watched,
            selected: None,
            draft: RatingDraft::new(),
        }
    }

    pub fn search(&self) -> &QueryFetchController {
        &self.search
    }

    pub fn detail(&self) -> &DetailFetchController {
        &self.detail
    }

    pub fn watched(&self) -> &WatchedList<S> {
        &self.watched
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn draft(&self) -> &RatingDraft {
        &self.draft
    }

    pub fn set_query(&self, query: &str) {
        self.search.set_query(query);
    }

    /// Opens `id`, or closes it when it is already open. Returns the open id.
    pub fn select(&mut self, id: &str) -> Option<&str> {
        if self.selected.as_deref() == Some(id) {
            self.close();
            return None;
        }
        self.selected = Some(id.to_string());
        self.draft = RatingDraft::new();
        self.detail.select(id);
        self.selected.as_deref()
    }

    pub fn close(&mut self) {
        self.selected = None;
        self.draft = RatingDraft::new();
        self.detail.clear();
    }

    pub fn rate(&mut self, id: &str, value: u8) -> Result<(), SessionError> {
        match self.selected.as_deref() {
            None => return Err(SessionError::NothingSelected),
            Some(open) if open != id => return Err(SessionError::NotSelected(id.to_string())),
            Some(_) => {}
        }
        if self.watched.contains(id) {
            return Err(SessionError::AlreadyWatched(id.to_string()));
        }
        self.draft.set_rating(value)?;
        Ok(())
    }

    /// Keeps the open movie with the drafted rating and closes it.
    ///
    /// Waits for the detail to finish loading. Returns `None` when no rating
    /// has been drafted yet.
    pub async fn add_watched(&mut self) -> Result<Option<WatchedEntry>> {
        let id = self
            .selected
            .clone()
            .ok_or(SessionError::NothingSelected)?;
        let detail = self.detail.settled().await;
        if !detail.error.is_empty() {
            return Err(anyhow!("Cannot add {}: {}", id, detail.error));
        }
        if detail.id.as_deref() != Some(id.as_str()) || detail.movie.id() != id {
            return Err(SessionError::DetailMismatch(id).into());
        }
        let Some(entry) = self.draft.commit(&detail.movie) else {
            return Ok(None);
        };
        if !self.watched.add(entry.clone())? {
            return Err(SessionError::AlreadyWatched(id).into());
        }
        info!(
            "Added '{}' with rating {}",
            entry.movie.title(),
            entry.user_rating
        );
        self.close();
        Ok(Some(entry))
    }

    pub fn remove(&mut self, id: &str) -> Result<bool> {
        let removed = self.watched.remove(id)?;
        if removed {
            info!("Removed {} from watched list", id);
        }
        Ok(removed)
    }

    pub fn watched_rating(&self, id: &str) -> Option<u8> {
        self.watched.get(id).map(|e| e.user_rating)
    }

    /// Cancels any request still running.
    pub fn shutdown(&self) {
        self.search.shutdown();
        self.detail.clear();
    }
}
