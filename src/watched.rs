use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::models::{WatchedEntry, WatchedSummary};

/// Fixed key the watched list is stored under.
pub const STORAGE_KEY: &str = "watched";

/// Durable home of the watched list. Loaded once, saved after every change.
pub trait WatchedStore: Send + Sync {
    fn load(&self) -> Result<Vec<WatchedEntry>>;
    fn save(&self, entries: &[WatchedEntry]) -> Result<()>;
}

/// Stores the list as JSON in `<dir>/watched.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{STORAGE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WatchedStore for JsonFileStore {
    fn load(&self) -> Result<Vec<WatchedEntry>> {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No watched list at {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read {}", self.path.display()));
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(
                    "Ignoring unreadable watched list at {}: {}",
                    self.path.display(),
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, entries: &[WatchedEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_vec_pretty(entries).context("Failed to encode watched list")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

/// Keeps the list in memory only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<WatchedEntry>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn with_entries(entries: Vec<WatchedEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
            saves: Mutex::new(0),
        }
    }

    /// How many times `save` has been called.
    pub fn saves(&self) -> usize {
        *self.saves.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl WatchedStore for MemoryStore {
    fn load(&self) -> Result<Vec<WatchedEntry>> {
        Ok(self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, entries: &[WatchedEntry]) -> Result<()> {
        *self.entries.lock().unwrap_or_else(|e| e.into_inner()) = entries.to_vec();
        *self.saves.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }
}

/// The user's rated movies, at most one entry per id.
pub struct WatchedList<S: WatchedStore> {
    store: S,
    entries: Vec<WatchedEntry>,
}

impl<S: WatchedStore> WatchedList<S> {
    pub fn open(store: S) -> Result<Self> {
        let mut entries = store.load().context("Failed to load watched list")?;
        let before = entries.len();
        dedupe_by_id(&mut entries);
        if entries.len() != before {
            warn!(
                "Dropped {} duplicate watched entries",
                before - entries.len()
            );
        }
        debug!(count = entries.len(), "Loaded watched list");
        Ok(Self { store, entries })
    }

    pub fn entries(&self) -> &[WatchedEntry] {
        &self.entries
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn get(&self, id: &str) -> Option<&WatchedEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Returns `false` without saving when the id is already on the list.
    pub fn add(&mut self, entry: WatchedEntry) -> Result<bool> {
        if self.contains(entry.id()) {
            debug!(id = entry.id(), "Already watched, not adding");
            return Ok(false);
        }
        let mut next = self.entries.clone();
        next.push(entry);
        self.replace(next)?;
        Ok(true)
    }

    /// Returns `false` without saving when the id is not on the list.
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        if !self.contains(id) {
            return Ok(false);
        }
        let next: Vec<WatchedEntry> = self
            .entries
            .iter()
            .filter(|e| e.id() != id)
            .cloned()
            .collect();
        self.replace(next)?;
        Ok(true)
    }

    pub fn summary(&self) -> WatchedSummary {
        let imdb: Vec<f64> = self
            .entries
            .iter()
            .filter_map(|e| e.movie.rating)
            .map(f64::from)
            .collect();
        let user: Vec<f64> = self
            .entries
            .iter()
            .map(|e| f64::from(e.user_rating))
            .collect();
        let runtime: Vec<f64> = self.entries.iter().map(|e| e.runtime_minutes()).collect();
        WatchedSummary {
            count: self.entries.len(),
            avg_imdb_rating: average(&imdb),
            avg_user_rating: average(&user),
            avg_runtime: average(&runtime),
        }
    }

    /// Swaps in `next` once the store has accepted it.
    fn replace(&mut self, next: Vec<WatchedEntry>) -> Result<()> {
        self.store
            .save(&next)
            .context("Failed to save watched list")?;
        self.entries = next;
        Ok(())
    }
}

fn dedupe_by_id(entries: &mut Vec<WatchedEntry>) {
    let mut seen = std::collections::HashSet::new();
    entries.retain(|e| seen.insert(e.id().to_string()));
}

fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MovieDetail, SearchResult};

    fn entry(id: &str, imdb: Option<f32>, user: u8, runtime: &str) -> WatchedEntry {
        WatchedEntry {
            movie: MovieDetail {
                summary: SearchResult {
                    id: id.to_string(),
                    title: format!("Movie {id}"),
                    ..SearchResult::default()
                },
                rating: imdb,
                runtime: runtime.to_string(),
                ..MovieDetail::default()
            },
            user_rating: user,
            rating_change_count: 1,
        }
    }

    #[test]
    fn add_rejects_duplicate_ids() {
        let mut list = WatchedList::open(MemoryStore::default()).unwrap();
        assert!(list.add(entry("tt1", Some(8.0), 9, "120")).unwrap());
        assert!(!list.add(entry("tt1", Some(8.0), 3, "120")).unwrap());
        assert_eq!(list.entries().len(), 1);
        assert_eq!(list.get("tt1").map(|e| e.user_rating), Some(9));
        assert_eq!(list.store().saves(), 1);
    }

    #[test]
    fn removing_absent_id_changes_nothing() {
        let store = MemoryStore::with_entries(vec![entry("tt1", None, 5, "90")]);
        let mut list = WatchedList::open(store).unwrap();
        let before = list.entries().to_vec();
        assert!(!list.remove("tt404").unwrap());
        assert_eq!(list.entries(), before.as_slice());
        assert_eq!(list.store().saves(), 0);
    }

    #[test]
    fn remove_saves_the_shorter_list() {
        let store = MemoryStore::with_entries(vec![
            entry("tt1", None, 5, "90"),
            entry("tt2", None, 6, "100"),
        ]);
        let mut list = WatchedList::open(store).unwrap();
        assert!(list.remove("tt1").unwrap());
        assert!(!list.contains("tt1"));
        let saved = list.store().load().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id(), "tt2");
    }

    struct ReadOnlyStore(Vec<WatchedEntry>);

    impl WatchedStore for ReadOnlyStore {
        fn load(&self) -> Result<Vec<WatchedEntry>> {
            Ok(self.0.clone())
        }

        fn save(&self, _entries: &[WatchedEntry]) -> Result<()> {
            anyhow::bail!("disk full")
        }
    }

    #[test]
    fn failed_save_leaves_list_unchanged() {
        let store = ReadOnlyStore(vec![entry("tt1", None, 5, "90")]);
        let mut list = WatchedList::open(store).unwrap();
        let before = list.entries().to_vec();

        let err = list.add(entry("tt2", None, 7, "100")).unwrap_err();
        assert!(format!("{err:#}").contains("disk full"));
        assert!(!list.contains("tt2"));

        assert!(list.remove("tt1").is_err());
        assert!(list.contains("tt1"));
        assert_eq!(list.entries(), before.as_slice());
    }

    #[test]
    fn open_drops_duplicate_ids_from_storage() {
        let store = MemoryStore::with_entries(vec![
            entry("tt1", None, 5, "90"),
            entry("tt1", None, 7, "90"),
        ]);
        let list = WatchedList::open(store).unwrap();
        assert_eq!(list.entries().len(), 1);
        assert_eq!(list.entries()[0].user_rating, 5);
    }

    #[test]
    fn summary_averages_and_skips_missing_imdb_ratings() {
        let store = MemoryStore::with_entries(vec![
            entry("tt1", Some(8.0), 10, "120"),
            entry("tt2", None, 6, "90 min"),
            entry("tt3", Some(6.0), 8, "N/A"),
        ]);
        let summary = WatchedList::open(store).unwrap().summary();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.avg_imdb_rating, 7.0);
        assert_eq!(summary.avg_user_rating, 8.0);
        assert_eq!(summary.avg_runtime, 70.0);
    }

    #[test]
    fn empty_summary_is_zero() {
        let summary = WatchedList::open(MemoryStore::default()).unwrap().summary();
        assert_eq!(summary, WatchedSummary::default());
    }

    #[test]
    fn file_store_round_trips_and_survives_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load().unwrap().is_empty());

        let mut list = WatchedList::open(store.clone()).unwrap();
        list.add(entry("tt0120338", Some(7.9), 9, "194")).unwrap();

        let reopened = WatchedList::open(JsonFileStore::new(dir.path())).unwrap();
        assert_eq!(reopened.entries(), list.entries());
        assert_eq!(store.path(), dir.path().join("watched.json"));
    }

    #[test]
    fn file_store_uses_camel_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.save(&[entry("tt1", Some(8.0), 9, "120")]).unwrap();
        let raw: serde_json::Value =
            serde_json::from_slice(&fs::read(store.path()).unwrap()).unwrap();
        let first = &raw[0];
        assert_eq!(first["imdbID"], "tt1");
        assert_eq!(first["userRating"], 9);
        assert_eq!(first["ratingChangeCount"], 1);
        assert_eq!(first["posterUrl"], "");
    }

    #[test]
    fn file_store_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        fs::write(store.path(), b"{not json").unwrap();
        assert!(store.load().unwrap().is_empty());
    }
}
