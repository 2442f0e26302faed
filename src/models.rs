use serde::{Deserialize, Serialize};

/// One row of a catalog search.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(rename = "imdbID")]
    pub id: String,
    pub title: String,
    pub year: String,
    pub poster_url: String,
}

/// Full record for a single catalog id.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDetail {
    #[serde(flatten)]
    pub summary: SearchResult,
    #[serde(rename = "imdbRating", default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub runtime: String,
    #[serde(default)]
    pub plot: String,
    #[serde(default)]
    pub released: String,
    #[serde(default)]
    pub actors: String,
    #[serde(default)]
    pub director: String,
    #[serde(default)]
    pub genre: String,
}

impl MovieDetail {
    pub fn id(&self) -> &str {
        &self.summary.id
    }

    pub fn title(&self) -> &str {
        &self.summary.title
    }
}

/// A detail the user rated and kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedEntry {
    #[serde(flatten)]
    pub movie: MovieDetail,
    pub user_rating: u8,
    #[serde(default)]
    pub rating_change_count: u32,
}

impl WatchedEntry {
    pub fn id(&self) -> &str {
        self.movie.id()
    }

    /// Runtime in minutes from the leading digits of `runtime`, 0 when there are none.
    pub fn runtime_minutes(&self) -> f64 {
        let digits: String = self
            .movie
            .runtime
            .trim_start()
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().unwrap_or(0.0)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct WatchedSummary {
    pub count: usize,
    pub avg_imdb_rating: f64,
    pub avg_user_rating: f64,
    pub avg_runtime: f64,
}
