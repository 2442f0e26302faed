//! Lenient mapping from raw OMDb records to our models.
//!
//! Every field is declared once on [`RawRecord`] with its source key, the
//! deserializer that checks its type, and a default. A field that is missing or
//! has the wrong type falls back to its default instead of failing the record.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::CatalogError;
use crate::models::{MovieDetail, SearchResult};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawRecord {
    #[serde(rename = "imdbID", deserialize_with = "text")]
    id: String,
    #[serde(rename = "Title", deserialize_with = "text")]
    title: String,
    #[serde(rename = "Year", deserialize_with = "text")]
    year: String,
    #[serde(rename = "Poster", deserialize_with = "text")]
    poster: String,
    #[serde(rename = "imdbRating", deserialize_with = "rating")]
    rating: Option<f32>,
    #[serde(rename = "Runtime", deserialize_with = "text")]
    runtime: String,
    #[serde(rename = "Plot", deserialize_with = "text")]
    plot: String,
    #[serde(rename = "Released", deserialize_with = "text")]
    released: String,
    #[serde(rename = "Actors", deserialize_with = "text")]
    actors: String,
    #[serde(rename = "Director", deserialize_with = "text")]
    director: String,
    #[serde(rename = "Genre", deserialize_with = "text")]
    genre: String,
}

impl RawRecord {
    /// Never fails: anything that is not an object becomes an all-default record.
    pub(crate) fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    fn into_summary(self) -> SearchResult {
        SearchResult {
            id: self.id,
            title: self.title,
            year: self.year,
            poster_url: self.poster,
        }
    }

    fn into_detail(self) -> MovieDetail {
        MovieDetail {
            summary: SearchResult {
                id: self.id,
                title: self.title,
                year: self.year,
                poster_url: self.poster,
            },
            rating: self.rating,
            runtime: self.runtime,
            plot: self.plot,
            released: self.released,
            actors: self.actors,
            director: self.director,
            genre: self.genre,
        }
    }
}

fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

fn rating<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let parsed = match Value::deserialize(deserializer)? {
        Value::String(s) => s.trim().parse::<f32>().ok(),
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        _ => None,
    };
    Ok(parsed.filter(|v| v.is_finite()))
}

/// OMDb signals "no matches" (and unknown ids) in the body, not the status.
fn reports_failure(envelope: &Value) -> bool {
    envelope.get("Response").and_then(Value::as_str) == Some("False")
}

pub(crate) fn map_search(envelope: Value) -> Result<Vec<SearchResult>, CatalogError> {
    if reports_failure(&envelope) {
        return Err(CatalogError::NotFound);
    }
    let entries = match envelope {
        Value::Object(mut obj) => match obj.remove("Search") {
            Some(Value::Array(entries)) => entries,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    Ok(entries
        .into_iter()
        .map(|entry| RawRecord::from_value(entry).into_summary())
        .collect())
}

pub(crate) fn map_detail(record: Value) -> Result<MovieDetail, CatalogError> {
    if reports_failure(&record) {
        return Err(CatalogError::NotFound);
    }
    Ok(RawRecord::from_value(record).into_detail())
}
