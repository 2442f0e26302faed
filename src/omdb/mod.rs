use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::CatalogError;
use crate::models::{MovieDetail, SearchResult};

mod client;
mod map;

pub use client::{OmdbClient, OMDB_BASE};

/// Read-only movie catalog. Both calls return [`CatalogError::Cancelled`] once
/// `cancel` fires, without waiting for the response.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn search(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, CatalogError>;

    async fn fetch_detail(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<MovieDetail, CatalogError>;
}

#[async_trait]
impl CatalogApi for OmdbClient {
    async fn search(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, CatalogError> {
        let envelope = self.get_json(&[("s", query)], cancel).await?;
        map::map_search(envelope)
    }

    async fn fetch_detail(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<MovieDetail, CatalogError> {
        let record = self.get_json(&[("i", id)], cancel).await?;
        map::map_detail(record)
    }
}
