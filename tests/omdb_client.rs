use httpmock::prelude::*;
use popcorn::controller::{DetailFetchController, FetchStatus, QueryFetchController};
use popcorn::error::CatalogError;
use popcorn::models::{MovieDetail, SearchResult};
use popcorn::omdb::{CatalogApi, OmdbClient};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

const API_KEY: &str = "test-key";

fn client_for(server: &MockServer) -> OmdbClient {
    OmdbClient::new(server.url("/"), API_KEY).expect("client builds")
}

#[tokio::test]
async fn search_normalizes_success_envelope() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/")
                .query_param("apikey", API_KEY)
                .query_param("s", "titanic");
            then.status(200).json_body(json!({
                "Response": "True",
                "totalResults": "1",
                "Search": [{
                    "Title": "Titanic",
                    "Year": "1997",
                    "Poster": "url",
                    "imdbID": "tt0120338",
                    "Type": "movie"
                }]
            }));
        })
        .await;

    let results = client_for(&server)
        .search("titanic", &CancellationToken::new())
        .await
        .expect("search succeeds");

    mock.assert_async().await;
    assert_eq!(
        results,
        vec![SearchResult {
            id: "tt0120338".to_string(),
            title: "Titanic".to_string(),
            year: "1997".to_string(),
            poster_url: "url".to_string(),
        }]
    );
}

#[tokio::test]
async fn search_encodes_query() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/").query_param("s", "the matrix & co");
            then.status(200)
                .json_body(json!({ "Response": "True", "Search": [] }));
        })
        .await;

    let results = client_for(&server)
        .search("the matrix & co", &CancellationToken::new())
        .await
        .expect("search succeeds");

    mock.assert_async().await;
    assert!(results.is_empty());
}

#[tokio::test]
async fn false_response_is_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).query_param("s", "zzzzzz");
            then.status(200)
                .json_body(json!({ "Response": "False", "Error": "Movie not found!" }));
        })
        .await;

    let err = client_for(&server)
        .search("zzzzzz", &CancellationToken::new())
        .await
        .expect_err("should fail");
    assert_eq!(err, CatalogError::NotFound);
}

#[tokio::test]
async fn server_error_is_network_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(500).body("boom");
        })
        .await;

    let err = client_for(&server)
        .search("titanic", &CancellationToken::new())
        .await
        .expect_err("should fail");
    assert_eq!(
        err,
        CatalogError::NetworkFailure("Something went wrong with fetching movies".to_string())
    );
}

#[tokio::test]
async fn unreadable_body_is_network_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(200).body("<html>not json</html>");
        })
        .await;

    let err = client_for(&server)
        .search("titanic", &CancellationToken::new())
        .await
        .expect_err("should fail");
    assert!(matches!(err, CatalogError::NetworkFailure(_)));
}

#[tokio::test]
async fn cancellation_abandons_slow_response() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(200)
                .delay(Duration::from_secs(5))
                .json_body(json!({ "Response": "True", "Search": [] }));
        })
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = client_for(&server)
        .search("titanic", &cancel)
        .await
        .expect_err("should be cancelled");
    assert_eq!(err, CatalogError::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn detail_maps_record() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .query_param("apikey", API_KEY)
                .query_param("i", "tt0120338");
            then.status(200).json_body(json!({
                "Title": "Titanic",
                "Year": "1997",
                "Poster": "url",
                "imdbID": "tt0120338",
                "imdbRating": "7.9",
                "Runtime": "194 min",
                "Plot": "A seventeen-year-old aristocrat falls in love.",
                "Released": "19 Dec 1997",
                "Actors": "Leonardo DiCaprio, Kate Winslet",
                "Director": "James Cameron",
                "Genre": "Drama, Romance",
                "Response": "True"
            }));
        })
        .await;

    let detail = client_for(&server)
        .fetch_detail("tt0120338", &CancellationToken::new())
        .await
        .expect("detail succeeds");

    mock.assert_async().await;
    assert_eq!(detail.title(), "Titanic");
    assert_eq!(detail.rating, Some(7.9));
    assert_eq!(detail.runtime, "194 min");
    assert_eq!(detail.actors, "Leonardo DiCaprio, Kate Winslet");
}

#[tokio::test]
async fn search_controller_over_http() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).query_param("s", "titanic");
            then.status(200).json_body(json!({
                "Response": "True",
                "Search": [{ "Title": "Titanic", "Year": "1997", "Poster": "url", "imdbID": "tt0120338" }]
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).query_param("s", "zzzzzz");
            then.status(200).json_body(json!({ "Response": "False" }));
        })
        .await;

    let controller = QueryFetchController::new(Arc::new(client_for(&server)));

    controller.set_query("titanic");
    let state = controller.settled().await;
    assert_eq!(state.status, FetchStatus::Loaded);
    assert_eq!(state.results.len(), 1);
    assert_eq!(state.results[0].id, "tt0120338");

    controller.set_query("zzzzzz");
    let state = controller.settled().await;
    assert_eq!(state.error, "Movie not found");
    assert!(state.results.is_empty());
}

#[tokio::test]
async fn detail_controller_reports_http_500() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).query_param("i", "tt0120338");
            then.status(500);
        })
        .await;

    let controller = DetailFetchController::new(Arc::new(client_for(&server)));
    controller.select("tt0120338");
    let state = controller.settled().await;

    assert!(!state.is_loading);
    assert!(!state.error.is_empty());
    assert_eq!(state.movie, MovieDetail::default());
}
