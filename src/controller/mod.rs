mod detail;
mod search;

pub use detail::{DetailFetchController, DetailState};
pub use search::{FetchStatus, QueryFetchController, SearchState, MIN_QUERY_CHARS};
