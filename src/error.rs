/// Failures of a single catalog call. The display strings are what the user sees.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("{0}")]
    NetworkFailure(String),

    #[error("Movie not found")]
    NotFound,

    /// Superseded by a newer request or by teardown. Never shown to the user.
    #[error("request cancelled")]
    Cancelled,
}

impl CatalogError {
    pub(crate) fn network() -> Self {
        CatalogError::NetworkFailure("Something went wrong with fetching movies".to_string())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CatalogError::Cancelled)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RatingError {
    #[error("Rating must be between 1 and 10, got {0}")]
    OutOfRange(u8),
}

/// Intents the session refuses in its current state.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("No movie is open")]
    NothingSelected,

    #[error("{0} is not the open movie")]
    NotSelected(String),

    #[error("The loaded detail does not belong to {0}")]
    DetailMismatch(String),

    #[error("{0} is already on the watched list")]
    AlreadyWatched(String),

    #[error(transparent)]
    Rating(#[from] RatingError),
}
