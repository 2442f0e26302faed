use crate::error::RatingError;
use crate::models::{MovieDetail, WatchedEntry};

pub const MAX_RATING: u8 = 10;

/// The star rating being chosen for the open detail, before it is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RatingDraft {
    rating: u8,
    changes: u32,
}

impl RatingDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rating(&self) -> Option<u8> {
        (self.rating > 0).then_some(self.rating)
    }

    /// Number of times the user changed their mind, including the first pick.
    pub fn changes(&self) -> u32 {
        self.changes
    }

    pub fn set_rating(&mut self, value: u8) -> Result<(), RatingError> {
        if !(1..=MAX_RATING).contains(&value) {
            return Err(RatingError::OutOfRange(value));
        }
        if value != self.rating {
            self.rating = value;
            self.changes += 1;
        }
        Ok(())
    }

    pub fn commit(&self, detail: &MovieDetail) -> Option<WatchedEntry> {
        let user_rating = self.rating()?;
        let mut movie = detail.clone();
        movie.runtime = movie
            .runtime
            .split_whitespace()
            .next()
            .unwrap_or("0")
            .to_string();
        Some(WatchedEntry {
            movie,
            user_rating,
            rating_change_count: self.changes,
        })
    }
}
