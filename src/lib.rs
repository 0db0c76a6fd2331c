//! TripMate Feed - client core for the TripMate companion app
//!
//! This library holds the client-side logic with real algorithmic content:
//! the swipe/feed-advance state machine, per-category pagination with
//! identifier dedup, and the listing filter evaluator. The `routes` module
//! exposes them as a local HTTP daemon for the UI shell.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{apply_filter, CityMatch, FeedMachine, LikeOutcome, PageSource, Paginator, SessionContext};
pub use models::{Category, ChatEntry, FilterCriteria, MatchEvent, Profile, TripListing};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let paginator: Paginator<TripListing> = Paginator::new();
        assert!(paginator.has_more(Category::Cities));
        assert_eq!(paginator.page(Category::Cities), 1);
    }
}
