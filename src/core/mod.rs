// Core algorithm exports
pub mod feed;
pub mod filters;
pub mod pagination;
pub mod predicate;
pub mod source;

pub use feed::{FeedCursor, FeedError, FeedMachine, FeedPhase, LikeOutcome, TransientKind, TransitionTicket, DEFAULT_SWIPE_THRESHOLD};
pub use filters::{apply_filter, matches_criteria, validate_criteria, CriteriaError, Filterable};
pub use pagination::{DedupPolicy, FetchKind, FetchTicket, PaginationError, PaginationState, Paginator};
pub use predicate::{CityMatch, MatchPredicate};
pub use source::{PageSource, SessionContext, SourceError};
