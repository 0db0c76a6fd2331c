// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    age_from_birth, Category, ChatEntry, FilterCriteria, Gender, Identified, InterestedIn,
    MatchEvent, Profile, ProfileAttributes, RouteRequest, TripListing, ALL_CITIES,
};
pub use requests::{DismissAction, DismissRequest, SetTokenRequest, SwipeRequest, TapRequest, TravelDetailsForm};
pub use responses::{
    DismissResponse, ErrorResponse, FeedStateResponse, HealthResponse, PageResponse,
    SessionResponse, UploadResponse,
};
