use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::models::domain::{Category, MatchEvent, Profile, RouteRequest};

/// Snapshot of the discovery feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedStateResponse {
    pub phase: String,
    #[serde(rename = "profileIndex")]
    pub profile_index: usize,
    #[serde(rename = "imageIndex")]
    pub image_index: usize,
    #[serde(rename = "profileCount")]
    pub profile_count: usize,
    pub profile: Profile,
    pub image: String,
    #[serde(rename = "matchEvent")]
    pub match_event: Option<MatchEvent>,
}

/// Response for opening a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    #[serde(rename = "sessionId")]
    pub session_id: Uuid,
    pub feed: FeedStateResponse,
}

/// Response for dismissing the match dialog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DismissResponse {
    pub feed: FeedStateResponse,
    pub navigate: Option<RouteRequest>,
}

/// One category's accumulated (or filtered) items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub category: Category,
    pub page: u32,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
    pub total: usize,
    pub items: Vec<T>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

/// Image upload response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}
