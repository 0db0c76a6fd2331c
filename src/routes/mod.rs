// Route exports
pub mod account;
pub mod feed;
pub mod listings;

use actix_web::{http::StatusCode, web, HttpResponse};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::core::{FeedError, MatchPredicate, PaginationError, SourceError};
use crate::models::{Category, ErrorResponse};
use crate::services::{BackendClient, ImageStore, InboxChannel, SessionHandle, SessionRegistry, TokenStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<BackendClient>,
    pub inbox: InboxChannel,
    pub images: Arc<dyn ImageStore>,
    pub tokens: Arc<dyn TokenStore>,
    pub sessions: SessionRegistry,
    pub predicate: Arc<dyn MatchPredicate>,
    pub presentation: Duration,
    pub swipe_threshold: f64,
    pub merge_categories: Vec<Category>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(account::configure)
            .configure(feed::configure)
            .configure(listings::configure),
    );
}

pub(crate) fn error_response(status: StatusCode, error: &str, message: impl ToString) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.to_string(),
        status_code: status.as_u16(),
    })
}

pub(crate) fn source_error(err: &SourceError) -> HttpResponse {
    match err {
        SourceError::Unauthorized => error_response(StatusCode::UNAUTHORIZED, "unauthorized", err),
        SourceError::UnsupportedCategory(_) => error_response(StatusCode::BAD_REQUEST, "unsupported_category", err),
        _ => error_response(StatusCode::BAD_GATEWAY, "backend_unavailable", err),
    }
}

pub(crate) fn feed_error(err: FeedError) -> HttpResponse {
    match err {
        FeedError::Busy | FeedError::NoPendingMatch => {
            error_response(StatusCode::CONFLICT, "transition_pending", err)
        }
        FeedError::Empty => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, "unusable_feed", err)
        }
    }
}

pub(crate) fn pagination_error(err: PaginationError) -> HttpResponse {
    match &err {
        PaginationError::Exhausted(_) => error_response(StatusCode::CONFLICT, "no_more_pages", &err),
        PaginationError::InFlight(_) | PaginationError::StaleTicket(_) => {
            error_response(StatusCode::CONFLICT, "fetch_in_flight", &err)
        }
        PaginationError::Source { source, .. } => source_error(source),
    }
}

pub(crate) async fn find_session(state: &AppState, id: &Uuid) -> Result<SessionHandle, HttpResponse> {
    state.sessions.get(id).await.ok_or_else(|| {
        error_response(
            StatusCode::NOT_FOUND,
            "session_not_found",
            format!("No open session {}", id),
        )
    })
}
