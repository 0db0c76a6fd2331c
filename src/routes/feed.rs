use actix_web::{http::StatusCode, web, HttpResponse};
use uuid::Uuid;

use super::{error_response, feed_error, find_session, source_error, AppState};
use crate::core::{FeedMachine, FeedPhase, LikeOutcome};
use crate::models::{
    DismissAction, DismissRequest, DismissResponse, FeedStateResponse, RouteRequest,
    SessionResponse, SwipeRequest, TapRequest,
};
use crate::services::{load_context, Session};

/// Configure session and feed routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/sessions", web::post().to(open_session))
        .route("/sessions/{id}", web::delete().to(close_session))
        .route("/sessions/{id}/feed", web::get().to(get_feed))
        .route("/sessions/{id}/feed/like", web::post().to(like))
        .route("/sessions/{id}/feed/dislike", web::post().to(dislike))
        .route("/sessions/{id}/feed/next-image", web::post().to(next_image))
        .route("/sessions/{id}/feed/previous-image", web::post().to(previous_image))
        .route("/sessions/{id}/feed/swipe", web::post().to(swipe))
        .route("/sessions/{id}/feed/tap", web::post().to(tap))
        .route("/sessions/{id}/feed/dismiss", web::post().to(dismiss_match));
}

pub(crate) fn feed_state(feed: &FeedMachine) -> FeedStateResponse {
    let cursor = feed.cursor();
    FeedStateResponse {
        phase: feed.phase().name().to_string(),
        profile_index: cursor.profile_index,
        image_index: cursor.image_index,
        profile_count: feed.len(),
        profile: feed.current_profile().clone(),
        image: feed.current_image().to_string(),
        match_event: match feed.phase() {
            FeedPhase::MatchFound(event) => Some(event.clone()),
            _ => None,
        },
    }
}

/// Open a session: snapshot credentials and load the discovery feed
///
/// POST /api/v1/sessions
async fn open_session(state: web::Data<AppState>) -> HttpResponse {
    let ctx = load_context(state.tokens.as_ref()).await;

    let profiles = match state.backend.fetch_profiles(&ctx).await {
        Ok(profiles) => profiles,
        Err(e) => {
            tracing::error!("Failed to load feed profiles: {}", e);
            return source_error(&e);
        }
    };

    let feed = match FeedMachine::new(profiles, state.predicate.clone()) {
        Ok(feed) => feed.with_swipe_threshold(state.swipe_threshold),
        Err(e) => {
            tracing::warn!("Cannot start feed: {}", e);
            return feed_error(e);
        }
    };

    let snapshot = feed_state(&feed);
    let session_id = match state
        .sessions
        .open(Session::new(ctx, feed, &state.merge_categories))
        .await
    {
        Ok(id) => id,
        Err(e) => return error_response(StatusCode::SERVICE_UNAVAILABLE, "too_many_sessions", e),
    };

    HttpResponse::Created().json(SessionResponse {
        session_id,
        feed: snapshot,
    })
}

/// DELETE /api/v1/sessions/{id}
async fn close_session(state: web::Data<AppState>, path: web::Path<Uuid>) -> HttpResponse {
    let id = path.into_inner();
    if state.sessions.close(&id).await {
        HttpResponse::NoContent().finish()
    } else {
        error_response(StatusCode::NOT_FOUND, "session_not_found", format!("No open session {}", id))
    }
}

async fn get_feed(state: web::Data<AppState>, path: web::Path<Uuid>) -> HttpResponse {
    let handle = match find_session(&state, &path).await {
        Ok(handle) => handle,
        Err(resp) => return resp,
    };
    let session = handle.lock().await;
    HttpResponse::Ok().json(feed_state(&session.feed))
}

/// POST /api/v1/sessions/{id}/feed/like
///
/// A match holds the feed until dismissed; otherwise the feed advances once
/// the presentation interval elapses.
async fn like(state: web::Data<AppState>, path: web::Path<Uuid>) -> HttpResponse {
    let id = path.into_inner();
    let handle = match find_session(&state, &id).await {
        Ok(handle) => handle,
        Err(resp) => return resp,
    };
    let mut session = handle.lock().await;

    match session.feed.like() {
        Ok(LikeOutcome::Matched(event)) => {
            tracing::info!("Session {} matched with {}", id, event.profile_id);
        }
        Ok(LikeOutcome::NoMatch(ticket)) => {
            state
                .sessions
                .finish_transient(id, &mut session, ticket, state.presentation);
        }
        Err(e) => return feed_error(e),
    }

    HttpResponse::Ok().json(feed_state(&session.feed))
}

/// POST /api/v1/sessions/{id}/feed/dislike
async fn dislike(state: web::Data<AppState>, path: web::Path<Uuid>) -> HttpResponse {
    let id = path.into_inner();
    let handle = match find_session(&state, &id).await {
        Ok(handle) => handle,
        Err(resp) => return resp,
    };
    let mut session = handle.lock().await;

    match session.feed.dislike() {
        Ok(ticket) => {
            state
                .sessions
                .finish_transient(id, &mut session, ticket, state.presentation);
            HttpResponse::Ok().json(feed_state(&session.feed))
        }
        Err(e) => feed_error(e),
    }
}

async fn next_image(state: web::Data<AppState>, path: web::Path<Uuid>) -> HttpResponse {
    image_step(&state, &path, |feed| feed.next_image()).await
}

async fn previous_image(state: web::Data<AppState>, path: web::Path<Uuid>) -> HttpResponse {
    image_step(&state, &path, |feed| feed.previous_image()).await
}

async fn swipe(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<SwipeRequest>,
) -> HttpResponse {
    let dx = req.dx;
    image_step(&state, &path, move |feed| feed.swipe(dx)).await
}

async fn tap(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<TapRequest>,
) -> HttpResponse {
    let TapRequest { x, width } = req.into_inner();
    image_step(&state, &path, move |feed| feed.tap(x, width)).await
}

async fn image_step<F>(state: &AppState, id: &Uuid, step: F) -> HttpResponse
where
    F: FnOnce(&mut FeedMachine) -> Result<bool, crate::core::FeedError>,
{
    let handle = match find_session(state, id).await {
        Ok(handle) => handle,
        Err(resp) => return resp,
    };
    let mut session = handle.lock().await;

    match step(&mut session.feed) {
        Ok(_) => HttpResponse::Ok().json(feed_state(&session.feed)),
        Err(e) => feed_error(e),
    }
}

/// Close the match dialog
///
/// POST /api/v1/sessions/{id}/feed/dismiss
///
/// Request body:
/// ```json
/// { "action": "keep_swiping|send_message" }
/// ```
async fn dismiss_match(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: Option<web::Json<DismissRequest>>,
) -> HttpResponse {
    let handle = match find_session(&state, &path).await {
        Ok(handle) => handle,
        Err(resp) => return resp,
    };
    let action = req.map(|r| r.action).unwrap_or_default();
    let mut session = handle.lock().await;

    let event = match session.feed.dismiss_match() {
        Ok(event) => event,
        Err(e) => return feed_error(e),
    };

    let navigate = match action {
        DismissAction::KeepSwiping => None,
        DismissAction::SendMessage => Some(
            RouteRequest::new("Chat")
                .with_param("userId", event.profile_id)
                .with_param("name", event.name),
        ),
    };

    HttpResponse::Ok().json(DismissResponse {
        feed: feed_state(&session.feed),
        navigate,
    })
}
