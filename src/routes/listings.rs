use actix_web::{http::StatusCode, web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::{error_response, find_session, pagination_error, source_error, AppState};
use crate::core::{apply_filter, validate_criteria, FetchKind, PageSource, Paginator, PaginationError};
use crate::models::{Category, ChatEntry, FilterCriteria, PageResponse, TravelDetailsForm, TripListing};
use crate::services::{Session, SessionHandle};

/// Configure listing, filter and trip routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/sessions/{id}/listings/{category}", web::get().to(get_listing))
        .route("/sessions/{id}/listings/{category}/{action}", web::post().to(fetch_listing))
        .route("/sessions/{id}/filter", web::get().to(get_filter))
        .route("/sessions/{id}/filter", web::put().to(set_filter))
        .route("/sessions/{id}/trips", web::post().to(publish_trip));
}

/// UI trigger that causes a page fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingAction {
    /// First page, or retry of the current one
    Next,
    /// Scrolled to the end
    More,
    /// Pull to refresh
    Refresh,
}

impl From<ListingAction> for FetchKind {
    fn from(action: ListingAction) -> Self {
        match action {
            ListingAction::Next => FetchKind::Next,
            ListingAction::More => FetchKind::More,
            ListingAction::Refresh => FetchKind::Refresh,
        }
    }
}

fn trips(session: &mut Session) -> &mut Paginator<TripListing> {
    &mut session.trips
}

fn chats(session: &mut Session) -> &mut Paginator<ChatEntry> {
    &mut session.chats
}

fn page_response<T: Clone>(paginator: &Paginator<T>, category: Category, items: Vec<T>) -> PageResponse<T>
where
    T: crate::models::Identified,
{
    PageResponse {
        category,
        page: paginator.page(category),
        has_more: paginator.has_more(category),
        total: paginator.items(category).len(),
        items,
    }
}

/// Accumulated items; trips are narrowed by the session's filter
///
/// GET /api/v1/sessions/{id}/listings/{category}
async fn get_listing(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Category)>,
) -> HttpResponse {
    let (id, category) = path.into_inner();
    let handle = match find_session(&state, &id).await {
        Ok(handle) => handle,
        Err(resp) => return resp,
    };
    let session = handle.lock().await;

    if category.is_trip() {
        let today = chrono::Utc::now().date_naive();
        let visible: Vec<TripListing> = apply_filter(session.trips.items(category), &session.filter, today)
            .into_iter()
            .cloned()
            .collect();
        HttpResponse::Ok().json(page_response(&session.trips, category, visible))
    } else {
        let items = session.chats.items(category).to_vec();
        HttpResponse::Ok().json(page_response(&session.chats, category, items))
    }
}

/// Fetch a page for one category
///
/// POST /api/v1/sessions/{id}/listings/{category}/{next|more|refresh}
async fn fetch_listing(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Category, ListingAction)>,
) -> HttpResponse {
    let (id, category, action) = path.into_inner();
    let handle = match find_session(&state, &id).await {
        Ok(handle) => handle,
        Err(resp) => return resp,
    };

    if category.is_trip() {
        run_fetch(handle, state.backend.clone(), category, action.into(), trips).await
    } else {
        run_fetch(handle, Arc::new(state.inbox.clone()), category, action.into(), chats).await
    }
}

/// Begin under the session lock, fetch without it, apply under it again
///
/// The fetch runs as its own task so a dropped client connection cannot leave
/// the category stuck in flight.
async fn run_fetch<S>(
    handle: SessionHandle,
    source: Arc<S>,
    category: Category,
    kind: FetchKind,
    select: fn(&mut Session) -> &mut Paginator<S::Item>,
) -> HttpResponse
where
    S: PageSource + 'static,
    S::Item: Clone + Serialize + 'static,
{
    let (ticket, ctx) = {
        let mut session = handle.lock().await;
        let ctx = session.ctx.clone();
        match select(&mut *session).begin(category, kind) {
            Ok(ticket) => (ticket, ctx),
            Err(e) => return pagination_error(e),
        }
    };

    let task_handle = handle.clone();
    let task = tokio::spawn(async move {
        let result = source.fetch_page(&ctx, category, ticket.page).await;
        let mut session = task_handle.lock().await;
        let paginator = select(&mut *session);
        let outcome = paginator.apply(ticket, result);
        outcome.map(|_| {
            let items = paginator.items(category).to_vec();
            page_response(paginator, category, items)
        })
    });

    match task.await {
        Ok(Ok(page)) => HttpResponse::Ok().json(page),
        Ok(Err(e)) => {
            if let PaginationError::Source { .. } = e {
                tracing::warn!("Fetch failed, state kept for retry: {}", e);
            }
            pagination_error(e)
        }
        Err(e) => {
            tracing::error!("Fetch task for {} failed: {}", category, e);
            select(&mut *handle.lock().await).cancel(ticket);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "fetch_failed", e)
        }
    }
}

async fn get_filter(state: web::Data<AppState>, path: web::Path<Uuid>) -> HttpResponse {
    let handle = match find_session(&state, &path).await {
        Ok(handle) => handle,
        Err(resp) => return resp,
    };
    let session = handle.lock().await;
    HttpResponse::Ok().json(&session.filter)
}

/// Replace the session's filter criteria
///
/// PUT /api/v1/sessions/{id}/filter
async fn set_filter(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<FilterCriteria>,
) -> HttpResponse {
    let criteria = req.into_inner();
    if let Err(e) = validate_criteria(&criteria) {
        tracing::info!("Rejected filter criteria: {}", e);
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", e);
    }

    let handle = match find_session(&state, &path).await {
        Ok(handle) => handle,
        Err(resp) => return resp,
    };
    let mut session = handle.lock().await;
    session.filter = criteria;

    HttpResponse::Ok().json(&session.filter)
}

/// Publish a travel-details form
///
/// POST /api/v1/sessions/{id}/trips
///
/// Request body:
/// ```json
/// {
///   "category": "cities|guider",
///   "fromCity": "string",
///   "toCity": "string",
///   "travelDate": "YYYY-MM-DD",
///   "seats": 1,
///   "notes": "string"
/// }
/// ```
async fn publish_trip(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: web::Json<TravelDetailsForm>,
) -> HttpResponse {
    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors);
    }
    if !req.category.is_trip() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Validation failed",
            format!("{} does not accept trips", req.category),
        );
    }

    let handle = match find_session(&state, &path).await {
        Ok(handle) => handle,
        Err(resp) => return resp,
    };
    let ctx = handle.lock().await.ctx.clone();

    match state.backend.publish_trip(&ctx, &req).await {
        Ok(trip) => {
            tracing::info!("Published trip {} from {} to {}", trip.id, req.from_city, req.to_city);
            HttpResponse::Created().json(trip)
        }
        Err(e) => {
            tracing::error!("Failed to publish trip: {}", e);
            source_error(&e)
        }
    }
}
