use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse};
use validator::Validate;

use super::{error_response, source_error, AppState};
use crate::models::{HealthResponse, SetTokenRequest, UploadResponse};
use crate::services::{load_context, ImageError, EMAIL_KEY, TOKEN_KEY};

/// Configure health, credential and image routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/auth/token", web::put().to(set_token))
        .route("/auth/token", web::delete().to(clear_token))
        .route("/images", web::post().to(upload_image))
        .route("/images/{id}", web::delete().to(delete_image));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sessions: state.sessions.count(),
        timestamp: chrono::Utc::now(),
    })
}

/// Store the bearer credential for sessions opened from now on
///
/// PUT /api/v1/auth/token
async fn set_token(state: web::Data<AppState>, req: web::Json<SetTokenRequest>) -> HttpResponse {
    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors);
    }

    let SetTokenRequest { token, email } = req.into_inner();
    state.tokens.set(TOKEN_KEY, token).await;
    match email {
        Some(email) => state.tokens.set(EMAIL_KEY, email).await,
        None => state.tokens.remove(EMAIL_KEY).await,
    }

    tracing::info!("Stored credentials");
    HttpResponse::NoContent().finish()
}

/// DELETE /api/v1/auth/token
async fn clear_token(state: web::Data<AppState>) -> HttpResponse {
    state.tokens.remove(TOKEN_KEY).await;
    state.tokens.remove(EMAIL_KEY).await;
    tracing::info!("Cleared credentials");
    HttpResponse::NoContent().finish()
}

fn image_error(err: ImageError) -> HttpResponse {
    match &err {
        ImageError::Empty => error_response(StatusCode::BAD_REQUEST, "empty_image", &err),
        ImageError::Backend(source) => source_error(source),
        ImageError::RequestError(_) | ImageError::InvalidResponse(_) => {
            error_response(StatusCode::BAD_GATEWAY, "image_store_unavailable", &err)
        }
    }
}

/// Upload raw image bytes; responds with the remote URI
///
/// POST /api/v1/images
async fn upload_image(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> HttpResponse {
    let content_type = req
        .headers()
        .get(actix_web::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let ctx = load_context(state.tokens.as_ref()).await;

    match state.images.upload(&ctx, body.to_vec(), &content_type).await {
        Ok(url) => HttpResponse::Created().json(UploadResponse { url }),
        Err(e) => {
            tracing::error!("Image upload failed: {}", e);
            image_error(e)
        }
    }
}

/// DELETE /api/v1/images/{id}
async fn delete_image(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let ctx = load_context(state.tokens.as_ref()).await;

    match state.images.delete(&ctx, &path).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => {
            tracing::error!("Image delete failed for {}: {}", path, e);
            image_error(e)
        }
    }
}
