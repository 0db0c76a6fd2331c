use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tripmate_feed::config::{LoggingSettings, Settings};
use tripmate_feed::core::CityMatch;
use tripmate_feed::routes::{self, AppState};
use tripmate_feed::services::{spawn_http_transport, BackendClient, InboxChannel, MemoryTokenStore, SessionRegistry};

/// JSON error response for extractor errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle path segment errors (unknown category or action, malformed id)
pub fn handle_path_error(err: error::PathError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("Path error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_path".to_string(),
        message: format!("Invalid path: {}", err),
        status_code: 404,
    }
    .into()
}

/// LOG_LEVEL and LOG_FORMAT override the `[logging]` section
fn init_logging(defaults: &LoggingSettings) {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| defaults.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| defaults.format.clone());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();
    init_logging(settings.as_ref().map(|s| &s.logging).unwrap_or(&LoggingSettings::default()));

    info!("Starting TripMate feed daemon...");

    let settings = settings.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    info!("Configuration loaded successfully");

    let backend = Arc::new(
        BackendClient::new(settings.backend.base_url.clone(), settings.backend.timeout()).map_err(|e| {
            error!("Failed to build HTTP client: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
        })?,
    );

    info!("Backend client initialized for {}", backend.base_url());

    let (inbox, inbox_requests) = InboxChannel::new(
        settings.backend.inbox_buffer.unwrap_or(32),
        settings.backend.inbox_timeout(),
    );
    spawn_http_transport(inbox_requests, backend.clone());

    let tokens = Arc::new(MemoryTokenStore::new(
        settings.session.token_ttl_secs.map(Duration::from_secs),
    ));

    let sessions = SessionRegistry::new(
        settings.session.max_sessions,
        Duration::from_secs(settings.session.idle_timeout_secs),
    );

    info!(
        "Feed configured: match city {}, presentation {}ms, swipe threshold {}",
        settings.feed.target_city, settings.feed.presentation_ms, settings.feed.swipe_threshold
    );

    let app_state = AppState {
        backend: backend.clone(),
        inbox,
        images: backend,
        tokens,
        sessions,
        predicate: Arc::new(CityMatch::new(settings.feed.target_city.clone())),
        presentation: settings.feed.presentation(),
        swipe_threshold: settings.feed.swipe_threshold,
        merge_categories: settings.pagination.merge_categories.clone(),
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(2);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .app_data(web::PayloadConfig::new(10 * 1024 * 1024))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
