// Integration tests for TripMate Feed

use actix_web::{http::StatusCode, test, web, App};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use tripmate_feed::core::{CityMatch, PageSource, Paginator, SessionContext, SourceError};
use tripmate_feed::models::{
    Category, ChatEntry, DismissResponse, ErrorResponse, FeedStateResponse, FilterCriteria,
    PageResponse, SessionResponse, TripListing,
};
use tripmate_feed::routes::{self, AppState};
use tripmate_feed::services::{
    spawn_http_transport, BackendClient, InboxChannel, MemoryTokenStore, SessionRegistry,
};

fn profiles_body() -> String {
    json!({
        "data": [
            { "userId": "A", "name": "Aarav", "city": "Jaipur", "images": ["a0.jpg", "a1.jpg"] },
            { "userId": "B", "name": "Bela", "city": "Delhi", "images": ["b0.jpg"] },
            { "userId": "C", "name": "Chirag", "city": "Mumbai", "images": ["c0.jpg", "c1.jpg", "c2.jpg"] }
        ]
    })
    .to_string()
}

fn trips_body(ids: std::ops::Range<usize>) -> String {
    let trips: Vec<_> = ids
        .map(|i| {
            json!({
                "_id": format!("t{}", i),
                "ownerName": "Owner",
                "fromCity": if i % 2 == 0 { "Jaipur" } else { "Delhi" },
                "toCity": "Goa",
                "age": 20 + i,
                "isVerified": true,
                "gender": "female"
            })
        })
        .collect();
    json!({ "data": trips }).to_string()
}

fn app_state(base_url: &str) -> AppState {
    let backend = Arc::new(BackendClient::new(base_url, Duration::from_secs(5)).unwrap());
    let (inbox, requests) = InboxChannel::new(8, Duration::from_secs(5));
    spawn_http_transport(requests, backend.clone());

    AppState {
        backend: backend.clone(),
        inbox,
        images: backend,
        tokens: Arc::new(MemoryTokenStore::new(None)),
        sessions: SessionRegistry::new(16, Duration::from_secs(60)),
        predicate: Arc::new(CityMatch::new("Jaipur")),
        presentation: Duration::ZERO,
        swipe_threshold: 50.0,
        merge_categories: vec![Category::Inbox],
    }
}

async fn mock_profiles(server: &mut ServerGuard) -> mockito::Mock {
    server
        .mock("GET", "/profiles")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(profiles_body())
        .create_async()
        .await
}

async fn mock_trips_page(server: &mut ServerGuard, page: &str, body: String) -> mockito::Mock {
    server
        .mock("GET", "/trips")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("category".into(), "cities".into()),
            Matcher::UrlEncoded("page".into(), page.into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

#[actix_web::test]
async fn test_integration_swipe_session() {
    let mut server = Server::new_async().await;
    let profiles = mock_profiles(&mut server).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&server.url())))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post().uri("/api/v1/sessions").to_request();
    let opened: SessionResponse = test::call_and_read_body_json(&app, req).await;
    profiles.assert_async().await;
    assert_eq!(opened.feed.profile.id, "A");
    assert_eq!(opened.feed.profile_count, 3);
    assert_eq!(opened.feed.phase, "viewing");

    let base = format!("/api/v1/sessions/{}/feed", opened.session_id);

    // swipe through A's images
    let req = test::TestRequest::post()
        .uri(&format!("{}/swipe", base))
        .set_json(json!({ "dx": 80.0 }))
        .to_request();
    let state: FeedStateResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(state.image_index, 1);
    assert_eq!(state.image, "a1.jpg");

    // like A -> match dialog holds the feed
    let req = test::TestRequest::post().uri(&format!("{}/like", base)).to_request();
    let state: FeedStateResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(state.phase, "match_found");
    assert_eq!(state.match_event.as_ref().map(|e| e.profile_id.as_str()), Some("A"));

    let req = test::TestRequest::post().uri(&format!("{}/dislike", base)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri(&format!("{}/dismiss", base))
        .set_json(json!({ "action": "send_message" }))
        .to_request();
    let dismissed: DismissResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(dismissed.feed.profile.id, "B");
    assert_eq!(dismissed.feed.image_index, 0);
    let route = dismissed.navigate.expect("chat navigation");
    assert_eq!(route.route, "Chat");
    assert_eq!(route.params.get("userId"), Some(&json!("A")));

    // dislike B, like C (no match), back on A
    let req = test::TestRequest::post().uri(&format!("{}/dislike", base)).to_request();
    let state: FeedStateResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(state.profile.id, "C");

    let req = test::TestRequest::post().uri(&format!("{}/like", base)).to_request();
    let state: FeedStateResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(state.phase, "viewing");
    assert_eq!(state.profile.id, "A");
    assert_eq!(state.image_index, 0);
    assert!(state.match_event.is_none());
}

#[actix_web::test]
async fn test_integration_cities_listing_pages() {
    let mut server = Server::new_async().await;
    mock_profiles(&mut server).await;
    mock_trips_page(&mut server, "1", trips_body(0..10)).await;
    mock_trips_page(&mut server, "2", trips_body(10..20)).await;
    mock_trips_page(&mut server, "3", trips_body(20..24)).await;
    mock_trips_page(&mut server, "4", trips_body(0..0)).await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&server.url())))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post().uri("/api/v1/sessions").to_request();
    let opened: SessionResponse = test::call_and_read_body_json(&app, req).await;
    let base = format!("/api/v1/sessions/{}", opened.session_id);

    let req = test::TestRequest::post()
        .uri(&format!("{}/listings/cities/next", base))
        .to_request();
    let page: PageResponse<TripListing> = test::call_and_read_body_json(&app, req).await;
    let mut observed = vec![(page.total, page.has_more)];

    for _ in 0..3 {
        let req = test::TestRequest::post()
            .uri(&format!("{}/listings/cities/more", base))
            .to_request();
        let page: PageResponse<TripListing> = test::call_and_read_body_json(&app, req).await;
        observed.push((page.total, page.has_more));
    }
    assert_eq!(observed, vec![(10, true), (20, true), (24, true), (24, false)]);

    let req = test::TestRequest::post()
        .uri(&format!("{}/listings/cities/more", base))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // narrow by the session filter
    let req = test::TestRequest::put()
        .uri(&format!("{}/filter", base))
        .set_json(json!({ "city": "jaipur", "minAge": 20, "maxAge": 29 }))
        .to_request();
    let criteria: FilterCriteria = test::call_and_read_body_json(&app, req).await;
    assert_eq!(criteria.city, "jaipur");

    let req = test::TestRequest::get()
        .uri(&format!("{}/listings/cities", base))
        .to_request();
    let page: PageResponse<TripListing> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page.total, 24);
    let ids: Vec<&str> = page.items.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["t0", "t2", "t4", "t6", "t8"]);
}

#[actix_web::test]
async fn test_integration_failed_fetch_keeps_state() {
    let mut server = Server::new_async().await;
    mock_profiles(&mut server).await;
    let failing = server
        .mock("GET", "/trips")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&server.url())))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post().uri("/api/v1/sessions").to_request();
    let opened: SessionResponse = test::call_and_read_body_json(&app, req).await;
    let base = format!("/api/v1/sessions/{}", opened.session_id);

    let req = test::TestRequest::post()
        .uri(&format!("{}/listings/guider/next", base))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    failing.assert_async().await;

    let req = test::TestRequest::get()
        .uri(&format!("{}/listings/guider", base))
        .to_request();
    let page: PageResponse<TripListing> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page.page, 1);
    assert!(page.has_more);
    assert!(page.items.is_empty());
}

#[actix_web::test]
async fn test_integration_credentials_are_forwarded() {
    let mut server = Server::new_async().await;
    let profiles = server
        .mock("GET", "/profiles")
        .match_header("authorization", "Bearer secret-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(profiles_body())
        .create_async()
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&server.url())))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::put()
        .uri("/api/v1/auth/token")
        .set_json(json!({ "token": "secret-token", "email": "traveller@tripmate.test" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::post().uri("/api/v1/sessions").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    profiles.assert_async().await;
}

#[actix_web::test]
async fn test_integration_unauthorized_backend() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/profiles")
        .with_status(401)
        .create_async()
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&server.url())))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post().uri("/api/v1/sessions").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "unauthorized");
}

#[actix_web::test]
async fn test_integration_invalid_requests() {
    let mut server = Server::new_async().await;
    mock_profiles(&mut server).await;
    let publish = server
        .mock("POST", "/trips")
        .expect(0)
        .create_async()
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&server.url())))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post().uri("/api/v1/sessions").to_request();
    let opened: SessionResponse = test::call_and_read_body_json(&app, req).await;
    let base = format!("/api/v1/sessions/{}", opened.session_id);

    let req = test::TestRequest::put()
        .uri(&format!("{}/filter", base))
        .set_json(json!({ "city": "all", "minAge": 40, "maxAge": 30 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri(&format!("{}/trips", base))
        .set_json(json!({
            "category": "inbox",
            "fromCity": "Jaipur",
            "toCity": "Goa",
            "travelDate": "2024-12-01"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    publish.assert_async().await;

    let req = test::TestRequest::post()
        .uri("/api/v1/sessions/00000000-0000-0000-0000-000000000000/feed/like")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_integration_malformed_trips_are_empty() {
    let mut server = Server::new_async().await;
    mock_trips_page(&mut server, "1", json!({ "unexpected": true }).to_string()).await;

    let backend = BackendClient::new(server.url(), Duration::from_secs(5)).unwrap();
    let mut paginator: Paginator<TripListing> = Paginator::new();
    paginator
        .fetch_next_page(&backend, &SessionContext::anonymous(), Category::Cities)
        .await
        .unwrap();

    assert!(paginator.items(Category::Cities).is_empty());
    assert!(!paginator.has_more(Category::Cities));
}

#[tokio::test]
async fn test_integration_inbox_over_channel() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/chats")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("type".into(), "inbox".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                { "_id": "c1", "peerId": "A", "peerName": "Aarav", "unread": 2 },
                { "_id": "c2", "peerId": "B", "peerName": "Bela" }
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let backend = Arc::new(BackendClient::new(server.url(), Duration::from_secs(5)).unwrap());
    let (inbox, requests) = InboxChannel::new(4, Duration::from_secs(5));
    spawn_http_transport(requests, backend);

    let chats: Vec<ChatEntry> = inbox
        .fetch_page(&SessionContext::anonymous(), Category::Inbox, 1)
        .await
        .unwrap();
    assert_eq!(chats.len(), 2);
    assert_eq!(chats[0].unread, 2);

    let err = inbox
        .fetch_page(&SessionContext::anonymous(), Category::Cities, 1)
        .await
        .unwrap_err();
    assert_eq!(err, SourceError::UnsupportedCategory(Category::Cities));
}

#[actix_web::test]
async fn test_integration_imageless_profiles_are_skipped() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/profiles")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                { "userId": "A", "name": "Aarav", "city": "Jaipur", "images": ["a0.jpg", "a1.jpg"] },
                { "userId": "B", "name": "Bela", "city": "Delhi", "images": [] },
                { "userId": "C", "name": "Chirag", "city": "Mumbai", "images": ["c0.jpg"] }
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&server.url())))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post().uri("/api/v1/sessions").to_request();
    let opened: SessionResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(opened.feed.profile_count, 2);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/sessions/{}/feed/dislike", opened.session_id))
        .to_request();
    let state: FeedStateResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(state.profile.id, "C");
}

#[actix_web::test]
async fn test_integration_session_limit() {
    let mut server = Server::new_async().await;
    mock_profiles(&mut server).await;

    let mut state = app_state(&server.url());
    state.sessions = SessionRegistry::new(1, Duration::from_secs(60));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(routes::configure_routes),
    )
    .await;

    let req = test::TestRequest::post().uri("/api/v1/sessions").to_request();
    let first: SessionResponse = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post().uri("/api/v1/sessions").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "too_many_sessions");

    // the admitted session is still reachable
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/sessions/{}/feed", first.session_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/sessions/{}", first.session_id))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post().uri("/api/v1/sessions").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}
