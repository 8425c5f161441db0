use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::{Duration, Utc};
use schedly_core::UserId;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::api_config::ApiConfig;
use crate::api_services::{
    Stores, build_app_state, build_memory_session_layer, build_rate_limit_repository,
};

use super::build_router;

const FRONTEND_URL: &str = "http://localhost:3000";
const BOOTSTRAP_TOKEN: &str = "router-test-bootstrap-token";

fn test_app() -> Router {
    let config = ApiConfig::from_lookup(false, |name| match name {
        "AUTH_BOOTSTRAP_TOKEN" => Some(BOOTSTRAP_TOKEN.to_owned()),
        "FRONTEND_URL" => Some(FRONTEND_URL.to_owned()),
        _ => None,
    })
    .unwrap_or_else(|_| unreachable!());
    let rate_limits =
        build_rate_limit_repository(&config.rate_limit).unwrap_or_else(|_| unreachable!());
    let app_state = build_app_state(&config, Stores::in_memory(), rate_limits);

    build_router(app_state, build_memory_session_layer(false)).unwrap_or_else(|_| unreachable!())
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::ORIGIN, FRONTEND_URL);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap_or_else(|_| unreachable!());

    let response = app
        .clone()
        .oneshot(request)
        .await
        .unwrap_or_else(|_| unreachable!());
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_else(|_| unreachable!());
    let payload = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, payload)
}

async fn login(app: &Router, role: &str) -> String {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/session")
        .header(header::ORIGIN, FRONTEND_URL)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "token": BOOTSTRAP_TOKEN,
                "userId": UserId::new().to_string(),
                "displayName": role,
                "role": role,
            })
            .to_string(),
        ))
        .unwrap_or_else(|_| unreachable!());

    let response = app
        .clone()
        .oneshot(request)
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(response.status(), StatusCode::CREATED);

    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| unreachable!())
}

fn event_payload(capacity: i64) -> Value {
    let starts_at = Utc::now() + Duration::days(14);
    json!({
        "title": "Robotics Expo",
        "description": "Student robotics showcase",
        "category": "Technical",
        "tags": ["robots"],
        "startDate": starts_at.to_rfc3339(),
        "endDate": (starts_at + Duration::hours(6)).to_rfc3339(),
        "venue": "Main Hall",
        "capacity": capacity,
    })
}

#[tokio::test]
async fn health_uses_the_success_envelope() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/api/events", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "error");
    assert_eq!(body["kind"], "unauthorized");
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn session_bootstrap_rejects_a_wrong_token() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/session",
        None,
        Some(json!({
            "token": "not-the-token",
            "userId": UserId::new().to_string(),
            "displayName": "Mallory",
            "role": "Super Admin",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "unauthorized");
}

#[tokio::test]
async fn session_bootstrap_rejects_near_miss_tokens() {
    let app = test_app();
    let mut last_byte_off = BOOTSTRAP_TOKEN.to_owned();
    last_byte_off.pop();
    last_byte_off.push('X');

    for token in [
        last_byte_off.as_str(),
        &BOOTSTRAP_TOKEN[..BOOTSTRAP_TOKEN.len() - 1],
        "",
    ] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/auth/session",
            None,
            Some(json!({
                "token": token,
                "userId": UserId::new().to_string(),
                "displayName": "Mallory",
                "role": "Super Admin",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn mutations_from_another_origin_are_forbidden() {
    let app = test_app();
    let cookie = login(&app, "Event Organizer").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/events")
        .header(header::ORIGIN, "https://evil.example")
        .header(header::COOKIE, cookie.as_str())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(event_payload(10).to_string()))
        .unwrap_or_else(|_| unreachable!());
    let response = app.oneshot(request).await.unwrap_or_else(|_| unreachable!());

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_routes_return_a_not_found_envelope() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/api/nothing-here", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn event_moves_from_draft_to_published_over_http() {
    let app = test_app();
    let organizer = login(&app, "Event Organizer").await;
    let faculty = login(&app, "Faculty Mentor").await;
    let admin = login(&app, "College Admin").await;
    let student = login(&app, "Student").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/events",
        Some(&organizer),
        Some(event_payload(25)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "Draft");
    let event_id = body["data"]["id"]
        .as_str()
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| unreachable!());

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/events/{event_id}/submit"),
        Some(&organizer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Submitted");

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/events/{event_id}/admin-approve"),
        Some(&faculty),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/events/{event_id}/admin-approve"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "invalid_transition");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/events/{event_id}/faculty-review"),
        Some(&faculty),
        Some(json!({"action": "approve", "remarks": "looks good"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Faculty Approved");
    assert_eq!(body["data"]["facultyReview"]["remarks"], "looks good");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/events/{event_id}/admin-approve"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "Published");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/registrations",
        Some(&student),
        Some(json!({"eventId": event_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["attended"], false);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/registrations",
        Some(&student),
        Some(json!({"eventId": event_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "conflict");

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/events/{event_id}"),
        Some(&organizer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["event"]["registrationCount"], 1);
    let actions: Vec<&str> = body["data"]["auditTrail"]
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry["action"].as_str())
                .collect()
        })
        .unwrap_or_default();
    assert_eq!(actions, ["approve", "approve", "submit", "create"]);

    let (status, body) = send(&app, Method::GET, "/api/notifications", Some(&organizer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["unreadCount"], 2);

    let (status, body) = send(&app, Method::GET, "/api/notifications", Some(&student), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["notifications"][0]["type"], "System");
}

#[tokio::test]
async fn students_only_see_published_events() {
    let app = test_app();
    let organizer = login(&app, "Event Organizer").await;
    let student = login(&app, "Student").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/events",
        Some(&organizer),
        Some(event_payload(5)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, Method::GET, "/api/events", Some(&student), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));

    let (status, body) = send(&app, Method::GET, "/api/events", Some(&organizer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}
