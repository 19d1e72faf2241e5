//! Common test utilities for Concierge integration tests
//!
//! This file contains shared functions and utilities for all integration tests,
//! including test application setup, a request helper, and helpers that walk
//! the API to create hotels, providers, services and guests.
#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use concierge::{
    auth::{self, AuthKeys},
    create_app,
    db::{init_pool, DbPool},
    models::{Role, User},
    repo, AppState,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const WEBHOOK_SECRET: &str = "webhook-secret";
pub const PASSWORD: &str = "correct-horse";

/// The router plus direct database access for seeding
pub struct TestApp {
    pub router: Router,
    pub pool: Arc<DbPool>,
}

/// Creates a test application with a private in-memory SQLite database
///
/// A shared-cache URL with a unique name is used so every pooled
/// connection sees the same database, and tests stay isolated.
pub fn create_test_app() -> TestApp {
    let database_url = format!("file:it_{}?mode=memory&cache=shared", uuid::Uuid::new_v4());
    let pool = Arc::new(init_pool(&database_url).unwrap());

    let conn = &mut pool.get().unwrap();
    concierge::run_migrations(conn).unwrap();

    let keys = AuthKeys::new("integration-secret", Duration::minutes(15), Duration::days(7));
    let state = AppState::new(pool.clone(), keys, WEBHOOK_SECRET.to_string());

    TestApp {
        router: create_app(state, None),
        pool,
    }
}

/// Sends a request and returns the status with the parsed JSON body
///
/// Empty bodies come back as `Value::Null`.
pub async fn send(app: &TestApp, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(uri).method(method);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Inserts a superadmin directly and returns its access token
pub async fn superadmin_token(app: &TestApp) -> String {
    let user = User::new(
        "root@platform.test",
        auth::hash_password(PASSWORD).unwrap(),
        "Root".to_string(),
        Role::Superadmin,
    );
    repo::create_user(&app.pool, &user).unwrap();
    login(app, "root@platform.test", PASSWORD).await
}

/// Logs in and returns the access token
pub async fn login(app: &TestApp, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed for {}: {}", email, body);
    body["access_token"].as_str().unwrap().to_string()
}

/// Creates a hotel through the superadmin API
///
/// ### Returns
///
/// The hotel JSON and an access token for its admin `admin@{slug}.test`
pub async fn create_hotel(app: &TestApp, root_token: &str, slug: &str) -> (Value, String) {
    let (status, body) = send(
        app,
        "POST",
        "/api/superadmin/hotels",
        Some(root_token),
        Some(json!({
            "name": format!("Hotel {}", slug),
            "slug": slug,
            "address": "1 Harbour Road",
            "contact_email": format!("desk@{}.test", slug),
            "platform_commission_percentage": 10.0,
            "admin_email": format!("admin@{}.test", slug),
            "admin_password": PASSWORD,
            "admin_name": "Manager"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let token = login(app, &format!("admin@{}.test", slug), PASSWORD).await;
    (body["hotel"].clone(), token)
}

/// Creates a provider through the hotel admin API
///
/// ### Returns
///
/// The provider ID and an access token for its staff login
pub async fn create_provider(app: &TestApp, admin_token: &str, name: &str, markup: f64) -> (String, String) {
    let login_email = format!("staff@{}.test", name.to_lowercase());
    let (status, body) = send(
        app,
        "POST",
        "/api/hotel/service-providers",
        Some(admin_token),
        Some(json!({
            "name": name,
            "category": "laundry",
            "contact_email": format!("hello@{}.test", name.to_lowercase()),
            "markup_percentage": markup,
            "login_email": login_email,
            "login_password": PASSWORD
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let token = login(app, &login_email, PASSWORD).await;
    (body["id"].as_str().unwrap().to_string(), token)
}

/// Creates a laundry service and returns its ID
pub async fn create_service(app: &TestApp, staff_token: &str, name: &str, price_cents: i64) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/provider/services",
        Some(staff_token),
        Some(json!({
            "name": name,
            "description": format!("{} service", name),
            "category": "laundry",
            "base_price_cents": price_cents
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_str().unwrap().to_string()
}

/// Registers a guest into a hotel and returns the token response
pub async fn register_guest(app: &TestApp, slug: &str, email: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "hotel_slug": slug,
            "email": email,
            "password": PASSWORD,
            "full_name": "Ada Guest",
            "room_number": "204",
            "checkout_at": (Utc::now() + Duration::days(3)).to_rfc3339()
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

/// Books a service for tomorrow and returns the booking JSON
pub async fn book(app: &TestApp, guest_token: &str, service_id: &str, quantity: i32) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/guest/bookings",
        Some(guest_token),
        Some(json!({
            "service_id": service_id,
            "quantity": quantity,
            "scheduled_for": (Utc::now() + Duration::days(1)).to_rfc3339()
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}
