/// Concierge: a multi-tenant hotel guest-services platform
///
/// Guests book services (laundry, transport, spa, dining, ...) through
/// their hotel's portal. Hotel admins contract service providers and set
/// the markup added to each provider's prices. Providers fulfil bookings,
/// and a superadmin runs the platform and takes a commission out of every
/// hotel markup.
///
/// ### Modules
///
/// - `db`: Database connection management
/// - `models`: Data structures stored in the database
/// - `repo`: Repository layer for database operations
/// - `pricing`: Markup and commission arithmetic
/// - `analytics`: Dashboard aggregations
/// - `auth`: Passwords, tokens and the authenticated-caller extractor
/// - `notifications`: Stored notifications with live fan-out
/// - `scheduler`: Background deactivation of checked-out guests
///
/// ### Web API
///
/// - `GET /health`, `GET /api/hotels/{slug}`: public endpoints
/// - `/api/auth/*`: registration, login, token refresh, logout
/// - `/api/superadmin/*`: hotels, users and platform dashboard
/// - `/api/hotel/*`: a hotel admin's providers, guests, bookings and dashboard
/// - `/api/provider/*`: a provider's services, bookings and dashboard
/// - `/api/guest/*`: browsing services and managing bookings
/// - `/api/payments/*`: payment intents and the gateway webhook
/// - `/api/notifications/*`: stored notifications and the live stream

pub mod analytics;
pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod errors;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod notifications;
pub mod pricing;
pub mod repo;
pub mod scheduler;
pub mod schema;
pub mod state;

#[cfg(test)]
pub mod test_utils;

use anyhow::anyhow;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, patch, post, put},
    Router,
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::{warn, Level};

use crate::handlers::*;
pub use crate::state::AppState;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Creates the application router with all routes
///
/// ### Arguments
///
/// * `state` - The shared application state
/// * `cors_origin` - The only origin allowed to call the API; any origin when `None`
///
/// ### Returns
///
/// An Axum Router configured with all routes and middleware
pub fn create_app(state: AppState, cors_origin: Option<&str>) -> Router {
    let public = Router::new()
        .route("/health", get(health_handler))
        .route("/api/hotels/{slug}", get(get_public_hotel_handler));

    let auth = Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/refresh", post(refresh_handler))
        .route("/logout", post(logout_handler))
        .route("/me", get(me_handler));

    let superadmin = Router::new()
        .route("/hotels", post(create_hotel_handler).get(list_hotels_handler))
        .route("/hotels/{id}", get(get_hotel_handler).patch(update_hotel_settings_handler))
        .route("/users", get(list_users_handler))
        .route("/dashboard", get(platform_dashboard_handler));

    let hotel = Router::new()
        .route("/profile", get(get_hotel_profile_handler).put(update_hotel_profile_handler))
        .route("/service-providers", post(create_provider_handler).get(list_providers_handler))
        .route(
            "/service-providers/{id}",
            get(get_provider_handler).put(update_provider_handler).delete(delete_provider_handler),
        )
        .route("/service-providers/{id}/markup", put(update_markup_handler))
        .route("/guests", post(create_guest_handler).get(list_guests_handler))
        .route("/guests/{id}", patch(update_guest_handler))
        .route("/bookings", get(list_hotel_bookings_handler))
        .route("/bookings/{id}/cancel", patch(cancel_hotel_booking_handler))
        .route("/payments/{id}/mark-paid", post(mark_payment_paid_handler))
        .route("/dashboard", get(hotel_dashboard_handler));

    let provider = Router::new()
        .route("/services", post(create_service_handler).get(list_provider_services_handler))
        .route("/services/{id}", put(update_service_handler).delete(delete_service_handler))
        .route("/bookings", get(list_provider_bookings_handler))
        .route("/bookings/{id}/status", patch(update_booking_status_handler))
        .route("/dashboard", get(provider_dashboard_handler));

    let guest = Router::new()
        .route("/services", get(list_guest_services_handler))
        .route("/bookings", post(create_booking_handler).get(list_guest_bookings_handler))
        .route("/bookings/{id}", get(get_guest_booking_handler))
        .route("/bookings/{id}/cancel", post(cancel_guest_booking_handler))
        .route("/bookings/{id}/rating", post(rate_booking_handler));

    let payments = Router::new()
        .route("/create-intent", post(create_payment_intent_handler))
        .route("/webhook", post(payment_webhook_handler));

    let notifications = Router::new()
        .route("/", get(list_notifications_handler))
        .route("/stream", get(notification_stream_handler))
        .route("/{id}/read", post(mark_notification_read_handler));

    Router::new()
        .merge(public)
        .nest("/api/auth", auth)
        .nest("/api/superadmin", superadmin)
        .nest("/api/hotel", hotel)
        .nest("/api/provider", provider)
        .nest("/api/guest", guest)
        .nest("/api/payments", payments)
        .nest("/api/notifications", notifications)
        .layer(cors_layer(cors_origin))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let origin = origin.and_then(|origin| match HeaderValue::from_str(origin) {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid CORS origin {:?}, allowing any origin", origin);
            None
        }
    });

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    // credentials (the access token cookie) need a fixed origin
    match origin {
        Some(origin) => layer.allow_origin(AllowOrigin::exact(origin)).allow_credentials(true),
        None => layer.allow_origin(AllowOrigin::any()),
    }
}

/// Runs all pending database migrations
///
/// ### Arguments
///
/// * `conn` - A mutable reference to a SQLite database connection
///
/// ### Errors
///
/// Returns an error if a migration fails to apply
pub fn run_migrations(conn: &mut diesel::SqliteConnection) -> anyhow::Result<()> {
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow!("Failed to run migrations: {}", e))?;
    Ok(())
}
