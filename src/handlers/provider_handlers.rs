use axum::{extract::State, http::StatusCode};
use std::sync::Arc;
use tracing::{instrument, debug, info};

use crate::analytics;
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::dto::{BookingQueryDto, CreateServiceDto, ProviderDashboard, UpdateBookingStatusDto, UpdateServiceDto};
use crate::errors::ApiError;
use crate::extract::{Json, Path, Query};
use crate::models::{Actor, Booking, Service};
use crate::notifications::Notifier;
use crate::repo::{self, BookingScope, ServiceChanges};

const DASHBOARD_TOP_SERVICES: usize = 5;

fn own_service(pool: &DbPool, provider_id: &str, service_id: &str) -> Result<Service, ApiError> {
    repo::get_service(pool, service_id)?
        .filter(|service| service.get_service_provider_id() == provider_id)
        .ok_or(ApiError::NotFound)
}

/// Handler for adding a service to the provider's catalogue
///
/// This function handles POST requests to `/api/provider/services`.
///
/// ### Returns
///
/// 201 with the new service
#[instrument(skip(pool, auth, payload), fields(name = %payload.name, price = %payload.base_price_cents))]
pub async fn create_service_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
    Json(payload): Json<CreateServiceDto>,
) -> Result<(StatusCode, Json<Service>), ApiError> {
    let provider_id = auth.require_provider()?;
    payload.validate()?;

    let service = Service::new(
        provider_id,
        payload.name.trim().to_string(),
        payload.description,
        payload.category,
        payload.base_price_cents,
    );
    let service = repo::create_service(&pool, &service)?;

    info!("Created service {}", service.get_id());
    Ok((StatusCode::CREATED, Json(service)))
}

/// Handler for the provider's catalogue, unavailable services included
#[instrument(skip(pool, auth))]
pub async fn list_provider_services_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
) -> Result<Json<Vec<Service>>, ApiError> {
    let provider_id = auth.require_provider()?;

    Ok(Json(repo::list_services_for_provider(&pool, &provider_id)?))
}

/// Handler for editing a service
///
/// This function handles PUT requests to `/api/provider/services/{id}`. Price
/// changes only affect bookings made afterwards.
#[instrument(skip(pool, auth, payload), fields(service_id = %id))]
pub async fn update_service_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateServiceDto>,
) -> Result<Json<Service>, ApiError> {
    let provider_id = auth.require_provider()?;
    payload.validate()?;
    own_service(&pool, &provider_id, &id)?;

    let changes = ServiceChanges {
        name: payload.name.map(|name| name.trim().to_string()),
        description: payload.description,
        category: payload.category,
        base_price_cents: payload.base_price_cents,
        is_available: payload.is_available,
    };
    Ok(Json(repo::update_service(&pool, &id, changes)?))
}

/// Handler for withdrawing a service
///
/// This function handles DELETE requests to `/api/provider/services/{id}`.
/// The service is marked unavailable rather than removed.
#[instrument(skip(pool, auth), fields(service_id = %id))]
pub async fn delete_service_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let provider_id = auth.require_provider()?;
    own_service(&pool, &provider_id, &id)?;

    repo::update_service(
        &pool,
        &id,
        ServiceChanges {
            is_available: Some(false),
            ..Default::default()
        },
    )?;

    info!("Withdrew service {}", id);
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(pool, auth))]
pub async fn list_provider_bookings_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
    Query(query): Query<BookingQueryDto>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    let provider_id = auth.require_provider()?;

    let bookings = repo::list_bookings(&pool, &BookingScope::Provider(provider_id), &query.status)?;
    debug!("Listed {} bookings", bookings.len());
    Ok(Json(bookings))
}

/// Handler for moving a booking along its fulfilment path
///
/// This function handles PATCH requests to
/// `/api/provider/bookings/{id}/status`. The guest is notified of every
/// change.
///
/// ### Errors
///
/// 404 for bookings of other providers; 409 for transitions the booking
/// state machine does not allow
#[instrument(skip(pool, notifier, auth), fields(booking_id = %id, status = %payload.status))]
pub async fn update_booking_status_handler(
    State(pool): State<Arc<DbPool>>,
    State(notifier): State<Notifier>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateBookingStatusDto>,
) -> Result<Json<Booking>, ApiError> {
    let provider_id = auth.require_provider()?;
    repo::get_booking_in_scope(&pool, &BookingScope::Provider(provider_id), &id)?.ok_or(ApiError::NotFound)?;

    let booking = repo::transition_booking(&pool, &id, payload.status, Actor::Provider)?;
    notifier.booking_status_changed(&booking);

    info!("Booking {} is now {}", id, booking.get_status());
    Ok(Json(booking))
}

/// Handler for the provider dashboard
///
/// This function handles GET requests to `/api/provider/dashboard`. Earnings
/// are the base prices of completed bookings.
#[instrument(skip(pool, auth))]
pub async fn provider_dashboard_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
) -> Result<Json<ProviderDashboard>, ApiError> {
    let provider_id = auth.require_provider()?;

    let bookings = repo::list_bookings(&pool, &BookingScope::Provider(provider_id), &[])?;
    let revenue = analytics::revenue_summary(&bookings);

    Ok(Json(ProviderDashboard {
        bookings: analytics::status_breakdown(&bookings),
        earnings_cents: revenue.provider_earnings_cents,
        completed_bookings: revenue.completed_bookings,
        ratings: analytics::rating_summary(&bookings),
        top_services: analytics::top_services(&bookings, DASHBOARD_TOP_SERVICES),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingStatus, ServiceCategory};
    use crate::repo::tests::setup_test_db;
    use crate::test_utils::{auth_user, seed_booking, seed_current_guest, seed_hotel, seed_provider, seed_service};

    #[tokio::test]
    async fn test_create_service_requires_positive_price() {
        let pool = setup_test_db();
        let (hotel, _) = seed_hotel(&pool, "seaside");
        let (_, staff) = seed_provider(&pool, &hotel, "Suds", 10.0);

        let payload = |price| CreateServiceDto {
            name: "Ironing".to_string(),
            description: String::new(),
            category: ServiceCategory::Laundry,
            base_price_cents: price,
        };

        let result = create_service_handler(State(pool.clone()), auth_user(&staff), Json(payload(0))).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));

        let (status, Json(service)) = create_service_handler(State(pool.clone()), auth_user(&staff), Json(payload(450)))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(service.get_base_price_cents(), 450);
    }

    #[tokio::test]
    async fn test_hotel_admin_cannot_use_provider_endpoints() {
        let pool = setup_test_db();
        let (_, admin) = seed_hotel(&pool, "seaside");

        let result = list_provider_services_handler(State(pool.clone()), auth_user(&admin)).await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_service_marks_unavailable() {
        let pool = setup_test_db();
        let (hotel, _) = seed_hotel(&pool, "seaside");
        let (provider, staff) = seed_provider(&pool, &hotel, "Suds", 10.0);
        let (_, other_staff) = seed_provider(&pool, &hotel, "Bubbles", 10.0);
        let service = seed_service(&pool, &provider, "Wash", ServiceCategory::Laundry, 1000);

        let foreign = delete_service_handler(State(pool.clone()), auth_user(&other_staff), Path(service.get_id())).await;
        assert!(matches!(foreign, Err(ApiError::NotFound)));

        let status = delete_service_handler(State(pool.clone()), auth_user(&staff), Path(service.get_id()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let Json(services) = list_provider_services_handler(State(pool.clone()), auth_user(&staff)).await.unwrap();
        assert_eq!(services.len(), 1);
        assert!(!services[0].get_is_available());
    }

    #[tokio::test]
    async fn test_status_updates_follow_state_machine() {
        let pool = setup_test_db();
        let notifier = Notifier::new(pool.clone());
        let (hotel, _) = seed_hotel(&pool, "seaside");
        let (provider, staff) = seed_provider(&pool, &hotel, "Suds", 10.0);
        let service = seed_service(&pool, &provider, "Wash", ServiceCategory::Laundry, 1000);
        let guest = seed_current_guest(&pool, &hotel, "guest@seaside.test");
        let booking = seed_booking(&pool, &guest, &hotel, &provider, &service, 1);

        let update = |status| {
            update_booking_status_handler(
                State(pool.clone()),
                State(notifier.clone()),
                auth_user(&staff),
                Path(booking.get_id()),
                Json(UpdateBookingStatusDto { status }),
            )
        };

        let skipped = update(BookingStatus::Completed).await;
        assert!(matches!(skipped, Err(ApiError::InvalidTransition(_))));

        for status in [BookingStatus::Confirmed, BookingStatus::InProgress, BookingStatus::Completed] {
            let Json(updated) = update(status).await.unwrap();
            assert_eq!(updated.get_status(), status);
        }

        let notes = repo::list_notifications(&pool, &guest.get_id(), false).unwrap();
        assert_eq!(notes.len(), 3);

        let Json(dashboard) = provider_dashboard_handler(State(pool.clone()), auth_user(&staff)).await.unwrap();
        assert_eq!(dashboard.completed_bookings, 1);
        assert_eq!(dashboard.earnings_cents, 1000);
    }

    #[tokio::test]
    async fn test_other_providers_booking_is_not_found() {
        let pool = setup_test_db();
        let notifier = Notifier::new(pool.clone());
        let (hotel, _) = seed_hotel(&pool, "seaside");
        let (provider, _) = seed_provider(&pool, &hotel, "Suds", 10.0);
        let (_, intruder) = seed_provider(&pool, &hotel, "Bubbles", 10.0);
        let service = seed_service(&pool, &provider, "Wash", ServiceCategory::Laundry, 1000);
        let guest = seed_current_guest(&pool, &hotel, "guest@seaside.test");
        let booking = seed_booking(&pool, &guest, &hotel, &provider, &service, 1);

        let result = update_booking_status_handler(
            State(pool.clone()),
            State(notifier),
            auth_user(&intruder),
            Path(booking.get_id()),
            Json(UpdateBookingStatusDto { status: BookingStatus::Confirmed }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::NotFound)));
    }
}
