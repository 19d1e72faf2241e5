use axum::{extract::State, http::StatusCode};
use chrono::Utc;
use std::sync::Arc;
use tracing::{instrument, debug, info};

use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::dto::{CreateBookingDto, GuestServiceView, RateBookingDto, ServiceQueryDto};
use crate::errors::ApiError;
use crate::extract::{Json, Path, Query};
use crate::models::{Actor, Booking, BookingStatus};
use crate::notifications::Notifier;
use crate::pricing;
use crate::repo::{self, BookingScope};

fn own_booking(pool: &DbPool, auth: &AuthUser, booking_id: &str) -> Result<Booking, ApiError> {
    repo::get_booking_in_scope(pool, &BookingScope::Guest(auth.user.get_id()), booking_id)?.ok_or(ApiError::NotFound)
}

/// Handler for browsing the hotel's services
///
/// This function handles GET requests to `/api/guest/services`. Only
/// available services of active providers in the guest's hotel are listed,
/// priced with the hotel's markup.
#[instrument(skip(pool, auth))]
pub async fn list_guest_services_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
    Query(query): Query<ServiceQueryDto>,
) -> Result<Json<Vec<GuestServiceView>>, ApiError> {
    let hotel_id = auth.require_guest()?;

    let views = repo::list_bookable_services(&pool, &hotel_id, query.category)?
        .iter()
        .map(|(service, provider)| GuestServiceView::new(service, provider))
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Listed {} services", views.len());
    Ok(Json(views))
}

/// Handler for booking a service
///
/// This function handles POST requests to `/api/guest/bookings`. The price
/// is fixed at booking time from the provider's current markup and the
/// hotel's current commission; the provider's staff are notified.
///
/// ### Returns
///
/// 201 with the pending booking
///
/// ### Errors
///
/// 400 for a bad quantity or a schedule in the past; 404 when the service
/// is unavailable or belongs to another hotel
#[instrument(skip(pool, notifier, auth, payload), fields(service_id = %payload.service_id, quantity = %payload.quantity))]
pub async fn create_booking_handler(
    State(pool): State<Arc<DbPool>>,
    State(notifier): State<Notifier>,
    auth: AuthUser,
    Json(payload): Json<CreateBookingDto>,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    let hotel_id = auth.require_guest()?;
    payload.validate(Utc::now())?;

    let service = repo::get_service(&pool, &payload.service_id)?
        .filter(|service| service.get_is_available())
        .ok_or(ApiError::NotFound)?;
    let provider = repo::get_provider_for_hotel(&pool, &hotel_id, &service.get_service_provider_id())?
        .filter(|provider| provider.get_is_active())
        .ok_or(ApiError::NotFound)?;
    let hotel = repo::get_hotel(&pool, &hotel_id)?.ok_or(ApiError::NotFound)?;

    let price = pricing::quote(
        service.get_base_price_cents(),
        payload.quantity,
        provider.get_markup_percentage(),
        hotel.get_platform_commission_percentage(),
    )?;
    let notes = payload.notes.map(|notes| notes.trim().to_string()).filter(|notes| !notes.is_empty());

    let booking = Booking::new(&auth.user, hotel_id, &service, payload.quantity, payload.scheduled_for, notes, &price);
    let booking = repo::create_booking(&pool, &booking)?;
    notifier.booking_created(&booking);

    info!("Created booking {} for {} cents", booking.get_id(), booking.get_total_price_cents());
    Ok((StatusCode::CREATED, Json(booking)))
}

#[instrument(skip(pool, auth))]
pub async fn list_guest_bookings_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
) -> Result<Json<Vec<Booking>>, ApiError> {
    auth.require_guest()?;

    Ok(Json(repo::list_bookings(&pool, &BookingScope::Guest(auth.user.get_id()), &[])?))
}

#[instrument(skip(pool, auth), fields(booking_id = %id))]
pub async fn get_guest_booking_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Booking>, ApiError> {
    auth.require_guest()?;

    Ok(Json(own_booking(&pool, &auth, &id)?))
}

/// Handler for a guest cancelling their booking
///
/// This function handles POST requests to `/api/guest/bookings/{id}/cancel`.
/// Only pending or confirmed bookings can be cancelled.
#[instrument(skip(pool, notifier, auth), fields(booking_id = %id))]
pub async fn cancel_guest_booking_handler(
    State(pool): State<Arc<DbPool>>,
    State(notifier): State<Notifier>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Booking>, ApiError> {
    auth.require_guest()?;
    own_booking(&pool, &auth, &id)?;

    let booking = repo::transition_booking(&pool, &id, BookingStatus::Cancelled, Actor::Guest)?;
    notifier.booking_status_changed(&booking);

    info!("Guest cancelled booking {}", id);
    Ok(Json(booking))
}

/// Handler for rating a completed booking
///
/// This function handles POST requests to `/api/guest/bookings/{id}/rating`.
///
/// ### Errors
///
/// 400 for a rating outside 1 to 5; 409 when the booking is not completed
/// or already rated
#[instrument(skip(pool, auth, payload), fields(booking_id = %id, rating = %payload.rating))]
pub async fn rate_booking_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<RateBookingDto>,
) -> Result<Json<Booking>, ApiError> {
    auth.require_guest()?;
    payload.validate()?;
    own_booking(&pool, &auth, &id)?;

    let feedback = payload.feedback.map(|text| text.trim().to_string()).filter(|text| !text.is_empty());
    let booking = repo::rate_booking(&pool, &id, payload.rating, feedback)?;

    info!("Booking {} rated {}", id, payload.rating);
    Ok(Json(booking))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ServiceCategory, User};
    use crate::repo::tests::setup_test_db;
    use crate::test_utils::{auth_user, seed_booking, seed_current_guest, seed_hotel, seed_provider, seed_service};
    use chrono::Duration;

    fn booking_payload(service_id: String, quantity: i32) -> CreateBookingDto {
        CreateBookingDto {
            service_id,
            quantity,
            scheduled_for: Utc::now() + Duration::hours(4),
            notes: Some("  ring the bell  ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_services_show_guest_price() {
        let pool = setup_test_db();
        let (hotel, _) = seed_hotel(&pool, "seaside");
        let (provider, _) = seed_provider(&pool, &hotel, "Suds", 20.0);
        seed_service(&pool, &provider, "Wash", ServiceCategory::Laundry, 1000);
        seed_service(&pool, &provider, "Massage", ServiceCategory::Spa, 5000);
        let guest = seed_current_guest(&pool, &hotel, "guest@seaside.test");

        let Json(all) = list_guest_services_handler(State(pool.clone()), auth_user(&guest), Query(ServiceQueryDto::default()))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let Json(laundry) = list_guest_services_handler(
            State(pool.clone()),
            auth_user(&guest),
            Query(ServiceQueryDto { category: Some(ServiceCategory::Laundry) }),
        )
        .await
        .unwrap();
        assert_eq!(laundry.len(), 1);
        assert_eq!(laundry[0].unit_price_cents, 1200);
        assert_eq!(laundry[0].markup_percentage, 20.0);
        assert_eq!(laundry[0].provider_name, "Suds");
    }

    #[tokio::test]
    async fn test_create_booking_snapshots_price_and_notifies_provider() {
        let pool = setup_test_db();
        let notifier = Notifier::new(pool.clone());
        let (hotel, _) = seed_hotel(&pool, "seaside");
        let (provider, staff) = seed_provider(&pool, &hotel, "Suds", 20.0);
        let service = seed_service(&pool, &provider, "Wash", ServiceCategory::Laundry, 1000);
        let guest = seed_current_guest(&pool, &hotel, "guest@seaside.test");

        let (status, Json(booking)) = create_booking_handler(
            State(pool.clone()),
            State(notifier),
            auth_user(&guest),
            Json(booking_payload(service.get_id(), 3)),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(booking.get_status(), BookingStatus::Pending);
        assert_eq!(booking.get_base_price_cents(), 3000);
        assert_eq!(booking.get_markup_amount_cents(), 600);
        assert_eq!(booking.get_platform_fee_cents(), 60);
        assert_eq!(booking.get_total_price_cents(), 3600);
        assert_eq!(booking.get_notes(), Some("ring the bell".to_string()));

        // later markup changes leave the booking alone
        repo::set_markup(&pool, &provider.get_id(), 50.0).unwrap();
        let stored = repo::get_booking(&pool, &booking.get_id()).unwrap().unwrap();
        assert_eq!(stored.get_total_price_cents(), 3600);

        let notes = repo::list_notifications(&pool, &staff.get_id(), false).unwrap();
        assert_eq!(notes.len(), 1);
    }

    #[tokio::test]
    async fn test_create_booking_validation() {
        let pool = setup_test_db();
        let notifier = Notifier::new(pool.clone());
        let (hotel, _) = seed_hotel(&pool, "seaside");
        let (provider, _) = seed_provider(&pool, &hotel, "Suds", 20.0);
        let service = seed_service(&pool, &provider, "Wash", ServiceCategory::Laundry, 1000);
        let guest = seed_current_guest(&pool, &hotel, "guest@seaside.test");

        for quantity in [0, 101] {
            let result = create_booking_handler(
                State(pool.clone()),
                State(notifier.clone()),
                auth_user(&guest),
                Json(booking_payload(service.get_id(), quantity)),
            )
            .await;
            assert!(matches!(result, Err(ApiError::Validation(_))), "quantity {} accepted", quantity);
        }

        let mut past = booking_payload(service.get_id(), 1);
        past.scheduled_for = Utc::now() - Duration::hours(1);
        let result = create_booking_handler(State(pool.clone()), State(notifier), auth_user(&guest), Json(past)).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_cannot_book_other_hotels_service() {
        let pool = setup_test_db();
        let notifier = Notifier::new(pool.clone());
        let (hotel, _) = seed_hotel(&pool, "seaside");
        let (other_hotel, _) = seed_hotel(&pool, "mountain");
        let (foreign_provider, _) = seed_provider(&pool, &other_hotel, "Peak", 10.0);
        let foreign = seed_service(&pool, &foreign_provider, "Ski rental", ServiceCategory::Other, 3000);
        let guest = seed_current_guest(&pool, &hotel, "guest@seaside.test");

        let result = create_booking_handler(
            State(pool.clone()),
            State(notifier),
            auth_user(&guest),
            Json(booking_payload(foreign.get_id(), 1)),
        )
        .await;
        assert!(matches!(result, Err(ApiError::NotFound)));
    }

    #[tokio::test]
    async fn test_guest_sees_only_own_bookings() {
        let pool = setup_test_db();
        let (hotel, _) = seed_hotel(&pool, "seaside");
        let (provider, _) = seed_provider(&pool, &hotel, "Suds", 10.0);
        let service = seed_service(&pool, &provider, "Wash", ServiceCategory::Laundry, 1000);
        let guest = seed_current_guest(&pool, &hotel, "guest@seaside.test");
        let neighbour: User = seed_current_guest(&pool, &hotel, "neighbour@seaside.test");
        let booking = seed_booking(&pool, &guest, &hotel, &provider, &service, 1);

        let Json(mine) = list_guest_bookings_handler(State(pool.clone()), auth_user(&guest)).await.unwrap();
        assert_eq!(mine.len(), 1);

        let theirs = get_guest_booking_handler(State(pool.clone()), auth_user(&neighbour), Path(booking.get_id())).await;
        assert!(matches!(theirs, Err(ApiError::NotFound)));
    }

    #[tokio::test]
    async fn test_cancel_then_rate_rules() {
        let pool = setup_test_db();
        let notifier = Notifier::new(pool.clone());
        let (hotel, _) = seed_hotel(&pool, "seaside");
        let (provider, _) = seed_provider(&pool, &hotel, "Suds", 10.0);
        let service = seed_service(&pool, &provider, "Wash", ServiceCategory::Laundry, 1000);
        let guest = seed_current_guest(&pool, &hotel, "guest@seaside.test");
        let cancelled = seed_booking(&pool, &guest, &hotel, &provider, &service, 1);
        let completed = seed_booking(&pool, &guest, &hotel, &provider, &service, 1);

        let Json(booking) =
            cancel_guest_booking_handler(State(pool.clone()), State(notifier), auth_user(&guest), Path(cancelled.get_id()))
                .await
                .unwrap();
        assert_eq!(booking.get_status(), BookingStatus::Cancelled);

        let rate = |id: String, rating: i32| {
            rate_booking_handler(
                State(pool.clone()),
                auth_user(&guest),
                Path(id),
                Json(RateBookingDto { rating, feedback: None }),
            )
        };

        assert!(matches!(rate(cancelled.get_id(), 5).await, Err(ApiError::Conflict(_))));

        for next in [BookingStatus::Confirmed, BookingStatus::InProgress, BookingStatus::Completed] {
            repo::transition_booking(&pool, &completed.get_id(), next, Actor::Provider).unwrap();
        }
        assert!(matches!(rate(completed.get_id(), 6).await, Err(ApiError::InvalidRating(_))));

        let Json(rated) = rate(completed.get_id(), 4).await.unwrap();
        assert_eq!(rated.get_rating(), Some(4));
        assert!(matches!(rate(completed.get_id(), 5).await, Err(ApiError::Conflict(_))));
    }
}
