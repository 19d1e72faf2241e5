use axum::{extract::State, http::StatusCode};
use chrono::Utc;
use std::sync::Arc;
use tracing::{instrument, debug, info};

use crate::analytics;
use crate::auth::{self, AuthUser};
use crate::db::DbPool;
use crate::dto::{
    BookingQueryDto, CreateGuestDto, CreateProviderDto, HotelDashboard, UpdateGuestDto, UpdateHotelProfileDto,
    UpdateMarkupDto, UpdateProviderDto,
};
use crate::errors::ApiError;
use crate::extract::{Json, Path, Query};
use crate::models::{Actor, Booking, BookingStatus, Hotel, Payment, PaymentMethod, PaymentStatus, Role, ServiceProvider, User};
use crate::notifications::Notifier;
use crate::pricing;
use crate::repo::{self, BookingScope, GuestChanges, HotelProfileChanges, ProviderChanges, UserFilter};

/// Number of services listed on the hotel dashboard
const DASHBOARD_TOP_SERVICES: usize = 5;

/// Loads a provider of the admin's hotel; providers of other hotels are reported as missing
fn own_provider(pool: &DbPool, hotel_id: &str, provider_id: &str) -> Result<ServiceProvider, ApiError> {
    repo::get_provider_for_hotel(pool, hotel_id, provider_id)?.ok_or(ApiError::NotFound)
}

/// Handler for the admin's own hotel profile
#[instrument(skip(pool, auth))]
pub async fn get_hotel_profile_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
) -> Result<Json<Hotel>, ApiError> {
    let hotel_id = auth.require_hotel_admin()?;

    let hotel = repo::get_hotel(&pool, &hotel_id)?.ok_or(ApiError::NotFound)?;
    Ok(Json(hotel))
}

/// Handler for editing the hotel profile
///
/// This function handles PUT requests to `/api/hotel/profile`. Fields left
/// out of the body are unchanged.
#[instrument(skip(pool, auth, payload))]
pub async fn update_hotel_profile_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
    Json(payload): Json<UpdateHotelProfileDto>,
) -> Result<Json<Hotel>, ApiError> {
    let hotel_id = auth.require_hotel_admin()?;
    payload.validate()?;

    let changes = HotelProfileChanges {
        name: payload.name.map(|name| name.trim().to_string()),
        address: payload.address,
        contact_email: payload.contact_email.map(|email| email.trim().to_string()),
        brand_color: payload.brand_color,
    };
    let hotel = repo::update_hotel_profile(&pool, &hotel_id, changes)?;

    info!("Updated profile of hotel {}", hotel_id);
    Ok(Json(hotel))
}

/// Handler for contracting a new service provider
///
/// This function handles POST requests to `/api/hotel/service-providers`.
/// The provider's staff login is created with it.
///
/// ### Returns
///
/// 201 with the new provider
#[instrument(skip(pool, auth, payload), fields(name = %payload.name))]
pub async fn create_provider_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
    Json(payload): Json<CreateProviderDto>,
) -> Result<(StatusCode, Json<ServiceProvider>), ApiError> {
    let hotel_id = auth.require_hotel_admin()?;
    payload.validate()?;

    let provider = ServiceProvider::new(
        hotel_id.clone(),
        payload.name.trim().to_string(),
        payload.category,
        payload.contact_email.trim().to_string(),
        payload.phone,
        payload.markup_percentage,
    );
    let login = User::new(
        &payload.login_email,
        auth::hash_password(&payload.login_password)?,
        provider.get_name(),
        Role::ServiceProvider,
    )
    .with_hotel(hotel_id)
    .with_service_provider(provider.get_id());

    let provider = repo::create_provider_with_login(&pool, &provider, &login)?;
    info!("Created service provider {}", provider.get_id());

    Ok((StatusCode::CREATED, Json(provider)))
}

#[instrument(skip(pool, auth))]
pub async fn list_providers_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
) -> Result<Json<Vec<ServiceProvider>>, ApiError> {
    let hotel_id = auth.require_hotel_admin()?;

    let providers = repo::list_providers(&pool, &hotel_id)?;
    debug!("Listed {} providers", providers.len());
    Ok(Json(providers))
}

#[instrument(skip(pool, auth), fields(provider_id = %id))]
pub async fn get_provider_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ServiceProvider>, ApiError> {
    let hotel_id = auth.require_hotel_admin()?;

    Ok(Json(own_provider(&pool, &hotel_id, &id)?))
}

/// Handler for editing a provider's details
///
/// This function handles PUT requests to `/api/hotel/service-providers/{id}`.
#[instrument(skip(pool, auth, payload), fields(provider_id = %id))]
pub async fn update_provider_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateProviderDto>,
) -> Result<Json<ServiceProvider>, ApiError> {
    let hotel_id = auth.require_hotel_admin()?;
    payload.validate()?;
    own_provider(&pool, &hotel_id, &id)?;

    let changes = ProviderChanges {
        name: payload.name.map(|name| name.trim().to_string()),
        category: payload.category,
        contact_email: payload.contact_email.map(|email| email.trim().to_string()),
        phone: payload.phone,
        markup_percentage: payload.markup_percentage,
        is_active: None,
    };
    let provider = repo::update_provider(&pool, &id, changes)?;

    info!("Updated service provider {}", id);
    Ok(Json(provider))
}

/// Handler for removing a provider
///
/// This function handles DELETE requests to
/// `/api/hotel/service-providers/{id}`. The provider, its staff and its
/// services are deactivated; existing bookings keep pointing at them.
#[instrument(skip(pool, auth), fields(provider_id = %id))]
pub async fn delete_provider_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let hotel_id = auth.require_hotel_admin()?;
    own_provider(&pool, &hotel_id, &id)?;

    repo::deactivate_provider(&pool, &id)?;
    info!("Deactivated service provider {}", id);

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for changing the markup the hotel adds to a provider's prices
///
/// This function handles PUT requests to
/// `/api/hotel/service-providers/{id}/markup`. Existing bookings keep the
/// markup they were priced with.
///
/// ### Errors
///
/// 400 when the markup is outside `[0, 100]`
#[instrument(skip(pool, auth), fields(provider_id = %id, markup = %payload.markup_percentage))]
pub async fn update_markup_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateMarkupDto>,
) -> Result<Json<ServiceProvider>, ApiError> {
    let hotel_id = auth.require_hotel_admin()?;
    let markup = pricing::validate_percentage("markup_percentage", payload.markup_percentage)?;
    own_provider(&pool, &hotel_id, &id)?;

    let provider = repo::set_markup(&pool, &id, markup)?;
    Ok(Json(provider))
}

/// Handler for checking a guest in
///
/// This function handles POST requests to `/api/hotel/guests`.
///
/// ### Returns
///
/// 201 with the new guest account
#[instrument(skip(pool, auth, payload))]
pub async fn create_guest_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
    Json(payload): Json<CreateGuestDto>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let hotel_id = auth.require_hotel_admin()?;
    payload.validate(Utc::now())?;

    let guest = User::new(
        &payload.email,
        auth::hash_password(&payload.password)?,
        payload.full_name.trim().to_string(),
        Role::Guest,
    )
    .with_hotel(hotel_id)
    .with_stay(payload.room_number.trim().to_string(), payload.checkout_at);
    let guest = repo::create_user(&pool, &guest)?;

    info!("Checked in guest {}", guest.get_id());
    Ok((StatusCode::CREATED, Json(guest)))
}

#[instrument(skip(pool, auth))]
pub async fn list_guests_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
) -> Result<Json<Vec<User>>, ApiError> {
    let hotel_id = auth.require_hotel_admin()?;

    let filter = UserFilter {
        role: Some(Role::Guest),
        hotel_id: Some(hotel_id),
        ..Default::default()
    };
    Ok(Json(repo::list_users(&pool, &filter)?))
}

/// Handler for changing a guest's stay
///
/// This function handles PATCH requests to `/api/hotel/guests/{id}`. Moving
/// the checkout into the past leaves the account for the next checkout
/// sweep; `is_active: false` locks the guest out at once.
#[instrument(skip(pool, auth, payload), fields(guest_id = %id))]
pub async fn update_guest_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateGuestDto>,
) -> Result<Json<User>, ApiError> {
    let hotel_id = auth.require_hotel_admin()?;
    payload.validate()?;

    let changes = GuestChanges {
        full_name: payload.full_name.map(|name| name.trim().to_string()),
        room_number: payload.room_number.map(|room| room.trim().to_string()),
        checkout_at: payload.checkout_at.map(|checkout| checkout.naive_utc()),
        is_active: payload.is_active,
    };
    let guest = repo::update_guest(&pool, &hotel_id, &id, changes)?;

    if payload.is_active == Some(false) {
        repo::revoke_all_refresh_tokens(&pool, &id)?;
    }
    Ok(Json(guest))
}

/// Handler for the hotel's bookings
///
/// This function handles GET requests to `/api/hotel/bookings`. `status`
/// may be given several times; no status means all bookings.
#[instrument(skip(pool, auth))]
pub async fn list_hotel_bookings_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
    Query(query): Query<BookingQueryDto>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    let hotel_id = auth.require_hotel_admin()?;

    let bookings = repo::list_bookings(&pool, &BookingScope::Hotel(hotel_id), &query.status)?;
    debug!("Listed {} bookings", bookings.len());
    Ok(Json(bookings))
}

/// Handler for a hotel admin cancelling a booking
///
/// This function handles PATCH requests to `/api/hotel/bookings/{id}/cancel`.
///
/// ### Errors
///
/// 404 for bookings of other hotels; 409 once work has started
#[instrument(skip(pool, notifier, auth), fields(booking_id = %id))]
pub async fn cancel_hotel_booking_handler(
    State(pool): State<Arc<DbPool>>,
    State(notifier): State<Notifier>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Booking>, ApiError> {
    let hotel_id = auth.require_hotel_admin()?;
    repo::get_booking_in_scope(&pool, &BookingScope::Hotel(hotel_id), &id)?.ok_or(ApiError::NotFound)?;

    let booking = repo::transition_booking(&pool, &id, BookingStatus::Cancelled, Actor::HotelAdmin)?;
    notifier.booking_status_changed(&booking);

    info!("Hotel admin cancelled booking {}", id);
    Ok(Json(booking))
}

/// Handler for confirming a cash payment at the front desk
///
/// This function handles POST requests to
/// `/api/hotel/payments/{id}/mark-paid`.
///
/// ### Errors
///
/// 404 for payments of other hotels; 409 for card payments, which only the
/// gateway settles
#[instrument(skip(pool, notifier, auth), fields(payment_id = %id))]
pub async fn mark_payment_paid_handler(
    State(pool): State<Arc<DbPool>>,
    State(notifier): State<Notifier>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Payment>, ApiError> {
    let hotel_id = auth.require_hotel_admin()?;

    let payment = repo::get_payment(&pool, &id)?.ok_or(ApiError::NotFound)?;
    repo::get_booking_in_scope(&pool, &BookingScope::Hotel(hotel_id), &payment.get_booking_id())?
        .ok_or(ApiError::NotFound)?;
    if payment.get_method() != PaymentMethod::Cash {
        return Err(ApiError::Conflict("Only cash payments can be marked paid".to_string()));
    }

    let (payment, booking) = repo::settle_payment(&pool, &id, PaymentStatus::Paid)?;
    notifier.payment_updated(&booking);

    info!("Cash payment {} marked paid", id);
    Ok(Json(payment))
}

/// Handler for the hotel dashboard
///
/// This function handles GET requests to `/api/hotel/dashboard`.
#[instrument(skip(pool, auth))]
pub async fn hotel_dashboard_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
) -> Result<Json<HotelDashboard>, ApiError> {
    let hotel_id = auth.require_hotel_admin()?;

    let bookings = repo::list_bookings(&pool, &BookingScope::Hotel(hotel_id.clone()), &[])?;

    Ok(Json(HotelDashboard {
        bookings: analytics::status_breakdown(&bookings),
        revenue: analytics::revenue_summary(&bookings),
        revenue_by_month: analytics::revenue_by_month(&bookings),
        revenue_by_category: analytics::revenue_by_category(&bookings),
        top_services: analytics::top_services(&bookings, DASHBOARD_TOP_SERVICES),
        ratings: analytics::rating_summary(&bookings),
        active_guests: repo::count_active_guests(&pool, &hotel_id)?,
        active_providers: repo::count_active_providers(&pool, &hotel_id)?,
    }))
}
