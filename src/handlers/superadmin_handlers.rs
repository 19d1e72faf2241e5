use axum::{extract::State, http::StatusCode};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{instrument, debug, info};

use crate::analytics;
use crate::auth::{self, AuthUser};
use crate::db::DbPool;
use crate::dto::{CreateHotelDto, CreatedHotelResponse, PlatformDashboard, UpdateHotelSettingsDto, UserQueryDto};
use crate::errors::ApiError;
use crate::extract::{Json, Path, Query};
use crate::models::{Hotel, Role, User};
use crate::repo::{self, BookingScope, HotelSettingsChanges, UserFilter};

/// Handler for onboarding a hotel
///
/// This function handles POST requests to `/api/superadmin/hotels`. The hotel
/// and its first hotel admin are created together.
///
/// ### Returns
///
/// 201 with the hotel and its admin
///
/// ### Errors
///
/// 409 when the slug or the admin email is already taken
#[instrument(skip(pool, auth, payload), fields(slug = %payload.slug))]
pub async fn create_hotel_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
    Json(payload): Json<CreateHotelDto>,
) -> Result<(StatusCode, Json<CreatedHotelResponse>), ApiError> {
    auth.require_role(Role::Superadmin)?;
    payload.validate()?;

    let hotel = Hotel::new(
        payload.name.trim().to_string(),
        payload.slug.clone(),
        payload.address.trim().to_string(),
        payload.contact_email.trim().to_string(),
        payload.platform_commission_percentage,
    );
    let admin = User::new(
        &payload.admin_email,
        auth::hash_password(&payload.admin_password)?,
        payload.admin_name.trim().to_string(),
        Role::HotelAdmin,
    )
    .with_hotel(hotel.get_id());

    let hotel = repo::create_hotel_with_admin(&pool, &hotel, &admin)?;
    info!("Created hotel {} with admin {}", hotel.get_id(), admin.get_id());

    Ok((StatusCode::CREATED, Json(CreatedHotelResponse { hotel, admin })))
}

/// Handler for listing every hotel on the platform
#[instrument(skip(pool, auth))]
pub async fn list_hotels_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
) -> Result<Json<Vec<Hotel>>, ApiError> {
    auth.require_role(Role::Superadmin)?;

    let hotels = repo::list_hotels(&pool)?;
    debug!("Listed {} hotels", hotels.len());
    Ok(Json(hotels))
}

/// Handler for a single hotel
#[instrument(skip(pool, auth), fields(hotel_id = %id))]
pub async fn get_hotel_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Hotel>, ApiError> {
    auth.require_role(Role::Superadmin)?;

    let hotel = repo::get_hotel(&pool, &id)?.ok_or(ApiError::NotFound)?;
    Ok(Json(hotel))
}

/// Handler for the settings only the platform controls
///
/// This function handles PATCH requests to `/api/superadmin/hotels/{id}`.
/// Deactivating a hotel locks its users out at their next login or refresh.
#[instrument(skip(pool, auth, payload), fields(hotel_id = %id))]
pub async fn update_hotel_settings_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateHotelSettingsDto>,
) -> Result<Json<Hotel>, ApiError> {
    auth.require_role(Role::Superadmin)?;
    payload.validate()?;

    let hotel = repo::update_hotel_settings(
        &pool,
        &id,
        HotelSettingsChanges {
            is_active: payload.is_active,
            platform_commission_percentage: payload.platform_commission_percentage,
        },
    )?;

    info!("Updated settings of hotel {}", hotel.get_id());
    Ok(Json(hotel))
}

/// Handler for listing users across the platform
///
/// This function handles GET requests to `/api/superadmin/users`, optionally
/// filtered by `role` and `hotel_id`.
#[instrument(skip(pool, auth))]
pub async fn list_users_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
    Query(query): Query<UserQueryDto>,
) -> Result<Json<Vec<User>>, ApiError> {
    auth.require_role(Role::Superadmin)?;

    let filter = UserFilter {
        role: query.role,
        hotel_id: query.hotel_id,
        ..Default::default()
    };
    let users = repo::list_users(&pool, &filter)?;
    debug!("Listed {} users", users.len());
    Ok(Json(users))
}

/// Handler for the platform dashboard
///
/// This function handles GET requests to `/api/superadmin/dashboard`.
#[instrument(skip(pool, auth))]
pub async fn platform_dashboard_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
) -> Result<Json<PlatformDashboard>, ApiError> {
    auth.require_role(Role::Superadmin)?;

    let (hotels_total, hotels_active) = repo::count_hotels(&pool)?;
    let users_by_role: BTreeMap<String, i64> = repo::count_users_by_role(&pool)?
        .into_iter()
        .map(|(role, count)| (role.to_string(), count))
        .collect();
    let bookings = repo::list_bookings(&pool, &BookingScope::All, &[])?;

    Ok(Json(PlatformDashboard {
        hotels_total,
        hotels_active,
        users_by_role,
        bookings: analytics::status_breakdown(&bookings),
        revenue: analytics::revenue_summary(&bookings),
        revenue_by_hotel: analytics::revenue_by_hotel(&bookings),
    }))
}
