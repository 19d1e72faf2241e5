use axum::extract::State;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{instrument, debug};

use crate::db::DbPool;
use crate::dto::PublicHotelDto;
use crate::errors::ApiError;
use crate::extract::{Json, Path};
use crate::repo;

/// Liveness probe
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Handler for a hotel's public branding
///
/// This function handles GET requests to `/api/hotels/{slug}`. Inactive
/// hotels are reported as missing.
#[instrument(skip(pool))]
pub async fn get_public_hotel_handler(
    State(pool): State<Arc<DbPool>>,
    Path(slug): Path<String>,
) -> Result<Json<PublicHotelDto>, ApiError> {
    debug!("Looking up hotel branding");

    let hotel = repo::get_hotel_by_slug(&pool, &slug)?
        .filter(|hotel| hotel.get_is_active())
        .ok_or(ApiError::NotFound)?;

    Ok(Json(PublicHotelDto::from(&hotel)))
}
