use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{instrument, debug, info, warn};

use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::dto::{CreatePaymentIntentDto, WebhookEventDto};
use crate::errors::ApiError;
use crate::extract::Json;
use crate::models::Payment;
use crate::notifications::Notifier;
use crate::repo::{self, BookingScope};
use crate::state::WebhookSecret;

/// Header carrying the hex HMAC-SHA256 of the raw webhook body
pub const SIGNATURE_HEADER: &str = "x-signature";

type HmacSha256 = Hmac<Sha256>;

fn webhook_mac(secret: &str) -> Result<HmacSha256, ApiError> {
    HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ApiError::Database(anyhow::anyhow!("Invalid webhook secret: {}", e)))
}

/// Signs a webhook body the way the payment gateway does
pub fn webhook_signature(secret: &str, body: &[u8]) -> Result<String, ApiError> {
    let mut mac = webhook_mac(secret)?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks the signature header against the body in constant time
fn verify_signature(secret: &str, headers: &HeaderMap, body: &[u8]) -> Result<(), ApiError> {
    let unauthorized = || ApiError::Unauthorized("Invalid webhook signature".to_string());

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| hex::decode(value.trim()).ok())
        .ok_or_else(unauthorized)?;

    let mut mac = webhook_mac(secret)?;
    mac.update(body);
    mac.verify_slice(&signature).map_err(|_| unauthorized())
}

/// Handler for starting a payment
///
/// This function handles POST requests to `/api/payments/create-intent`. The
/// intent is for the booking's full total; the booking's payment status
/// becomes `pending`. Card intents are settled by the gateway webhook, cash
/// intents by a hotel admin.
///
/// ### Returns
///
/// 201 with the payment, whose `reference` the gateway echoes back
///
/// ### Errors
///
/// 404 for bookings of other guests; 409 for cancelled, rejected or
/// already paid bookings
#[instrument(skip(pool, auth), fields(booking_id = %payload.booking_id, method = %payload.method))]
pub async fn create_payment_intent_handler(
    State(pool): State<Arc<DbPool>>,
    auth: AuthUser,
    Json(payload): Json<CreatePaymentIntentDto>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    auth.require_guest()?;

    let booking = repo::get_booking_in_scope(&pool, &BookingScope::Guest(auth.user.get_id()), &payload.booking_id)?
        .ok_or(ApiError::NotFound)?;

    let payment = Payment::new(booking.get_id(), booking.get_total_price_cents(), payload.method);
    let payment = repo::create_payment_intent(&pool, &payment)?;

    info!("Payment intent {} created", payment.get_reference());
    Ok((StatusCode::CREATED, Json(payment)))
}

/// Handler for payment gateway callbacks
///
/// This function handles POST requests to `/api/payments/webhook`. The body
/// must be signed with the shared webhook secret. Replaying an event that
/// was already applied is accepted and changes nothing.
///
/// ### Errors
///
/// 401 for a missing or wrong signature; 404 for an unknown reference; 409
/// when the reported outcome cannot follow the payment's current status
#[instrument(skip_all)]
pub async fn payment_webhook_handler(
    State(pool): State<Arc<DbPool>>,
    State(notifier): State<Notifier>,
    State(secret): State<Arc<WebhookSecret>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Payment>, ApiError> {
    if let Err(e) = verify_signature(&secret.0, &headers, &body) {
        warn!("Rejected webhook with a bad signature");
        return Err(e);
    }

    let event: WebhookEventDto = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Validation(format!("Invalid webhook body: {}", e)))?;
    debug!("Webhook {} for {}", event.status.payment_status(), event.reference);

    let payment = repo::get_payment_by_reference(&pool, &event.reference)?.ok_or(ApiError::NotFound)?;
    let next = event.status.payment_status();
    let unchanged = payment.get_status() == next;

    let (payment, booking) = repo::settle_payment(&pool, &payment.get_id(), next)?;
    if !unchanged {
        notifier.payment_updated(&booking);
    }

    Ok(Json(payment))
}
