use crate::db::DbPool;
use crate::models::{Booking, BookingStatus, Payment, PaymentStatus};
use crate::schema::{bookings, payments};
use chrono::Utc;
use diesel::prelude::*;
use anyhow::Result;
use tracing::{instrument, debug, info};

use super::RepoError;

/// Records a payment intent and marks its booking as awaiting payment
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `payment` - The new intent, already carrying the booking total
///
/// ### Returns
///
/// A Result containing the stored payment
///
/// ### Errors
///
/// Returns `RepoError::NotFound` if the booking does not exist, or
/// `RepoError::Conflict` if the booking is cancelled, rejected, already paid
/// or still has a pending intent
#[instrument(skip(pool, payment), fields(booking_id = %payment.get_booking_id(), method = %payment.get_method()))]
pub fn create_payment_intent(pool: &DbPool, payment: &Payment) -> Result<Payment> {
    let conn = &mut pool.get()?;
    let now = Utc::now().naive_utc();
    let booking_id = payment.get_booking_id();

    conn.transaction::<_, anyhow::Error, _>(|conn| {
        let booking = bookings::table
            .find(&booking_id)
            .first::<Booking>(conn)
            .optional()?
            .ok_or(RepoError::NotFound("booking"))?;

        if matches!(booking.get_status(), BookingStatus::Cancelled | BookingStatus::Rejected) {
            return Err(RepoError::Conflict(format!("Cannot pay for a {} booking", booking.get_status())).into());
        }
        if matches!(booking.get_payment_status(), PaymentStatus::Paid | PaymentStatus::Refunded) {
            return Err(RepoError::Conflict("Booking is already paid".to_string()).into());
        }
        let open = payments::table
            .filter(payments::booking_id.eq(&booking_id))
            .filter(payments::status.eq(PaymentStatus::Pending))
            .count()
            .get_result::<i64>(conn)?;
        if open > 0 {
            return Err(RepoError::Conflict("Booking already has a pending payment".to_string()).into());
        }

        diesel::insert_into(payments::table)
            .values(payment)
            .execute(conn)?;

        diesel::update(bookings::table.find(&booking_id))
            .set((bookings::payment_status.eq(PaymentStatus::Pending), bookings::updated_at.eq(now)))
            .execute(conn)?;

        Ok(())
    })?;

    info!("Created payment intent {}", payment.get_reference());
    Ok(payment.clone())
}

/// Retrieves a payment by ID
#[instrument(skip(pool))]
pub fn get_payment(pool: &DbPool, payment_id: &str) -> Result<Option<Payment>> {
    let conn = &mut pool.get()?;

    let result = payments::table
        .find(payment_id)
        .first::<Payment>(conn)
        .optional()?;

    Ok(result)
}

/// Retrieves a payment by the reference the gateway echoes back
#[instrument(skip(pool))]
pub fn get_payment_by_reference(pool: &DbPool, reference: &str) -> Result<Option<Payment>> {
    let conn = &mut pool.get()?;

    let result = payments::table
        .filter(payments::reference.eq(reference))
        .first::<Payment>(conn)
        .optional()?;

    Ok(result)
}

/// Lists every payment attempt for a booking, oldest first
pub fn list_payments_for_booking(pool: &DbPool, booking_id: &str) -> Result<Vec<Payment>> {
    let conn = &mut pool.get()?;

    let result = payments::table
        .filter(payments::booking_id.eq(booking_id))
        .order(payments::created_at.asc())
        .load::<Payment>(conn)?;

    debug!("Retrieved {} payments", result.len());
    Ok(result)
}

/// The payment status a booking shows, given every attempt made for it
///
/// A captured payment outranks anything a stale attempt reports later.
fn booking_payment_status(attempts: &[Payment]) -> PaymentStatus {
    let any = |status: PaymentStatus| attempts.iter().any(|p| p.get_status() == status);

    [PaymentStatus::Paid, PaymentStatus::Refunded, PaymentStatus::Pending, PaymentStatus::Failed]
        .into_iter()
        .find(|status| any(*status))
        .unwrap_or(PaymentStatus::Unpaid)
}

/// Applies a settlement outcome to a payment and its booking
///
/// Re-applying the payment's current status succeeds without changes, so
/// repeated gateway deliveries are harmless. The booking's payment status
/// is recomputed from all of its payments, and a second payment can never
/// be captured once another one has been.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `payment_id` - The payment to settle
/// * `next` - The outcome reported by the gateway or the front desk
///
/// ### Returns
///
/// The payment and the booking after the change
///
/// ### Errors
///
/// Returns `RepoError::NotFound` if the payment does not exist,
/// `RepoError::InvalidTransition` if the outcome does not follow from the
/// payment's current status, or `RepoError::Conflict` when capturing a
/// payment for a booking another payment already covers
#[instrument(skip(pool))]
pub fn settle_payment(pool: &DbPool, payment_id: &str, next: PaymentStatus) -> Result<(Payment, Booking)> {
    let conn = &mut pool.get()?;
    let now = Utc::now().naive_utc();

    let settled = conn.transaction::<_, anyhow::Error, _>(|conn| {
        let payment = payments::table
            .find(payment_id)
            .first::<Payment>(conn)
            .optional()?
            .ok_or(RepoError::NotFound("payment"))?;

        if !payment.get_status().can_settle_to(next) {
            return Err(RepoError::InvalidTransition(format!(
                "Cannot move payment from {} to {}",
                payment.get_status(),
                next
            ))
            .into());
        }

        if payment.get_status() == next {
            let booking = bookings::table
                .find(payment.get_booking_id())
                .first::<Booking>(conn)?;
            return Ok((payment, booking));
        }

        let booking_id = payment.get_booking_id();
        if next == PaymentStatus::Paid {
            let captured = payments::table
                .filter(payments::booking_id.eq(&booking_id))
                .filter(payments::id.ne(payment_id))
                .filter(payments::status.eq_any(vec![PaymentStatus::Paid, PaymentStatus::Refunded]))
                .count()
                .get_result::<i64>(conn)?;
            if captured > 0 {
                return Err(RepoError::Conflict("Booking is already covered by another payment".to_string()).into());
            }
        }

        let payment = diesel::update(payments::table.find(payment_id))
            .set((payments::status.eq(next), payments::updated_at.eq(now)))
            .get_result::<Payment>(conn)?;

        let attempts = payments::table
            .filter(payments::booking_id.eq(&booking_id))
            .load::<Payment>(conn)?;
        let booking = diesel::update(bookings::table.find(&booking_id))
            .set((
                bookings::payment_status.eq(booking_payment_status(&attempts)),
                bookings::updated_at.eq(now),
            ))
            .get_result::<Booking>(conn)?;

        Ok((payment, booking))
    })?;

    info!("Payment {} is now {}", payment_id, next);
    Ok(settled)
}

#[cfg(test)]
mod tests;
