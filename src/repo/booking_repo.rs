use crate::db::DbPool;
use crate::models::{Actor, Booking, BookingStatus};
use crate::schema::bookings;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use anyhow::Result;
use tracing::{instrument, debug, info};

use super::RepoError;

/// Whose bookings a query may see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingScope {
    All,
    Hotel(String),
    Provider(String),
    Guest(String),
}

impl BookingScope {
    fn query(&self) -> bookings::BoxedQuery<'static, Sqlite> {
        let query = bookings::table.into_boxed();
        match self {
            BookingScope::All => query,
            BookingScope::Hotel(id) => query.filter(bookings::hotel_id.eq(id.clone())),
            BookingScope::Provider(id) => query.filter(bookings::service_provider_id.eq(id.clone())),
            BookingScope::Guest(id) => query.filter(bookings::guest_id.eq(id.clone())),
        }
    }
}

/// Inserts a new booking
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `booking` - The priced booking to insert
///
/// ### Returns
///
/// A Result containing the inserted booking
#[instrument(skip(pool, booking), fields(guest_id = %booking.get_guest_id(), service_id = %booking.get_service_id()))]
pub fn create_booking(pool: &DbPool, booking: &Booking) -> Result<Booking> {
    debug!("Creating booking");

    let conn = &mut pool.get()?;

    diesel::insert_into(bookings::table)
        .values(booking)
        .execute(conn)?;

    info!("Created booking with id: {}", booking.get_id());
    Ok(booking.clone())
}

/// Retrieves a booking by ID
#[instrument(skip(pool))]
pub fn get_booking(pool: &DbPool, booking_id: &str) -> Result<Option<Booking>> {
    let conn = &mut pool.get()?;

    let result = bookings::table
        .find(booking_id)
        .first::<Booking>(conn)
        .optional()?;

    Ok(result)
}

/// Retrieves a booking only if it is visible in the given scope
///
/// Bookings outside the scope are reported as missing, so callers can't
/// probe other tenants' IDs.
#[instrument(skip(pool))]
pub fn get_booking_in_scope(pool: &DbPool, scope: &BookingScope, booking_id: &str) -> Result<Option<Booking>> {
    let conn = &mut pool.get()?;

    let result = scope
        .query()
        .filter(bookings::id.eq(booking_id.to_string()))
        .first::<Booking>(conn)
        .optional()?;

    Ok(result)
}

/// Lists bookings in a scope, newest first
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `scope` - Whose bookings to list
/// * `statuses` - Only bookings in one of these statuses; empty means any
#[instrument(skip(pool))]
pub fn list_bookings(pool: &DbPool, scope: &BookingScope, statuses: &[BookingStatus]) -> Result<Vec<Booking>> {
    let conn = &mut pool.get()?;

    let mut query = scope.query();
    if !statuses.is_empty() {
        query = query.filter(bookings::status.eq_any(statuses.to_vec()));
    }

    let result = query
        .order(bookings::created_at.desc())
        .load::<Booking>(conn)?;

    debug!("Retrieved {} bookings", result.len());
    Ok(result)
}

/// Moves a booking to a new status
///
/// The current status is re-read inside the transaction, so two concurrent
/// changes can't both pass the state machine check.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `booking_id` - The booking to change
/// * `next` - The requested status
/// * `actor` - Who is asking
///
/// ### Returns
///
/// The updated booking
///
/// ### Errors
///
/// Returns `RepoError::NotFound` if the booking does not exist, or
/// `RepoError::InvalidTransition` if the actor may not make this change
#[instrument(skip(pool))]
pub fn transition_booking(pool: &DbPool, booking_id: &str, next: BookingStatus, actor: Actor) -> Result<Booking> {
    let conn = &mut pool.get()?;
    let now = Utc::now().naive_utc();

    let updated = conn.transaction::<_, anyhow::Error, _>(|conn| {
        let current = bookings::table
            .find(booking_id)
            .select(bookings::status)
            .first::<BookingStatus>(conn)
            .optional()?
            .ok_or(RepoError::NotFound("booking"))?;

        if !current.can_transition_to(next, actor) {
            return Err(RepoError::InvalidTransition(format!(
                "Cannot move booking from {} to {}",
                current, next
            ))
            .into());
        }

        let booking = diesel::update(bookings::table.find(booking_id))
            .set((bookings::status.eq(next), bookings::updated_at.eq(now)))
            .get_result::<Booking>(conn)?;
        Ok(booking)
    })?;

    info!("Booking {} is now {}", booking_id, next);
    Ok(updated)
}

/// Records the guest's rating of a completed booking
///
/// ### Errors
///
/// Returns `RepoError::NotFound` if the booking does not exist, or
/// `RepoError::Conflict` if it is not completed or was already rated
#[instrument(skip(pool, feedback))]
pub fn rate_booking(pool: &DbPool, booking_id: &str, rating: i32, feedback: Option<String>) -> Result<Booking> {
    let conn = &mut pool.get()?;
    let now = Utc::now().naive_utc();

    let updated = conn.transaction::<_, anyhow::Error, _>(|conn| {
        let booking = bookings::table
            .find(booking_id)
            .first::<Booking>(conn)
            .optional()?
            .ok_or(RepoError::NotFound("booking"))?;

        if booking.get_status() != BookingStatus::Completed {
            return Err(RepoError::Conflict("Only completed bookings can be rated".to_string()).into());
        }
        if booking.get_rating().is_some() {
            return Err(RepoError::Conflict("Booking already rated".to_string()).into());
        }

        let booking = diesel::update(bookings::table.find(booking_id))
            .set((
                bookings::rating.eq(Some(rating)),
                bookings::feedback.eq(feedback),
                bookings::updated_at.eq(now),
            ))
            .get_result::<Booking>(conn)?;
        Ok(booking)
    })?;

    info!("Booking {} rated {}", booking_id, rating);
    Ok(updated)
}
