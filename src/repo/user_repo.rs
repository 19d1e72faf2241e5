use crate::db::DbPool;
use crate::models::{Role, User};
use crate::models::normalize_email;
use crate::schema::{refresh_tokens, users};
use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use anyhow::Result;
use tracing::{instrument, debug, info};

use super::RepoError;

/// Optional filters for listing users
#[derive(Debug, Default, Clone)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub hotel_id: Option<String>,
    pub service_provider_id: Option<String>,
    pub active_only: bool,
}

/// Changes a hotel admin may make to a guest's stay
#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = users)]
pub struct GuestChanges {
    pub full_name: Option<String>,
    pub room_number: Option<String>,
    pub checkout_at: Option<NaiveDateTime>,
    pub is_active: Option<bool>,
}

/// Inserts a new user
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `user` - The user to insert
///
/// ### Returns
///
/// A Result containing the inserted user
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - The email is already registered (unique violation)
#[instrument(skip(pool, user), fields(email = %user.get_email(), role = %user.get_role()))]
pub fn create_user(pool: &DbPool, user: &User) -> Result<User> {
    debug!("Creating user");

    let conn = &mut pool.get()?;

    diesel::insert_into(users::table)
        .values(user)
        .execute(conn)?;

    info!("Created user with id: {}", user.get_id());
    Ok(user.clone())
}

/// Retrieves a user by ID
#[instrument(skip(pool))]
pub fn get_user(pool: &DbPool, user_id: &str) -> Result<Option<User>> {
    let conn = &mut pool.get()?;

    let result = users::table
        .find(user_id)
        .first::<User>(conn)
        .optional()?;

    Ok(result)
}

/// Retrieves a user by email, case-insensitively
#[instrument(skip(pool))]
pub fn get_user_by_email(pool: &DbPool, email: &str) -> Result<Option<User>> {
    let conn = &mut pool.get()?;

    let result = users::table
        .filter(users::email.eq(normalize_email(email)))
        .first::<User>(conn)
        .optional()?;

    Ok(result)
}

/// Lists users matching the filter, newest first
#[instrument(skip(pool))]
pub fn list_users(pool: &DbPool, filter: &UserFilter) -> Result<Vec<User>> {
    let conn = &mut pool.get()?;

    let mut query = users::table.into_boxed();

    if let Some(role) = filter.role {
        query = query.filter(users::role.eq(role));
    }
    if let Some(hotel_id) = &filter.hotel_id {
        query = query.filter(users::hotel_id.eq(hotel_id.clone()));
    }
    if let Some(provider_id) = &filter.service_provider_id {
        query = query.filter(users::service_provider_id.eq(provider_id.clone()));
    }
    if filter.active_only {
        query = query.filter(users::is_active.eq(true));
    }

    let result = query
        .order(users::created_at.desc())
        .load::<User>(conn)?;

    debug!("Retrieved {} users", result.len());
    Ok(result)
}

/// Updates a guest of the given hotel
///
/// ### Errors
///
/// Returns `RepoError::NotFound` if no guest with this ID belongs to the hotel
#[instrument(skip(pool, changes))]
pub fn update_guest(pool: &DbPool, hotel_id: &str, guest_id: &str, changes: GuestChanges) -> Result<User> {
    let conn = &mut pool.get()?;
    let now = Utc::now().naive_utc();

    let target = users::table
        .filter(users::id.eq(guest_id))
        .filter(users::hotel_id.eq(hotel_id))
        .filter(users::role.eq(Role::Guest));

    let updated = diesel::update(target)
        .set((changes, users::updated_at.eq(now)))
        .get_result::<User>(conn)
        .optional()?
        .ok_or(RepoError::NotFound("guest"))?;

    info!("Updated guest {}", guest_id);
    Ok(updated)
}

/// Counts users per role; roles without users are reported as zero
pub fn count_users_by_role(pool: &DbPool) -> Result<Vec<(Role, i64)>> {
    let conn = &mut pool.get()?;

    let mut counts = Vec::with_capacity(Role::ALL.len());
    for role in Role::ALL {
        let count = users::table
            .filter(users::role.eq(*role))
            .count()
            .get_result::<i64>(conn)?;
        counts.push((*role, count));
    }

    Ok(counts)
}

/// Counts the active guests of a hotel
pub fn count_active_guests(pool: &DbPool, hotel_id: &str) -> Result<i64> {
    let conn = &mut pool.get()?;

    let count = users::table
        .filter(users::hotel_id.eq(hotel_id))
        .filter(users::role.eq(Role::Guest))
        .filter(users::is_active.eq(true))
        .count()
        .get_result::<i64>(conn)?;

    Ok(count)
}

/// Whether at least one superadmin account exists
pub fn superadmin_exists(pool: &DbPool) -> Result<bool> {
    let conn = &mut pool.get()?;

    let count = users::table
        .filter(users::role.eq(Role::Superadmin))
        .count()
        .get_result::<i64>(conn)?;

    Ok(count > 0)
}

/// Deactivates guests whose checkout time has passed
///
/// Their outstanding refresh tokens are revoked in the same transaction so
/// they cannot mint new access tokens.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `now` - The sweep time; guests with `checkout_at <= now` are affected
///
/// ### Returns
///
/// The number of guests deactivated
#[instrument(skip(pool))]
pub fn deactivate_checked_out_guests(pool: &DbPool, now: DateTime<Utc>) -> Result<usize> {
    let conn = &mut pool.get()?;
    let now = now.naive_utc();

    let affected = conn.transaction::<_, anyhow::Error, _>(|conn| {
        let guest_ids: Vec<String> = users::table
            .filter(users::role.eq(Role::Guest))
            .filter(users::is_active.eq(true))
            .filter(users::checkout_at.le(now))
            .select(users::id)
            .load(conn)?;

        if guest_ids.is_empty() {
            return Ok(0);
        }

        diesel::update(users::table.filter(users::id.eq_any(&guest_ids)))
            .set((users::is_active.eq(false), users::updated_at.eq(now)))
            .execute(conn)?;

        diesel::update(
            refresh_tokens::table
                .filter(refresh_tokens::user_id.eq_any(&guest_ids))
                .filter(refresh_tokens::revoked_at.is_null()),
        )
        .set(refresh_tokens::revoked_at.eq(Some(now)))
        .execute(conn)?;

        Ok(guest_ids.len())
    })?;

    if affected > 0 {
        info!("Deactivated {} checked-out guests", affected);
    }
    Ok(affected)
}
