use crate::db::DbPool;
use crate::models::{Hotel, User};
use crate::schema::{hotels, users};
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use anyhow::Result;
use tracing::{instrument, debug, info};

use super::RepoError;

/// Fields a hotel admin may change on their hotel's profile
#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = hotels)]
pub struct HotelProfileChanges {
    pub name: Option<String>,
    pub address: Option<String>,
    pub contact_email: Option<String>,
    pub brand_color: Option<String>,
}

/// Platform-level hotel settings the superadmin controls
#[derive(Debug, Default)]
pub struct HotelSettingsChanges {
    pub is_active: Option<bool>,
    pub platform_commission_percentage: Option<f64>,
}

/// Creates a hotel together with its first hotel admin
///
/// Both rows are written in one transaction so a hotel never exists without
/// an admin able to manage it.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `hotel` - The hotel to insert
/// * `admin` - The hotel admin account, already attached to the hotel
///
/// ### Returns
///
/// A Result containing the inserted hotel
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - The slug or the admin email is already taken
#[instrument(skip(pool, hotel, admin), fields(slug = %hotel.get_slug(), admin_email = %admin.get_email()))]
pub fn create_hotel_with_admin(pool: &DbPool, hotel: &Hotel, admin: &User) -> Result<Hotel> {
    debug!("Creating hotel with admin");

    let conn = &mut pool.get()?;

    conn.transaction::<_, anyhow::Error, _>(|conn| {
        diesel::insert_into(hotels::table)
            .values(hotel)
            .execute(conn)?;
        diesel::insert_into(users::table)
            .values(admin)
            .execute(conn)?;
        Ok(())
    })?;

    info!("Created hotel with id: {}", hotel.get_id());
    Ok(hotel.clone())
}

/// Retrieves a hotel by its ID
#[instrument(skip(pool))]
pub fn get_hotel(pool: &DbPool, hotel_id: &str) -> Result<Option<Hotel>> {
    let conn = &mut pool.get()?;

    let result = hotels::table
        .find(hotel_id)
        .first::<Hotel>(conn)
        .optional()?;

    Ok(result)
}

/// Retrieves a hotel by its portal slug
#[instrument(skip(pool))]
pub fn get_hotel_by_slug(pool: &DbPool, slug: &str) -> Result<Option<Hotel>> {
    let conn = &mut pool.get()?;

    let result = hotels::table
        .filter(hotels::slug.eq(slug))
        .first::<Hotel>(conn)
        .optional()?;

    Ok(result)
}

/// Lists every hotel, by name
#[instrument(skip(pool))]
pub fn list_hotels(pool: &DbPool) -> Result<Vec<Hotel>> {
    let conn = &mut pool.get()?;

    let result = hotels::table
        .order(hotels::name.asc())
        .load::<Hotel>(conn)?;

    debug!("Retrieved {} hotels", result.len());
    Ok(result)
}

/// Updates a hotel's public profile
///
/// ### Errors
///
/// Returns `RepoError::NotFound` if the hotel does not exist
#[instrument(skip(pool, changes))]
pub fn update_hotel_profile(pool: &DbPool, hotel_id: &str, changes: HotelProfileChanges) -> Result<Hotel> {
    let conn = &mut pool.get()?;
    let now = Utc::now().naive_utc();

    let updated = diesel::update(hotels::table.find(hotel_id))
        .set((changes, hotels::updated_at.eq(now)))
        .get_result::<Hotel>(conn)
        .optional()?
        .ok_or(RepoError::NotFound("hotel"))?;

    info!("Updated profile of hotel {}", hotel_id);
    Ok(updated)
}

/// Updates a hotel's activation flag and platform commission
///
/// ### Errors
///
/// Returns `RepoError::NotFound` if the hotel does not exist
#[instrument(skip(pool))]
pub fn update_hotel_settings(pool: &DbPool, hotel_id: &str, changes: HotelSettingsChanges) -> Result<Hotel> {
    #[derive(AsChangeset)]
    #[diesel(table_name = hotels)]
    struct SettingsChangeset {
        is_active: Option<bool>,
        platform_commission_percentage: Option<f64>,
        updated_at: NaiveDateTime,
    }

    let conn = &mut pool.get()?;

    let changeset = SettingsChangeset {
        is_active: changes.is_active,
        platform_commission_percentage: changes.platform_commission_percentage,
        updated_at: Utc::now().naive_utc(),
    };

    let updated = diesel::update(hotels::table.find(hotel_id))
        .set(changeset)
        .get_result::<Hotel>(conn)
        .optional()?
        .ok_or(RepoError::NotFound("hotel"))?;

    info!("Updated settings of hotel {}", hotel_id);
    Ok(updated)
}

/// Counts hotels as `(total, active)`
pub fn count_hotels(pool: &DbPool) -> Result<(i64, i64)> {
    let conn = &mut pool.get()?;

    let total = hotels::table.count().get_result::<i64>(conn)?;
    let active = hotels::table
        .filter(hotels::is_active.eq(true))
        .count()
        .get_result::<i64>(conn)?;

    Ok((total, active))
}
