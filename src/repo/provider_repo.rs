use crate::db::DbPool;
use crate::models::{ServiceCategory, ServiceProvider, User};
use crate::schema::{service_providers, services, users};
use chrono::Utc;
use diesel::prelude::*;
use anyhow::Result;
use tracing::{instrument, debug, info};

use super::RepoError;

/// Editable provider details
#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = service_providers)]
pub struct ProviderChanges {
    pub name: Option<String>,
    pub category: Option<ServiceCategory>,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub markup_percentage: Option<f64>,
    pub is_active: Option<bool>,
}

/// Creates a service provider together with its login account
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `provider` - The provider to insert
/// * `login` - The provider staff account, attached to the provider
///
/// ### Returns
///
/// A Result containing the inserted provider
///
/// ### Errors
///
/// Returns an error if the login email is taken or the hotel does not exist
#[instrument(skip(pool, provider, login), fields(hotel_id = %provider.get_hotel_id(), name = %provider.get_name()))]
pub fn create_provider_with_login(pool: &DbPool, provider: &ServiceProvider, login: &User) -> Result<ServiceProvider> {
    debug!("Creating service provider");

    let conn = &mut pool.get()?;

    conn.transaction::<_, anyhow::Error, _>(|conn| {
        diesel::insert_into(service_providers::table)
            .values(provider)
            .execute(conn)?;
        diesel::insert_into(users::table)
            .values(login)
            .execute(conn)?;
        Ok(())
    })?;

    info!("Created service provider with id: {}", provider.get_id());
    Ok(provider.clone())
}

/// Retrieves a provider by ID
#[instrument(skip(pool))]
pub fn get_provider(pool: &DbPool, provider_id: &str) -> Result<Option<ServiceProvider>> {
    let conn = &mut pool.get()?;

    let result = service_providers::table
        .find(provider_id)
        .first::<ServiceProvider>(conn)
        .optional()?;

    Ok(result)
}

/// Retrieves a provider only if it belongs to the given hotel
pub fn get_provider_for_hotel(pool: &DbPool, hotel_id: &str, provider_id: &str) -> Result<Option<ServiceProvider>> {
    Ok(get_provider(pool, provider_id)?.filter(|p| p.get_hotel_id() == hotel_id))
}

/// Lists a hotel's providers by name
#[instrument(skip(pool))]
pub fn list_providers(pool: &DbPool, hotel_id: &str) -> Result<Vec<ServiceProvider>> {
    let conn = &mut pool.get()?;

    let result = service_providers::table
        .filter(service_providers::hotel_id.eq(hotel_id))
        .order(service_providers::name.asc())
        .load::<ServiceProvider>(conn)?;

    debug!("Retrieved {} providers", result.len());
    Ok(result)
}

/// Updates a provider
///
/// ### Errors
///
/// Returns `RepoError::NotFound` if the provider does not exist
#[instrument(skip(pool))]
pub fn update_provider(pool: &DbPool, provider_id: &str, changes: ProviderChanges) -> Result<ServiceProvider> {
    let conn = &mut pool.get()?;
    let now = Utc::now().naive_utc();

    let updated = diesel::update(service_providers::table.find(provider_id))
        .set((changes, service_providers::updated_at.eq(now)))
        .get_result::<ServiceProvider>(conn)
        .optional()?
        .ok_or(RepoError::NotFound("service provider"))?;

    info!("Updated service provider {}", provider_id);
    Ok(updated)
}

/// Sets a provider's markup; the caller validates the range
pub fn set_markup(pool: &DbPool, provider_id: &str, markup_percentage: f64) -> Result<ServiceProvider> {
    update_provider(
        pool,
        provider_id,
        ProviderChanges {
            markup_percentage: Some(markup_percentage),
            ..Default::default()
        },
    )
}

/// Retires a provider without deleting it
///
/// The provider, its staff accounts and its services are switched off in
/// one transaction; bookings keep pointing at the rows.
#[instrument(skip(pool))]
pub fn deactivate_provider(pool: &DbPool, provider_id: &str) -> Result<()> {
    let conn = &mut pool.get()?;
    let now = Utc::now().naive_utc();

    conn.transaction::<_, anyhow::Error, _>(|conn| {
        let updated = diesel::update(service_providers::table.find(provider_id))
            .set((service_providers::is_active.eq(false), service_providers::updated_at.eq(now)))
            .execute(conn)?;
        if updated == 0 {
            return Err(RepoError::NotFound("service provider").into());
        }

        diesel::update(users::table.filter(users::service_provider_id.eq(provider_id)))
            .set((users::is_active.eq(false), users::updated_at.eq(now)))
            .execute(conn)?;

        diesel::update(services::table.filter(services::service_provider_id.eq(provider_id)))
            .set((services::is_available.eq(false), services::updated_at.eq(now)))
            .execute(conn)?;

        Ok(())
    })?;

    info!("Deactivated service provider {}", provider_id);
    Ok(())
}

/// Counts a hotel's active providers
pub fn count_active_providers(pool: &DbPool, hotel_id: &str) -> Result<i64> {
    let conn = &mut pool.get()?;

    let count = service_providers::table
        .filter(service_providers::hotel_id.eq(hotel_id))
        .filter(service_providers::is_active.eq(true))
        .count()
        .get_result::<i64>(conn)?;

    Ok(count)
}
