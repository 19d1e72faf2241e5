use crate::db::DbPool;
use crate::models::{Service, ServiceCategory, ServiceProvider};
use crate::schema::{service_providers, services};
use chrono::Utc;
use diesel::prelude::*;
use anyhow::Result;
use tracing::{instrument, debug, info};

use super::RepoError;

/// Editable service details
#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = services)]
pub struct ServiceChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<ServiceCategory>,
    pub base_price_cents: Option<i64>,
    pub is_available: Option<bool>,
}

/// Inserts a new service
#[instrument(skip(pool, service), fields(provider_id = %service.get_service_provider_id(), name = %service.get_name()))]
pub fn create_service(pool: &DbPool, service: &Service) -> Result<Service> {
    let conn = &mut pool.get()?;

    diesel::insert_into(services::table)
        .values(service)
        .execute(conn)?;

    info!("Created service with id: {}", service.get_id());
    Ok(service.clone())
}

/// Retrieves a service by ID
#[instrument(skip(pool))]
pub fn get_service(pool: &DbPool, service_id: &str) -> Result<Option<Service>> {
    let conn = &mut pool.get()?;

    let result = services::table
        .find(service_id)
        .first::<Service>(conn)
        .optional()?;

    Ok(result)
}

/// Lists the services of one provider, by name
#[instrument(skip(pool))]
pub fn list_services_for_provider(pool: &DbPool, provider_id: &str) -> Result<Vec<Service>> {
    let conn = &mut pool.get()?;

    let result = services::table
        .filter(services::service_provider_id.eq(provider_id))
        .order(services::name.asc())
        .load::<Service>(conn)?;

    debug!("Retrieved {} services", result.len());
    Ok(result)
}

/// Lists what guests of a hotel can book right now
///
/// Only available services of active providers of that hotel are returned,
/// each paired with its provider so the caller can apply the markup.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `hotel_id` - The guest's hotel
/// * `category` - Optional category filter
#[instrument(skip(pool))]
pub fn list_bookable_services(
    pool: &DbPool,
    hotel_id: &str,
    category: Option<ServiceCategory>,
) -> Result<Vec<(Service, ServiceProvider)>> {
    let conn = &mut pool.get()?;

    let base = services::table
        .inner_join(service_providers::table)
        .filter(service_providers::hotel_id.eq(hotel_id))
        .filter(service_providers::is_active.eq(true))
        .filter(services::is_available.eq(true))
        .order((services::category.asc(), services::name.asc()))
        .select((Service::as_select(), ServiceProvider::as_select()));

    let result = match category {
        Some(category) => base
            .filter(services::category.eq(category))
            .load::<(Service, ServiceProvider)>(conn)?,
        None => base.load::<(Service, ServiceProvider)>(conn)?,
    };

    debug!("Retrieved {} bookable services", result.len());
    Ok(result)
}

/// Updates a service
///
/// ### Errors
///
/// Returns `RepoError::NotFound` if the service does not exist
#[instrument(skip(pool))]
pub fn update_service(pool: &DbPool, service_id: &str, changes: ServiceChanges) -> Result<Service> {
    let conn = &mut pool.get()?;
    let now = Utc::now().naive_utc();

    let updated = diesel::update(services::table.find(service_id))
        .set((changes, services::updated_at.eq(now)))
        .get_result::<Service>(conn)
        .optional()?
        .ok_or(RepoError::NotFound("service"))?;

    info!("Updated service {}", service_id);
    Ok(updated)
}

#[cfg(test)]
mod tests;
