use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ServiceCategory;

/// Represents a service provider contracted by a hotel
///
/// This struct maps directly to the `service_providers` table. The
/// `markup_percentage` is what the hotel adds on top of the provider's base
/// prices when guests book.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::service_providers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ServiceProvider {
    id: String,
    hotel_id: String,
    name: String,
    category: ServiceCategory,
    contact_email: String,
    phone: Option<String>,
    /// Hotel markup on this provider's prices, in percent within [0, 100]
    markup_percentage: f64,
    is_active: bool,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl ServiceProvider {
    /// Creates a new active service provider for a hotel
    pub fn new(
        hotel_id: String,
        name: String,
        category: ServiceCategory,
        contact_email: String,
        phone: Option<String>,
        markup_percentage: f64,
    ) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            hotel_id,
            name,
            category,
            contact_email,
            phone,
            markup_percentage,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    pub fn get_hotel_id(&self) -> String {
        self.hotel_id.clone()
    }

    pub fn get_name(&self) -> String {
        self.name.clone()
    }

    pub fn get_category(&self) -> ServiceCategory {
        self.category
    }

    pub fn get_contact_email(&self) -> String {
        self.contact_email.clone()
    }

    pub fn get_phone(&self) -> Option<String> {
        self.phone.clone()
    }

    pub fn get_markup_percentage(&self) -> f64 {
        self.markup_percentage
    }

    pub fn get_is_active(&self) -> bool {
        self.is_active
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at.and_utc()
    }

    pub fn get_updated_at(&self) -> DateTime<Utc> {
        self.updated_at.and_utc()
    }
}
