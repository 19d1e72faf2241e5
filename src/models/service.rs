use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::deserialize::FromSqlRow;
use diesel::expression::AsExpression;
use diesel::prelude::*;
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of guest service on offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Laundry,
    Transportation,
    Spa,
    Dining,
    Housekeeping,
    Tours,
    Other,
}

text_enum!(ServiceCategory, "service category", {
    Laundry => "laundry",
    Transportation => "transportation",
    Spa => "spa",
    Dining => "dining",
    Housekeeping => "housekeeping",
    Tours => "tours",
    Other => "other",
});

/// Represents a bookable service offered by a service provider
///
/// This struct maps directly to the `services` table. Prices are stored in
/// integer cents and are the provider's base price before hotel markup.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::services)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Service {
    /// Unique identifier for the service (UUID v4 as string)
    id: String,

    /// The provider offering this service
    service_provider_id: String,

    /// Display name
    name: String,

    /// Free-text description shown to guests
    description: String,

    /// The category guests browse by
    category: ServiceCategory,

    /// Provider's unit price in cents, always positive
    base_price_cents: i64,

    /// Unavailable services are hidden from guests and cannot be booked
    is_available: bool,

    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl Service {
    /// Creates a new available service
    ///
    /// ### Arguments
    ///
    /// * `service_provider_id` - The owning provider
    /// * `name` - The display name
    /// * `description` - The description shown to guests
    /// * `category` - The service category
    /// * `base_price_cents` - The provider's unit price in cents
    ///
    /// ### Returns
    ///
    /// A new `Service` instance
    pub fn new(
        service_provider_id: String,
        name: String,
        description: String,
        category: ServiceCategory,
        base_price_cents: i64,
    ) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            service_provider_id,
            name,
            description,
            category,
            base_price_cents,
            is_available: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    pub fn get_service_provider_id(&self) -> String {
        self.service_provider_id.clone()
    }

    pub fn get_name(&self) -> String {
        self.name.clone()
    }

    pub fn get_description(&self) -> String {
        self.description.clone()
    }

    pub fn get_category(&self) -> ServiceCategory {
        self.category
    }

    pub fn get_base_price_cents(&self) -> i64 {
        self.base_price_cents
    }

    pub fn get_is_available(&self) -> bool {
        self.is_available
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at.and_utc()
    }

    pub fn get_updated_at(&self) -> DateTime<Utc> {
        self.updated_at.and_utc()
    }
}
