use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a hotel tenant on the platform
///
/// This struct maps directly to the `hotels` table. Every guest, hotel admin,
/// service provider and booking belongs to exactly one hotel. The `slug`
/// identifies the hotel's branded guest portal.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::hotels)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Hotel {
    /// Unique identifier for the hotel (UUID v4 as string)
    id: String,

    /// Display name of the hotel
    name: String,

    /// URL-safe portal identifier, unique across the platform
    slug: String,

    /// Street address shown on the guest portal
    address: String,

    /// Front desk contact email
    contact_email: String,

    /// Optional brand color for the guest portal (e.g. `#1a2b3c`)
    brand_color: Option<String>,

    /// Share of the hotel's markup retained by the platform, in percent
    platform_commission_percentage: f64,

    /// Whether the hotel can currently take bookings
    is_active: bool,

    /// When this hotel was created
    created_at: NaiveDateTime,

    /// When this hotel was last updated
    updated_at: NaiveDateTime,
}

impl Hotel {
    /// Creates a new active hotel
    ///
    /// ### Arguments
    ///
    /// * `name` - The display name of the hotel
    /// * `slug` - The portal slug, already validated by the caller
    /// * `address` - The street address
    /// * `contact_email` - The front desk email
    /// * `platform_commission_percentage` - The platform's share of the markup
    ///
    /// ### Returns
    ///
    /// A new `Hotel` with a fresh UUID and both timestamps set to now
    pub fn new(
        name: String,
        slug: String,
        address: String,
        contact_email: String,
        platform_commission_percentage: f64,
    ) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            slug,
            address,
            contact_email,
            brand_color: None,
            platform_commission_percentage,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    pub fn get_name(&self) -> String {
        self.name.clone()
    }

    pub fn get_slug(&self) -> String {
        self.slug.clone()
    }

    pub fn get_address(&self) -> String {
        self.address.clone()
    }

    pub fn get_contact_email(&self) -> String {
        self.contact_email.clone()
    }

    pub fn get_brand_color(&self) -> Option<String> {
        self.brand_color.clone()
    }

    pub fn get_platform_commission_percentage(&self) -> f64 {
        self.platform_commission_percentage
    }

    pub fn get_is_active(&self) -> bool {
        self.is_active
    }

    /// Gets the creation timestamp as a UTC datetime
    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at.and_utc()
    }

    pub fn get_updated_at(&self) -> DateTime<Utc> {
        self.updated_at.and_utc()
    }
}
