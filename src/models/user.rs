use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// Represents a user account
///
/// This struct maps directly to the `users` table. The same table holds
/// guests, hotel admins, service provider staff and superadmins; `role`
/// decides which of the optional tenancy fields are populated:
///
/// - guests carry `hotel_id`, `room_number` and `checkout_at`
/// - hotel admins carry `hotel_id`
/// - service provider staff carry `hotel_id` and `service_provider_id`
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    /// Unique identifier for the user (UUID v4 as string)
    id: String,

    /// Login email, stored lowercased
    email: String,

    /// Argon2id PHC string; never serialized into responses
    #[serde(skip_serializing, default)]
    password_hash: String,

    /// The user's display name
    full_name: String,

    /// The role this account acts under
    role: Role,

    /// The hotel this account belongs to, if any
    hotel_id: Option<String>,

    /// The service provider this account works for, if any
    service_provider_id: Option<String>,

    /// Guest room number
    room_number: Option<String>,

    /// When a guest's stay ends; the checkout sweep deactivates the account after this
    checkout_at: Option<NaiveDateTime>,

    /// Inactive accounts cannot log in or use issued tokens
    is_active: bool,

    /// When this user was created
    created_at: NaiveDateTime,

    /// When this user was last updated
    updated_at: NaiveDateTime,
}

impl User {
    /// Creates a new active user with no tenancy fields set
    ///
    /// ### Arguments
    ///
    /// * `email` - The login email; it is trimmed and lowercased
    /// * `password_hash` - The already-hashed password
    /// * `full_name` - The display name
    /// * `role` - The account role
    ///
    /// ### Returns
    ///
    /// A new `User` instance; use the `with_*` builders to attach tenancy
    pub fn new(email: &str, password_hash: String, full_name: String, role: Role) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            email: normalize_email(email),
            password_hash,
            full_name,
            role,
            hotel_id: None,
            service_provider_id: None,
            room_number: None,
            checkout_at: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attaches the user to a hotel
    pub fn with_hotel(mut self, hotel_id: String) -> Self {
        self.hotel_id = Some(hotel_id);
        self
    }

    /// Attaches the user to a service provider
    pub fn with_service_provider(mut self, service_provider_id: String) -> Self {
        self.service_provider_id = Some(service_provider_id);
        self
    }

    /// Records a guest's room and checkout time
    pub fn with_stay(mut self, room_number: String, checkout_at: DateTime<Utc>) -> Self {
        self.room_number = Some(room_number);
        self.checkout_at = Some(checkout_at.naive_utc());
        self
    }

    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    pub fn get_email(&self) -> String {
        self.email.clone()
    }

    pub fn get_password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn get_full_name(&self) -> String {
        self.full_name.clone()
    }

    pub fn get_role(&self) -> Role {
        self.role
    }

    pub fn get_hotel_id(&self) -> Option<String> {
        self.hotel_id.clone()
    }

    pub fn get_service_provider_id(&self) -> Option<String> {
        self.service_provider_id.clone()
    }

    pub fn get_room_number(&self) -> Option<String> {
        self.room_number.clone()
    }

    /// Gets the guest checkout time, if one is recorded
    pub fn get_checkout_at(&self) -> Option<DateTime<Utc>> {
        self.checkout_at.map(|t| t.and_utc())
    }

    pub fn get_is_active(&self) -> bool {
        self.is_active
    }

    /// Whether this is a guest whose stay has ended at `now`
    pub fn stay_has_ended(&self, now: DateTime<Utc>) -> bool {
        self.role == Role::Guest && self.get_checkout_at().is_some_and(|checkout| checkout <= now)
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at.and_utc()
    }

    pub fn get_updated_at(&self) -> DateTime<Utc> {
        self.updated_at.and_utc()
    }
}

/// Normalizes an email for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
