use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::deserialize::FromSqlRow;
use diesel::expression::AsExpression;
use diesel::prelude::*;
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Role, Service, ServiceCategory, User};
use crate::pricing::PriceBreakdown;

/// Lifecycle state of a booking
///
/// ```text
/// pending ──► confirmed ──► in_progress ──► completed
///    │            │
///    ├──► rejected│
///    └──► cancelled ◄┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    Rejected,
}

text_enum!(BookingStatus, "booking status", {
    Pending => "pending",
    Confirmed => "confirmed",
    InProgress => "in_progress",
    Completed => "completed",
    Cancelled => "cancelled",
    Rejected => "rejected",
});

/// Who is asking for a booking status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Guest,
    Provider,
    HotelAdmin,
}

impl Actor {
    /// Maps an account role to the actor it acts as on bookings
    ///
    /// The superadmin does not act on individual bookings.
    pub fn from_role(role: Role) -> Option<Self> {
        match role {
            Role::Guest => Some(Actor::Guest),
            Role::ServiceProvider => Some(Actor::Provider),
            Role::HotelAdmin => Some(Actor::HotelAdmin),
            Role::Superadmin => None,
        }
    }
}

impl BookingStatus {
    /// Whether no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::Rejected)
    }

    /// Whether `actor` may move a booking from this status to `next`
    ///
    /// Providers drive the fulfilment path; guests and hotel admins may only
    /// cancel, and only before work has started.
    pub fn can_transition_to(&self, next: BookingStatus, actor: Actor) -> bool {
        use BookingStatus::*;

        match (self, next, actor) {
            (Pending, Confirmed, Actor::Provider)
            | (Pending, Rejected, Actor::Provider)
            | (Confirmed, InProgress, Actor::Provider)
            | (InProgress, Completed, Actor::Provider) => true,
            (Pending | Confirmed, Cancelled, Actor::Guest | Actor::HotelAdmin) => true,
            _ => false,
        }
    }
}

/// Payment state of a booking, independent of its fulfilment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Pending,
    Paid,
    Failed,
    Refunded,
}

text_enum!(PaymentStatus, "payment status", {
    Unpaid => "unpaid",
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
    Refunded => "refunded",
});

/// Represents a guest's booking of a service
///
/// This struct maps directly to the `bookings` table. The service name,
/// category and the full price breakdown are copied in when the booking is
/// made, so later edits to the service or the provider's markup never change
/// what the guest agreed to pay.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::bookings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Booking {
    id: String,
    hotel_id: String,
    guest_id: String,
    service_id: String,
    service_provider_id: String,
    service_name: String,
    category: ServiceCategory,
    quantity: i32,
    scheduled_for: NaiveDateTime,
    notes: Option<String>,
    status: BookingStatus,
    payment_status: PaymentStatus,
    base_price_cents: i64,
    markup_percentage: f64,
    markup_amount_cents: i64,
    platform_fee_cents: i64,
    total_price_cents: i64,
    rating: Option<i32>,
    feedback: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl Booking {
    /// Creates a new pending, unpaid booking
    ///
    /// ### Arguments
    ///
    /// * `guest` - The guest making the booking
    /// * `hotel_id` - The guest's hotel
    /// * `service` - The service being booked
    /// * `quantity` - How many units of the service
    /// * `scheduled_for` - When the service should be delivered
    /// * `notes` - Optional free-text instructions
    /// * `price` - The price breakdown computed for this quantity
    ///
    /// ### Returns
    ///
    /// A new `Booking` carrying a snapshot of the service and its price
    pub fn new(
        guest: &User,
        hotel_id: String,
        service: &Service,
        quantity: i32,
        scheduled_for: DateTime<Utc>,
        notes: Option<String>,
        price: &PriceBreakdown,
    ) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            hotel_id,
            guest_id: guest.get_id(),
            service_id: service.get_id(),
            service_provider_id: service.get_service_provider_id(),
            service_name: service.get_name(),
            category: service.get_category(),
            quantity,
            scheduled_for: scheduled_for.naive_utc(),
            notes,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            base_price_cents: price.base_price_cents,
            markup_percentage: price.markup_percentage,
            markup_amount_cents: price.markup_amount_cents,
            platform_fee_cents: price.platform_fee_cents,
            total_price_cents: price.total_price_cents,
            rating: None,
            feedback: None,
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

    pub fn get_guest_id(&self) -> String {
        self.guest_id.clone()
    }

    pub fn get_service_id(&self) -> String {
        self.service_id.clone()
    }

    pub fn get_service_provider_id(&self) -> String {
        self.service_provider_id.clone()
    }

    pub fn get_service_name(&self) -> String {
        self.service_name.clone()
    }

    pub fn get_category(&self) -> ServiceCategory {
        self.category
    }

    pub fn get_quantity(&self) -> i32 {
        self.quantity
    }

    pub fn get_scheduled_for(&self) -> DateTime<Utc> {
        self.scheduled_for.and_utc()
    }

    pub fn get_notes(&self) -> Option<String> {
        self.notes.clone()
    }

    pub fn get_status(&self) -> BookingStatus {
        self.status
    }

    pub fn get_payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    /// Provider's base price for the whole quantity, in cents
    pub fn get_base_price_cents(&self) -> i64 {
        self.base_price_cents
    }

    pub fn get_markup_percentage(&self) -> f64 {
        self.markup_percentage
    }

    pub fn get_markup_amount_cents(&self) -> i64 {
        self.markup_amount_cents
    }

    pub fn get_platform_fee_cents(&self) -> i64 {
        self.platform_fee_cents
    }

    /// What the guest pays, in cents
    pub fn get_total_price_cents(&self) -> i64 {
        self.total_price_cents
    }

    /// The hotel's share: markup minus the platform fee
    pub fn get_hotel_earnings_cents(&self) -> i64 {
        self.markup_amount_cents - self.platform_fee_cents
    }

    pub fn get_rating(&self) -> Option<i32> {
        self.rating
    }

    pub fn get_feedback(&self) -> Option<String> {
        self.feedback.clone()
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at.and_utc()
    }

    pub fn get_updated_at(&self) -> DateTime<Utc> {
        self.updated_at.and_utc()
    }

    /// Overrides the creation timestamp
    ///
    /// Used by analytics tests that need bookings spread across months.
    #[cfg(test)]
    pub fn set_created_at(&mut self, created_at: DateTime<Utc>) {
        self.created_at = created_at.naive_utc();
    }

    #[cfg(test)]
    pub fn set_status(&mut self, status: BookingStatus) {
        self.status = status;
    }

    #[cfg(test)]
    pub fn set_rating(&mut self, rating: Option<i32>) {
        self.rating = rating;
    }
}

#[cfg(test)]
mod tests;
