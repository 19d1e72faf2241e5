use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::deserialize::FromSqlRow;
use diesel::expression::AsExpression;
use diesel::prelude::*;
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PaymentStatus;

/// How a guest intends to settle a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Settled by the payment gateway, confirmed through the webhook
    Card,
    /// Settled at the front desk, confirmed by a hotel admin
    Cash,
}

text_enum!(PaymentMethod, "payment method", {
    Card => "card",
    Cash => "cash",
});

/// A payment intent for a booking
///
/// The `reference` is what the gateway echoes back in webhook calls.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::payments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Payment {
    id: String,
    booking_id: String,
    reference: String,
    amount_cents: i64,
    method: PaymentMethod,
    status: PaymentStatus,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl Payment {
    /// Creates a pending payment intent with a fresh reference
    pub fn new(booking_id: String, amount_cents: i64, method: PaymentMethod) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            booking_id,
            reference: format!("pay_{}", Uuid::new_v4().simple()),
            amount_cents,
            method,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    pub fn get_booking_id(&self) -> String {
        self.booking_id.clone()
    }

    pub fn get_reference(&self) -> String {
        self.reference.clone()
    }

    pub fn get_amount_cents(&self) -> i64 {
        self.amount_cents
    }

    pub fn get_method(&self) -> PaymentMethod {
        self.method
    }

    pub fn get_status(&self) -> PaymentStatus {
        self.status
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at.and_utc()
    }

    pub fn get_updated_at(&self) -> DateTime<Utc> {
        self.updated_at.and_utc()
    }
}

impl PaymentStatus {
    /// Whether a payment in this status may move to `next`
    ///
    /// Re-applying the current status is allowed so gateway retries are harmless.
    pub fn can_settle_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;

        *self == next
            || matches!(
                (self, next),
                (Pending, Paid) | (Pending, Failed) | (Failed, Paid) | (Paid, Refunded)
            )
    }
}
