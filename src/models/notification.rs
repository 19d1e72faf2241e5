use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::deserialize::FromSqlRow;
use diesel::expression::AsExpression;
use diesel::prelude::*;
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a notification is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    BookingCreated,
    BookingStatusChanged,
    PaymentUpdated,
}

text_enum!(NotificationKind, "notification kind", {
    BookingCreated => "booking_created",
    BookingStatusChanged => "booking_status_changed",
    PaymentUpdated => "payment_updated",
});

/// A message delivered to one user
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::notifications)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Notification {
    id: String,
    user_id: String,
    kind: NotificationKind,
    message: String,
    booking_id: Option<String>,
    read_at: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
}

impl Notification {
    pub fn new(user_id: String, kind: NotificationKind, message: String, booking_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            kind,
            message,
            booking_id,
            read_at: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    pub fn get_id(&self) -> String {
        self.id.clone()
    }

    pub fn get_user_id(&self) -> String {
        self.user_id.clone()
    }

    pub fn get_kind(&self) -> NotificationKind {
        self.kind
    }

    pub fn get_message(&self) -> String {
        self.message.clone()
    }

    pub fn get_booking_id(&self) -> Option<String> {
        self.booking_id.clone()
    }

    pub fn get_read_at(&self) -> Option<DateTime<Utc>> {
        self.read_at.map(|t| t.and_utc())
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at.and_utc()
    }
}
